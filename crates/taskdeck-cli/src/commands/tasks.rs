use super::require_login;
use anyhow::{Context, Result};
use taskdeck_application::TaskdeckClient;
use taskdeck_core::task::{SortOrder, Task, TaskFilter, TaskPatch, TaskQuery};

pub async fn list(
    client: &TaskdeckClient,
    filter: TaskFilter,
    search: Option<String>,
    order: SortOrder,
) -> Result<()> {
    require_login(client)?;
    if let Some(error) = client.tasks().last_error().await {
        eprintln!("⚠️  Showing cached tasks: {}", error);
    }

    let mut query = TaskQuery::new().with_filter(filter).with_order(order);
    if let Some(search) = search {
        query = query.with_search(search);
    }

    let tasks = client.tasks().view(&query).await;
    if tasks.is_empty() {
        println!("No tasks.");
        return Ok(());
    }
    for task in &tasks {
        print_task(task);
    }
    Ok(())
}

pub async fn add(client: &TaskdeckClient, title: &str, description: &str) -> Result<()> {
    require_login(client)?;
    match client
        .tasks()
        .create(title, description)
        .await
        .context("Could not create task")?
    {
        Some(task) => print_task(&task),
        None => println!("Title is empty, nothing created."),
    }
    Ok(())
}

pub async fn toggle(client: &TaskdeckClient, id: &str) -> Result<()> {
    require_login(client)?;
    match client
        .tasks()
        .toggle_completion(id)
        .await
        .context("Could not update task status")?
    {
        Some(task) => print_task(&task),
        None => println!("No task with id {}", id),
    }
    Ok(())
}

pub async fn edit(
    client: &TaskdeckClient,
    id: &str,
    title: Option<String>,
    description: Option<String>,
) -> Result<()> {
    require_login(client)?;
    let patch = TaskPatch {
        title,
        description,
        completed: None,
    };
    if patch.is_empty() {
        println!("Nothing to change. Pass --title or --description.");
        return Ok(());
    }

    match client
        .tasks()
        .update(id, &patch)
        .await
        .context("Could not update task")?
    {
        Some(task) => print_task(&task),
        None => println!("No task with id {}", id),
    }
    Ok(())
}

pub async fn remove(client: &TaskdeckClient, id: &str) -> Result<()> {
    require_login(client)?;
    let deleted = client
        .tasks()
        .delete(id)
        .await
        .context("Could not delete task")?;
    if !deleted {
        println!("No task with id {}", id);
    }
    Ok(())
}

pub async fn stats(client: &TaskdeckClient) -> Result<()> {
    require_login(client)?;
    let completed = client.tasks().completed_count().await;
    let pending = client.tasks().pending_count().await;
    println!("📊 {} tasks", completed + pending);
    println!("  completed: {}", completed);
    println!("  pending:   {}", pending);
    Ok(())
}

fn print_task(task: &Task) {
    let mark = if task.completed { "x" } else { " " };
    println!("[{}] {}  ({})", mark, task.label(), task.id);
    if task.title.is_some() && !task.description.is_empty() {
        println!("      {}", task.description);
    }
}
