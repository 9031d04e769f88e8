//! Optimistic mirror of the user's server-side tasks.
//!
//! Every mutation follows the same shape:
//! 1. take the pre-image of the affected task and apply the change locally
//! 2. release the lock and await the gateway
//! 3. on success reconcile with the server's value, on failure put the
//!    pre-image back
//!
//! The collection lock is never held across a gateway call, so overlapping
//! operations interleave at network suspension points. Overlapping
//! operations on the same task are not serialized; the last response wins.
//!
//! The collection belongs to the session it was loaded under. When the
//! session epoch moves on (logout, 401) the collection is dropped on next
//! access, and responses that arrive for a dropped collection are not
//! applied to its successor.

use crate::api_client::ApiClient;
use crate::events::EventBus;
use std::sync::Arc;
use taskdeck_core::error::{MutationKind, Result, TaskdeckError};
use taskdeck_core::gateway::{
    ApiRequest, GatewayError, TASKS_PATH, task_completion_path, task_path,
};
use taskdeck_core::task::{NewTask, Task, TaskCollection, TaskPatch, TaskQuery, TaskUpdate};
use tokio::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

const CREATED: &str = "Task created successfully!";
const UPDATED: &str = "Task updated successfully!";
const DELETED: &str = "Task deleted successfully!";
const COMPLETED: &str = "Task completed!";
const REACTIVATED: &str = "Task marked as active!";

const CREATE_FAILED: &str = "Failed to create task";
const TOGGLE_FAILED: &str = "Failed to update task status";
const UPDATE_FAILED: &str = "Failed to update task";
const DELETE_FAILED: &str = "Failed to delete task";

#[derive(Debug, Default)]
struct SyncState {
    tasks: TaskCollection,
    last_error: Option<String>,
    loading: bool,
    /// Session epoch the collection was built under.
    session_epoch: u64,
    /// Advances whenever the collection is replaced wholesale.
    generation: u64,
}

impl SyncState {
    fn reset(&mut self, session_epoch: u64) {
        self.tasks = TaskCollection::new();
        self.last_error = None;
        self.loading = false;
        self.session_epoch = session_epoch;
        self.generation += 1;
    }
}

/// Owns the task collection. Cloning shares the same collection.
#[derive(Clone)]
pub struct TaskSynchronizer {
    api: ApiClient,
    events: EventBus,
    state: Arc<RwLock<SyncState>>,
}

impl TaskSynchronizer {
    pub fn new(api: ApiClient, events: EventBus) -> Self {
        let state = SyncState {
            session_epoch: api.session().epoch(),
            ..SyncState::default()
        };
        Self {
            api,
            events,
            state: Arc::new(RwLock::new(state)),
        }
    }

    /// Write access to a collection that belongs to the current session.
    async fn lock(&self) -> RwLockWriteGuard<'_, SyncState> {
        let mut state = self.state.write().await;
        let epoch = self.api.session().epoch();
        if state.session_epoch != epoch {
            tracing::debug!(
                "[TaskSync] Session changed, dropping {} tasks",
                state.tasks.len()
            );
            state.reset(epoch);
        }
        state
    }

    async fn read(&self) -> RwLockReadGuard<'_, SyncState> {
        {
            let state = self.state.read().await;
            if state.session_epoch == self.api.session().epoch() {
                return state;
            }
        }
        self.lock().await.downgrade()
    }

    /// Re-acquires the lock after a gateway call. The flag is false when the
    /// collection the call started from has been replaced in the meantime.
    async fn relock(
        &self,
        generation: u64,
        kind: MutationKind,
    ) -> (RwLockWriteGuard<'_, SyncState>, bool) {
        let state = self.lock().await;
        let current = state.generation == generation;
        if !current {
            tracing::debug!(
                "[TaskSync] Collection replaced while {} was in flight, leaving it untouched",
                kind
            );
        }
        (state, current)
    }

    // ============================================================================
    // Loading
    // ============================================================================

    /// Replaces the collection with the server's list.
    ///
    /// On failure the previous collection is kept and the error is recorded
    /// for [`last_error`](Self::last_error). A response that arrives after
    /// the session changed is discarded.
    pub async fn load_all(&self) -> Result<Vec<Task>> {
        let epoch = {
            let mut state = self.lock().await;
            state.loading = true;
            state.session_epoch
        };

        let result: std::result::Result<Vec<Task>, GatewayError> =
            self.api.execute_json(ApiRequest::get(TASKS_PATH)).await;

        let mut state = self.lock().await;
        state.loading = false;
        if state.session_epoch != epoch {
            tracing::debug!("[TaskSync] Session changed while loading, discarding response");
            return match result {
                Ok(_) => Ok(Vec::new()),
                Err(err) => Err(err.into_load_error()),
            };
        }
        match result {
            Ok(tasks) => {
                tracing::debug!("[TaskSync] Loaded {} tasks", tasks.len());
                state.tasks = TaskCollection::from(tasks);
                state.last_error = None;
                state.generation += 1;
                Ok(state.tasks.as_slice().to_vec())
            }
            Err(err) => {
                let err = err.into_load_error();
                tracing::warn!("[TaskSync] {}", err);
                state.last_error = Some(err.to_string());
                Err(err)
            }
        }
    }

    // ============================================================================
    // Mutations
    // ============================================================================

    /// Creates a task.
    ///
    /// A blank title is ignored (`Ok(None)`, no request). Otherwise a
    /// provisional task is shown at the front of the list until the server
    /// answers; it is then replaced by the server's task or removed.
    pub async fn create(&self, title: &str, description: &str) -> Result<Option<Task>> {
        if title.trim().is_empty() {
            tracing::debug!("[TaskSync] Ignoring create with blank title");
            return Ok(None);
        }

        let request = ApiRequest::post(TASKS_PATH)
            .with_json(&NewTask { title, description })
            .map_err(|e| e.into_mutation_error(MutationKind::Create))?;

        let provisional = Task::provisional(title, description);
        let provisional_id = provisional.id.clone();
        let generation = {
            let mut state = self.lock().await;
            state.tasks.insert_front(provisional);
            state.generation
        };

        let result: std::result::Result<Task, GatewayError> = self.api.execute_json(request).await;

        let (mut state, current) = self.relock(generation, MutationKind::Create).await;
        match result {
            Ok(task) => {
                if current && !state.tasks.replace(&provisional_id, task.clone()) {
                    tracing::debug!(
                        "[TaskSync] Provisional task {} no longer present, dropping server copy",
                        provisional_id
                    );
                }
                drop(state);
                tracing::info!("[TaskSync] Created task {}", task.id);
                self.events.success(CREATED);
                Ok(Some(task))
            }
            Err(err) => {
                if current {
                    state.tasks.remove(&provisional_id);
                }
                Err(self.fail(state, current, MutationKind::Create, CREATE_FAILED, err))
            }
        }
    }

    /// Flips a task's completion flag.
    ///
    /// Absent id: no-op, `Ok(None)`. On failure the flag is put back.
    pub async fn toggle_completion(&self, id: &str) -> Result<Option<Task>> {
        let (previous, generation) = {
            let mut state = self.lock().await;
            let generation = state.generation;
            let Some(task) = state.tasks.get_mut(id) else {
                return Ok(None);
            };
            if task.is_provisional() {
                return Err(self.reject_provisional(state, MutationKind::Toggle, TOGGLE_FAILED));
            }
            let previous = task.completed;
            task.completed = !previous;
            (previous, generation)
        };

        let result: std::result::Result<Task, GatewayError> = self
            .api
            .execute_json(ApiRequest::patch(task_completion_path(id)))
            .await;

        let (mut state, current) = self.relock(generation, MutationKind::Toggle).await;
        match result {
            Ok(task) => {
                if current {
                    state.tasks.replace(id, task.clone());
                }
                drop(state);
                self.events
                    .success(if task.completed { COMPLETED } else { REACTIVATED });
                Ok(Some(task))
            }
            Err(err) => {
                if let Some(task) = state.tasks.get_mut(id).filter(|_| current) {
                    task.completed = previous;
                }
                Err(self.fail(state, current, MutationKind::Toggle, TOGGLE_FAILED, err))
            }
        }
    }

    /// Applies a partial edit.
    ///
    /// Fields left unset in `patch` keep the task's current value; the full
    /// merged task is sent. Absent id: no-op, `Ok(None)`.
    pub async fn update(&self, id: &str, patch: &TaskPatch) -> Result<Option<Task>> {
        let (pre_image, request, generation) = {
            let mut state = self.lock().await;
            let generation = state.generation;
            let Some(task) = state.tasks.get_mut(id) else {
                return Ok(None);
            };
            if task.is_provisional() {
                return Err(self.reject_provisional(state, MutationKind::Update, UPDATE_FAILED));
            }
            let merged = task.merged(patch);
            let request = ApiRequest::put(task_path(id))
                .with_json(&TaskUpdate::from(&merged))
                .map_err(|e| e.into_mutation_error(MutationKind::Update))?;
            let pre_image = std::mem::replace(task, merged);
            (pre_image, request, generation)
        };

        let result: std::result::Result<Task, GatewayError> = self.api.execute_json(request).await;

        let (mut state, current) = self.relock(generation, MutationKind::Update).await;
        match result {
            Ok(task) => {
                if current {
                    state.tasks.replace(id, task.clone());
                }
                drop(state);
                self.events.success(UPDATED);
                Ok(Some(task))
            }
            Err(err) => {
                if current {
                    state.tasks.replace(id, pre_image);
                }
                Err(self.fail(state, current, MutationKind::Update, UPDATE_FAILED, err))
            }
        }
    }

    /// Deletes a task.
    ///
    /// The task disappears immediately; on failure it is appended back.
    /// Absent id: no-op, `Ok(false)`.
    pub async fn delete(&self, id: &str) -> Result<bool> {
        let (pre_image, generation) = {
            let mut state = self.lock().await;
            if state.tasks.get(id).is_some_and(Task::is_provisional) {
                return Err(self.reject_provisional(state, MutationKind::Delete, DELETE_FAILED));
            }
            let Some(task) = state.tasks.remove(id) else {
                return Ok(false);
            };
            (task, state.generation)
        };

        let result = self.api.execute(ApiRequest::delete(task_path(id))).await;

        match result {
            Ok(_) => {
                tracing::info!("[TaskSync] Deleted task {}", id);
                self.events.success(DELETED);
                Ok(true)
            }
            Err(err) => {
                let (mut state, current) = self.relock(generation, MutationKind::Delete).await;
                if current {
                    state.tasks.push(pre_image);
                }
                Err(self.fail(state, current, MutationKind::Delete, DELETE_FAILED, err))
            }
        }
    }

    fn fail(
        &self,
        mut state: RwLockWriteGuard<'_, SyncState>,
        current: bool,
        kind: MutationKind,
        notice: &str,
        err: GatewayError,
    ) -> TaskdeckError {
        let err = err.into_mutation_error(kind);
        tracing::warn!("[TaskSync] {} failed: {}", kind, err);
        if current {
            state.last_error = Some(err.to_string());
        }
        drop(state);
        self.events.error(notice);
        err
    }

    /// A provisional task has no server id to address yet.
    fn reject_provisional(
        &self,
        state: RwLockWriteGuard<'_, SyncState>,
        kind: MutationKind,
        notice: &str,
    ) -> TaskdeckError {
        drop(state);
        tracing::debug!("[TaskSync] Refusing to {} a task that has not been saved", kind);
        self.events.error(notice);
        TaskdeckError::mutation(kind, "task has not been saved yet")
    }

    // ============================================================================
    // Queries
    // ============================================================================

    pub async fn snapshot(&self) -> Vec<Task> {
        self.read().await.tasks.as_slice().to_vec()
    }

    pub async fn get(&self, id: &str) -> Option<Task> {
        self.read().await.tasks.get(id).cloned()
    }

    /// Filtered, searched and sorted copy of the collection.
    pub async fn view(&self, query: &TaskQuery) -> Vec<Task> {
        self.read()
            .await
            .tasks
            .view(query)
            .into_iter()
            .cloned()
            .collect()
    }

    pub async fn completed_count(&self) -> usize {
        self.read().await.tasks.completed_count()
    }

    pub async fn pending_count(&self) -> usize {
        self.read().await.tasks.pending_count()
    }

    pub async fn last_error(&self) -> Option<String> {
        self.read().await.last_error.clone()
    }

    pub async fn is_loading(&self) -> bool {
        self.read().await.loading
    }

    /// Drops every task. In-flight mutations will not touch the emptied
    /// collection.
    pub async fn clear(&self) {
        let epoch = self.api.session().epoch();
        self.state.write().await.reset(epoch);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::SessionContext;
    use crate::testing::{MockGateway, identity, server_task, server_task_json};
    use serde_json::{Value, json};
    use taskdeck_core::gateway::Method;
    use taskdeck_core::session::{ClientEvent, Credential, Notification, Route};
    use taskdeck_core::task::TaskFilter;
    use taskdeck_infrastructure::InMemoryCredentialStore;
    use tokio::sync::mpsc::UnboundedReceiver;

    struct Fixture {
        sync: TaskSynchronizer,
        gateway: Arc<MockGateway>,
        session: Arc<SessionContext>,
        events: UnboundedReceiver<ClientEvent>,
    }

    impl Fixture {
        fn notifications(&mut self) -> Vec<Notification> {
            let mut seen = Vec::new();
            while let Ok(event) = self.events.try_recv() {
                if let ClientEvent::Notify { notification } = event {
                    seen.push(notification);
                }
            }
            seen
        }

        async fn seed(&mut self, tasks: Vec<Value>) {
            self.gateway
                .respond(Method::Get, TASKS_PATH, Ok(Value::Array(tasks)));
            self.sync.load_all().await.unwrap();
        }
    }

    fn build(gateway: MockGateway) -> Fixture {
        let gateway = Arc::new(gateway);
        let (bus, events) = EventBus::channel();
        let session = Arc::new(SessionContext::new(
            Arc::new(InMemoryCredentialStore::new()),
            bus.clone(),
        ));
        session
            .establish(Credential::new("tok"), identity("u1"))
            .unwrap();
        let api = ApiClient::new(gateway.clone(), session.clone());
        Fixture {
            sync: TaskSynchronizer::new(api, bus),
            gateway,
            session,
            events,
        }
    }

    fn fixture() -> Fixture {
        build(MockGateway::new())
    }

    fn server_error() -> GatewayError {
        GatewayError::Status {
            code: 500,
            detail: "Internal Server Error".into(),
        }
    }

    // ============================================================================
    // load_all
    // ============================================================================

    #[tokio::test]
    async fn test_load_all_replaces_collection() {
        let mut f = fixture();
        f.seed(vec![server_task_json("t1", "a", false)]).await;
        f.seed(vec![
            server_task_json("t2", "b", false),
            server_task_json("t3", "c", true),
        ])
        .await;

        let ids: Vec<String> = f.sync.snapshot().await.into_iter().map(|t| t.id).collect();
        assert_eq!(ids, vec!["t2", "t3"]);
        assert!(!f.sync.is_loading().await);
        assert!(f.notifications().is_empty());
    }

    #[tokio::test]
    async fn test_load_failure_keeps_previous_collection() {
        let mut f = fixture();
        f.seed(vec![server_task_json("t1", "a", false)]).await;
        f.gateway
            .respond(Method::Get, TASKS_PATH, Err(server_error()));

        let err = f.sync.load_all().await.unwrap_err();

        assert!(matches!(err, TaskdeckError::LoadError(_)));
        assert_eq!(f.sync.snapshot().await.len(), 1);
        assert!(f.sync.last_error().await.is_some());
    }

    // ============================================================================
    // create
    // ============================================================================

    #[tokio::test]
    async fn test_create_succeeds() {
        let mut f = fixture();
        f.gateway.respond(
            Method::Post,
            TASKS_PATH,
            Ok(server_task_json("t1", "Buy milk", false)),
        );

        let created = f.sync.create("Buy milk", "").await.unwrap().unwrap();

        let tasks = f.sync.snapshot().await;
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].title.as_deref(), Some("Buy milk"));
        assert!(!tasks[0].completed);
        assert_eq!(tasks[0].id, created.id);
        assert!(!tasks[0].is_provisional());
        assert_eq!(
            f.gateway.requests()[0].body,
            Some(json!({ "title": "Buy milk", "description": "" }))
        );
        assert_eq!(
            f.notifications(),
            vec![Notification::Success(CREATED.into())]
        );
    }

    #[tokio::test]
    async fn test_create_blank_title_is_ignored() {
        let mut f = fixture();

        assert!(f.sync.create("   ", "details").await.unwrap().is_none());

        assert_eq!(f.gateway.request_count(), 0);
        assert!(f.sync.snapshot().await.is_empty());
        assert!(f.notifications().is_empty());
    }

    #[tokio::test]
    async fn test_create_failure_removes_provisional() {
        let mut f = fixture();
        f.seed(vec![server_task_json("t1", "a", false)]).await;
        f.gateway
            .respond(Method::Post, TASKS_PATH, Err(server_error()));

        let err = f.sync.create("Buy milk", "").await.unwrap_err();

        assert!(err.is_mutation_failure());
        let tasks = f.sync.snapshot().await;
        assert_eq!(tasks, vec![server_task("t1", "a", false)]);
        assert_eq!(
            f.notifications(),
            vec![Notification::Error(CREATE_FAILED.into())]
        );
    }

    #[tokio::test]
    async fn test_create_shows_provisional_while_in_flight() {
        let mut f = build(MockGateway::gated());
        f.gateway.respond(
            Method::Post,
            TASKS_PATH,
            Ok(server_task_json("t1", "Buy milk", false)),
        );

        let sync = f.sync.clone();
        let handle = tokio::spawn(async move { sync.create("Buy milk", "").await });
        f.gateway.wait_for_requests(1).await;

        let pending = f.sync.snapshot().await;
        assert_eq!(pending.len(), 1);
        assert!(pending[0].is_provisional());

        // A provisional task cannot be addressed on the server yet
        let err = f.sync.toggle_completion(&pending[0].id).await.unwrap_err();
        assert!(err.is_mutation_failure());
        assert!(!f.sync.get(&pending[0].id).await.unwrap().completed);

        f.gateway.release(1);
        handle.await.unwrap().unwrap();

        let tasks = f.sync.snapshot().await;
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].id, "t1");
        assert_eq!(
            f.notifications(),
            vec![
                Notification::Error(TOGGLE_FAILED.into()),
                Notification::Success(CREATED.into())
            ]
        );
    }

    #[tokio::test]
    async fn test_create_then_load_round_trip() {
        let mut f = fixture();
        f.gateway.respond(
            Method::Post,
            TASKS_PATH,
            Ok(server_task_json("t1", "Buy milk", false)),
        );
        let created = f.sync.create("Buy milk", "").await.unwrap().unwrap();

        f.seed(vec![server_task_json("t1", "Buy milk", false)]).await;

        assert_eq!(f.sync.snapshot().await, vec![created]);
    }

    // ============================================================================
    // toggle_completion
    // ============================================================================

    #[tokio::test]
    async fn test_toggle_success_reconciles() {
        let mut f = fixture();
        f.seed(vec![server_task_json("t1", "a", false)]).await;
        f.gateway.respond(
            Method::Patch,
            task_completion_path("t1"),
            Ok(server_task_json("t1", "a", true)),
        );

        let task = f.sync.toggle_completion("t1").await.unwrap().unwrap();

        assert!(task.completed);
        assert!(f.sync.get("t1").await.unwrap().completed);
        assert_eq!(
            f.notifications(),
            vec![Notification::Success(COMPLETED.into())]
        );
    }

    #[tokio::test]
    async fn test_toggle_failure_reverts() {
        let mut f = fixture();
        f.seed(vec![server_task_json("t1", "a", false)]).await;
        f.gateway
            .respond(Method::Patch, task_completion_path("t1"), Err(server_error()));

        let err = f.sync.toggle_completion("t1").await.unwrap_err();

        assert!(err.is_mutation_failure());
        assert!(!f.sync.get("t1").await.unwrap().completed);
        assert_eq!(
            f.notifications(),
            vec![Notification::Error(TOGGLE_FAILED.into())]
        );
    }

    #[tokio::test]
    async fn test_toggle_is_optimistic() {
        let f = build(MockGateway::gated());
        f.gateway.respond(
            Method::Get,
            TASKS_PATH,
            Ok(json!([server_task_json("t1", "a", false)])),
        );
        f.gateway.release(1);
        f.sync.load_all().await.unwrap();
        f.gateway.respond(
            Method::Patch,
            task_completion_path("t1"),
            Ok(server_task_json("t1", "a", true)),
        );

        let sync = f.sync.clone();
        let handle = tokio::spawn(async move { sync.toggle_completion("t1").await });
        f.gateway.wait_for_requests(2).await;

        assert!(f.sync.get("t1").await.unwrap().completed);

        f.gateway.release(1);
        handle.await.unwrap().unwrap();
        assert!(f.sync.get("t1").await.unwrap().completed);
    }

    #[tokio::test]
    async fn test_double_toggle_returns_to_original() {
        let mut f = fixture();
        f.seed(vec![server_task_json("t1", "a", false)]).await;
        f.gateway.respond(
            Method::Patch,
            task_completion_path("t1"),
            Ok(server_task_json("t1", "a", true)),
        );
        f.gateway.respond(
            Method::Patch,
            task_completion_path("t1"),
            Ok(server_task_json("t1", "a", false)),
        );

        f.sync.toggle_completion("t1").await.unwrap();
        let task = f.sync.toggle_completion("t1").await.unwrap().unwrap();

        assert_eq!(task, server_task("t1", "a", false));
        assert_eq!(
            f.notifications(),
            vec![
                Notification::Success(COMPLETED.into()),
                Notification::Success(REACTIVATED.into())
            ]
        );
    }

    #[tokio::test]
    async fn test_toggle_absent_is_noop() {
        let mut f = fixture();
        assert!(f.sync.toggle_completion("missing").await.unwrap().is_none());
        assert_eq!(f.gateway.request_count(), 0);
        assert!(f.notifications().is_empty());
    }

    // ============================================================================
    // update
    // ============================================================================

    #[tokio::test]
    async fn test_update_keeps_unset_fields() {
        let mut f = fixture();
        f.seed(vec![server_task_json("t1", "Buy milk", false)]).await;
        let mut confirmed = server_task_json("t1", "Buy milk", false);
        confirmed["description"] = json!("new");
        f.gateway
            .respond(Method::Put, task_path("t1"), Ok(confirmed));

        let task = f
            .sync
            .update("t1", &TaskPatch::default().with_description("new"))
            .await
            .unwrap()
            .unwrap();

        assert_eq!(task.title.as_deref(), Some("Buy milk"));
        assert_eq!(task.description, "new");
        assert_eq!(
            f.gateway.requests()[1].body,
            Some(json!({ "title": "Buy milk", "description": "new", "is_completed": false }))
        );
        assert_eq!(
            f.notifications(),
            vec![Notification::Success(UPDATED.into())]
        );
    }

    #[tokio::test]
    async fn test_update_failure_restores_pre_image() {
        let mut f = fixture();
        f.seed(vec![server_task_json("t1", "Buy milk", false)]).await;
        f.gateway
            .respond(Method::Put, task_path("t1"), Err(server_error()));

        let err = f
            .sync
            .update("t1", &TaskPatch::default().with_title("Buy oat milk"))
            .await
            .unwrap_err();

        assert!(err.is_mutation_failure());
        assert_eq!(
            f.sync.get("t1").await.unwrap(),
            server_task("t1", "Buy milk", false)
        );
        assert_eq!(
            f.notifications(),
            vec![Notification::Error(UPDATE_FAILED.into())]
        );
    }

    #[tokio::test]
    async fn test_update_absent_is_noop() {
        let f = fixture();
        let result = f
            .sync
            .update("missing", &TaskPatch::default().with_title("x"))
            .await
            .unwrap();
        assert!(result.is_none());
        assert_eq!(f.gateway.request_count(), 0);
    }

    // ============================================================================
    // delete
    // ============================================================================

    #[tokio::test]
    async fn test_delete_success() {
        let mut f = fixture();
        f.seed(vec![server_task_json("t1", "a", false)]).await;
        f.gateway.respond(
            Method::Delete,
            task_path("t1"),
            Ok(json!({ "message": "Task deleted successfully" })),
        );

        assert!(f.sync.delete("t1").await.unwrap());
        assert!(f.sync.snapshot().await.is_empty());
        assert_eq!(
            f.notifications(),
            vec![Notification::Success(DELETED.into())]
        );
    }

    #[tokio::test]
    async fn test_delete_failure_restores_task() {
        let mut f = fixture();
        f.seed(vec![
            server_task_json("t1", "a", false),
            server_task_json("t2", "b", false),
        ])
        .await;
        f.gateway
            .respond(Method::Delete, task_path("t1"), Err(server_error()));

        let err = f.sync.delete("t1").await.unwrap_err();

        assert!(err.is_mutation_failure());
        let ids: Vec<String> = f.sync.snapshot().await.into_iter().map(|t| t.id).collect();
        assert_eq!(ids.len(), 2);
        assert!(ids.contains(&"t1".to_string()));
        assert_eq!(
            f.notifications(),
            vec![Notification::Error(DELETE_FAILED.into())]
        );
    }

    #[tokio::test]
    async fn test_delete_absent_is_noop() {
        let f = fixture();
        assert!(!f.sync.delete("missing").await.unwrap());
        assert_eq!(f.gateway.request_count(), 0);
    }

    // ============================================================================
    // Authorization failures
    // ============================================================================

    #[tokio::test]
    async fn test_401_ends_session_and_drops_tasks() {
        let mut f = fixture();
        f.seed(vec![server_task_json("t1", "a", false)]).await;
        f.gateway.respond(
            Method::Delete,
            task_path("t1"),
            Err(GatewayError::Unauthorized("expired".into())),
        );

        let err = f.sync.delete("t1").await.unwrap_err();

        assert!(err.is_auth_expired());
        assert!(!f.session.is_authenticated());
        assert!(f.sync.snapshot().await.is_empty());
        assert!(f.sync.last_error().await.is_none());

        let mut navigated = false;
        let mut errors = 0;
        while let Ok(event) = f.events.try_recv() {
            match event {
                ClientEvent::Navigate { route } => navigated = route == Route::Login,
                ClientEvent::Notify { notification } => {
                    assert!(notification.is_error());
                    errors += 1;
                }
            }
        }
        assert!(navigated);
        assert_eq!(errors, 1);
    }

    #[tokio::test]
    async fn test_failed_delete_after_session_ends_is_not_restored() {
        let mut f = build(MockGateway::gated());
        f.gateway.respond(
            Method::Get,
            TASKS_PATH,
            Ok(json!([server_task_json("t1", "secret", false)])),
        );
        f.gateway.release(1);
        f.sync.load_all().await.unwrap();
        f.gateway
            .respond(Method::Delete, task_path("t1"), Err(server_error()));

        let sync = f.sync.clone();
        let handle = tokio::spawn(async move { sync.delete("t1").await });
        f.gateway.wait_for_requests(2).await;

        f.session.invalidate();
        assert!(f.sync.snapshot().await.is_empty());

        f.gateway.release(1);
        let err = handle.await.unwrap().unwrap_err();

        assert!(err.is_mutation_failure());
        assert!(f.sync.snapshot().await.is_empty());
        assert!(f.sync.last_error().await.is_none());
        assert_eq!(
            f.notifications(),
            vec![Notification::Error(DELETE_FAILED.into())]
        );
    }

    #[tokio::test]
    async fn test_new_session_does_not_inherit_tasks() {
        let mut f = fixture();
        f.seed(vec![server_task_json("t1", "a", false)]).await;

        f.session.invalidate();
        f.session
            .establish(Credential::new("other"), identity("u2"))
            .unwrap();

        assert!(f.sync.snapshot().await.is_empty());
        assert_eq!(f.sync.completed_count().await + f.sync.pending_count().await, 0);
    }

    #[tokio::test]
    async fn test_403_keeps_session() {
        let mut f = fixture();
        f.seed(vec![server_task_json("t1", "a", false)]).await;
        f.gateway.respond(
            Method::Put,
            task_path("t1"),
            Err(GatewayError::Forbidden("Not your task".into())),
        );

        let err = f
            .sync
            .update("t1", &TaskPatch::default().with_title("x"))
            .await
            .unwrap_err();

        assert_eq!(err, TaskdeckError::Forbidden("Not your task".into()));
        assert!(f.session.is_authenticated());
        assert_eq!(f.sync.get("t1").await.unwrap().title.as_deref(), Some("a"));
        assert_eq!(
            f.notifications(),
            vec![Notification::Error(UPDATE_FAILED.into())]
        );
    }

    // ============================================================================
    // Queries
    // ============================================================================

    #[tokio::test]
    async fn test_counts_and_view() {
        let mut f = fixture();
        f.seed(vec![
            server_task_json("t1", "milk", false),
            server_task_json("t2", "bread", true),
            server_task_json("t3", "oat milk", true),
        ])
        .await;

        assert_eq!(f.sync.completed_count().await, 2);
        assert_eq!(f.sync.pending_count().await, 1);

        let query = TaskQuery::default()
            .with_filter(TaskFilter::Completed)
            .with_search("MILK");
        let view = f.sync.view(&query).await;
        assert_eq!(view.len(), 1);
        assert_eq!(view[0].id, "t3");
        assert_eq!(f.sync.snapshot().await.len(), 3);
    }

    #[tokio::test]
    async fn test_clear() {
        let mut f = fixture();
        f.seed(vec![server_task_json("t1", "a", false)]).await;
        f.sync.clear().await;
        assert!(f.sync.snapshot().await.is_empty());
    }

    #[tokio::test]
    async fn test_update_response_after_clear_is_not_applied() {
        let f = build(MockGateway::gated());
        f.gateway.respond(
            Method::Get,
            TASKS_PATH,
            Ok(json!([server_task_json("t1", "a", false)])),
        );
        f.gateway.release(1);
        f.sync.load_all().await.unwrap();
        f.gateway.respond(
            Method::Put,
            task_path("t1"),
            Ok(server_task_json("t1", "b", false)),
        );

        let sync = f.sync.clone();
        let handle = tokio::spawn(async move {
            sync.update("t1", &TaskPatch::default().with_title("b")).await
        });
        f.gateway.wait_for_requests(2).await;

        f.sync.clear().await;
        f.gateway.release(1);
        let task = handle.await.unwrap().unwrap().unwrap();

        assert_eq!(task.title.as_deref(), Some("b"));
        assert!(f.sync.snapshot().await.is_empty());
    }
}
