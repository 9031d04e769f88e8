use super::require_login;
use anyhow::{Context, Result};
use taskdeck_application::TaskdeckClient;
use taskdeck_core::user::{Identity, IdentityPatch};

pub async fn login(client: &TaskdeckClient, email: &str, password: &str) -> Result<()> {
    let identity = client
        .session()
        .login(email, password)
        .await
        .context("Login failed")?;
    println!("🔓 Logged in as {}", identity.display_name());
    Ok(())
}

pub async fn register(client: &TaskdeckClient, email: &str, password: &str) -> Result<()> {
    let identity = client
        .session()
        .register(email, password)
        .await
        .context("Registration failed")?;
    println!("🎉 Account created, logged in as {}", identity.display_name());
    Ok(())
}

pub fn logout(client: &TaskdeckClient) -> Result<()> {
    client.logout();
    println!("👋 Logged out");
    Ok(())
}

pub fn whoami(client: &TaskdeckClient) -> Result<()> {
    require_login(client)?;
    if let Some(identity) = client.session().identity() {
        print_identity(&identity);
    }
    Ok(())
}

pub async fn profile(
    client: &TaskdeckClient,
    name: Option<String>,
    username: Option<String>,
    email: Option<String>,
) -> Result<()> {
    require_login(client)?;
    let patch = IdentityPatch {
        name,
        username,
        email,
    };
    if patch.is_empty() {
        println!("Nothing to update. Pass --name, --username or --email.");
        return Ok(());
    }

    let identity = client
        .session()
        .save_profile(&patch)
        .await
        .context("Failed to update profile")?;
    println!("✓ Profile updated");
    print_identity(&identity);
    Ok(())
}

fn print_identity(identity: &Identity) {
    println!("{}", identity.display_name());
    println!("  email:    {}", identity.email);
    if let Some(username) = &identity.username {
        println!("  username: {}", username);
    }
    println!("  id:       {}", identity.id);
    println!("  since:    {}", identity.created_at.format("%Y-%m-%d"));
}
