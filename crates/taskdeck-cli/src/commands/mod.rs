pub mod auth;
pub mod tasks;

use anyhow::{Result, bail};
use taskdeck_application::TaskdeckClient;
use taskdeck_core::session::ClientEvent;
use tokio::sync::mpsc::UnboundedReceiver;

/// Prints the notifications the client emitted while the command ran.
pub fn print_events(events: &mut UnboundedReceiver<ClientEvent>) {
    while let Ok(event) = events.try_recv() {
        match event {
            ClientEvent::Notify { notification } if notification.is_error() => {
                eprintln!("❌ {}", notification.message());
            }
            ClientEvent::Notify { notification } => println!("✅ {}", notification.message()),
            ClientEvent::Navigate { route } => {
                tracing::debug!("[CLI] Navigation to {:?}", route);
            }
        }
    }
}

pub fn require_login(client: &TaskdeckClient) -> Result<()> {
    if !client.session().is_authenticated() {
        bail!("Not logged in. Run `taskdeck login --email <email>` first.");
    }
    Ok(())
}
