//! Example: watch a disposable inbox from the terminal
//!
//! Requests a temporary address, then prints the inbox every time it
//! changes. New messages show up within one polling cycle.
//!
//! ## Running
//!
//! ```bash
//! cargo run --example watch_inbox
//! ```
//!
//! Send a mail to the printed address from any account and watch it
//! arrive. Press Ctrl-C to exit.

use tempmail_api::MailboxClient;
use tempmail_core::{ControllerConfig, InboxController};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tempmail_core=debug,tempmail_api=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let client = MailboxClient::with_defaults()?;
    let handle = InboxController::spawn(client, ControllerConfig::default());
    let mut snapshots = handle.watch();

    loop {
        let snapshot = snapshots.borrow_and_update().clone();

        if let Some(error) = &snapshot.error {
            println!("error: {error}");
        }
        match &snapshot.address {
            Some(address) => println!("address: {address}"),
            None if snapshot.generating => println!("requesting an address..."),
            None => {}
        }
        if snapshot.messages.is_empty() {
            println!("  (inbox empty)");
        }
        for message in snapshot.messages.iter() {
            println!(
                "  [{}] {} - {} ({})",
                message.id, message.sender, message.subject, message.timestamp
            );
        }
        println!();

        if snapshots.changed().await.is_err() {
            break;
        }
    }

    Ok(())
}
