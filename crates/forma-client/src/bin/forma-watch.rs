//! Debug tail of the Forma push connection.
//!
//! Connects as the given identity and prints every event as it arrives.

use clap::Parser;
use std::sync::Arc;

use forma_client::config::ClientConfig;
use forma_client::events::ClientEvent;
use forma_client::stream::EventStream;
use forma_core::types::id::{SessionId, UserId};

#[derive(Debug, Parser)]
#[command(name = "forma-watch", about = "Tail the Forma push connection")]
struct Args {
    /// Server base URL.
    #[arg(long, default_value = "http://localhost:8080")]
    base_url: String,
    /// User UUID to connect as.
    #[arg(long)]
    user: UserId,
    /// Session UUID (random when omitted).
    #[arg(long)]
    session: Option<SessionId>,
    /// Comma-separated role groups.
    #[arg(long, default_value = "")]
    groups: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    let config = ClientConfig {
        base_url: args.base_url,
        user_id: args.user,
        session_id: args.session.unwrap_or_default(),
        display_name: "forma-watch".to_string(),
        groups: args
            .groups
            .split(',')
            .map(|g| g.trim().to_string())
            .filter(|g| !g.is_empty())
            .collect(),
        reconnect_backoff_seconds: 5,
        default_action_timeout_seconds: 60,
    };

    let stream = Arc::new(EventStream::new(config));
    let mut events = stream.subscribe();

    let pump = stream.clone();
    tokio::spawn(async move { pump.run().await });

    loop {
        match events.recv().await {
            Ok(ClientEvent::Heartbeat) => println!("· heartbeat"),
            Ok(ClientEvent::Welcome { session_id }) => {
                println!("→ connected (session {session_id})");
            }
            Ok(ClientEvent::Counts(counts)) => {
                println!(
                    "# counts total={} non_lues={} urgentes={} actions={}",
                    counts.total, counts.non_lues, counts.urgentes, counts.actions_requises
                );
            }
            Ok(ClientEvent::Notification(n)) => {
                if n.priorite.is_urgent() {
                    // Terminal bell stands in for the native alert.
                    print!("\x07");
                }
                println!("! [{}] {} - {}", n.priorite, n.titre, n.message);
            }
            Ok(ClientEvent::ActionCompleted { notification_id }) => {
                println!("✓ action completed on {notification_id}");
            }
            Ok(ClientEvent::CorrelationResolved {
                correlation_id,
                status,
            }) => {
                println!("= correlation {correlation_id} resolved: {status:?}");
            }
            Err(e) => {
                eprintln!("stream error: {e}");
                break;
            }
        }
    }

    Ok(())
}
