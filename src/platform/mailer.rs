//! Fire-and-forget transactional email with a small buffered send queue.
//!
//! Callers enqueue without waiting; a background worker delivers through
//! the platform's `send-email` function. Delivery failures are logged and
//! never reach the caller's primary flow.

use std::time::Duration;

use serde::Serialize;
use tokio::{sync::mpsc, task::JoinHandle, time::sleep};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use super::client::PlatformClient;

const QUEUE_CAPACITY: usize = 256;
const MAX_ATTEMPTS: u32 = 3;
const INITIAL_RETRY_DELAY: Duration = Duration::from_secs(1);

/// Hosted function that renders and sends templated email.
pub const SEND_EMAIL_FUNCTION: &str = "send-email";

/// Email templates known to the platform.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum EmailTemplate {
    /// Invitation with an acceptance link.
    Invitation,
    /// Welcome after an invitation was accepted.
    Welcome,
}

/// A queued email.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct EmailMessage {
    /// Recipient address.
    pub to: String,
    /// Template to render.
    pub template: EmailTemplate,
    /// Template variables.
    pub data: serde_json::Value,
}

/// Handle for enqueueing email; cheap to clone.
#[derive(Clone)]
pub struct Mailer {
    queue_tx: Option<mpsc::Sender<EmailMessage>>,
}

impl Mailer {
    /// Start the delivery worker.
    #[must_use]
    pub fn start(client: PlatformClient, cancel: CancellationToken) -> (Self, JoinHandle<()>) {
        let (queue_tx, queue_rx) = mpsc::channel(QUEUE_CAPACITY);
        let worker = spawn_worker(client, queue_rx, cancel);
        info!("mailer started with buffered queue");
        (
            Self {
                queue_tx: Some(queue_tx),
            },
            worker,
        )
    }

    /// A mailer that drops every message; used when no platform is configured.
    #[must_use]
    pub fn disabled() -> Self {
        Self { queue_tx: None }
    }

    /// A mailer whose queue is drained by the caller instead of a worker.
    #[must_use]
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<EmailMessage>) {
        let (queue_tx, queue_rx) = mpsc::channel(capacity);
        (
            Self {
                queue_tx: Some(queue_tx),
            },
            queue_rx,
        )
    }

    /// Enqueue a message without waiting. Never fails the caller.
    pub fn send(&self, message: EmailMessage) {
        let Some(tx) = self.queue_tx.as_ref() else {
            info!(template = ?message.template, "email delivery disabled; dropping message");
            return;
        };
        if let Err(err) = tx.try_send(message) {
            warn!(%err, "failed to enqueue email");
        }
    }
}

fn spawn_worker(
    client: PlatformClient,
    mut queue_rx: mpsc::Receiver<EmailMessage>,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            let message = tokio::select! {
                () = cancel.cancelled() => break,
                next = queue_rx.recv() => match next {
                    Some(message) => message,
                    None => break,
                },
            };
            deliver(&client, &message).await;
        }
        info!("mailer task exiting");
    })
}

async fn deliver(client: &PlatformClient, message: &EmailMessage) {
    let mut backoff = INITIAL_RETRY_DELAY;
    for attempt in 1..=MAX_ATTEMPTS {
        match client.invoke(SEND_EMAIL_FUNCTION, message).await {
            Ok(()) => {
                info!(template = ?message.template, "sent email");
                return;
            }
            Err(err) if attempt < MAX_ATTEMPTS => {
                warn!(%err, attempt, delay = ?backoff, "email send failed; retrying");
                sleep(backoff).await;
                backoff *= 2;
            }
            Err(err) => {
                error!(%err, template = ?message.template, "email send failed; giving up");
            }
        }
    }
}
