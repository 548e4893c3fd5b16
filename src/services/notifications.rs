//! Asynchronous notification dispatch
//!
//! Workflow transitions enqueue notices and return immediately; a worker
//! task drains the queue and delivers through the email service. Failed
//! sends are re-enqueued with a delay up to the configured attempt cap
//! (at-least-once until the cap, then logged and dropped), so delivery
//! never blocks or fails a state transition.

use std::time::Duration;

use tokio::sync::mpsc;

use crate::{
    config::NotificationsConfig,
    services::email::{EmailService, Notification},
};

struct QueuedNotification {
    notification: Notification,
    attempts: u32,
}

#[derive(Clone)]
pub struct NotificationDispatcher {
    tx: mpsc::UnboundedSender<QueuedNotification>,
}

impl NotificationDispatcher {
    /// Spawn the delivery worker and return the dispatch handle
    pub fn start(email: EmailService, config: NotificationsConfig) -> Self {
        let (tx, mut rx) = mpsc::unbounded_channel::<QueuedNotification>();
        let requeue = tx.clone();

        tokio::spawn(async move {
            while let Some(mut queued) = rx.recv().await {
                queued.attempts += 1;
                match email.send(&queued.notification) {
                    Ok(()) => {
                        tracing::debug!(
                            to = %queued.notification.to,
                            subject = %queued.notification.subject,
                            "Notification delivered"
                        );
                    }
                    Err(e) if queued.attempts < config.max_attempts => {
                        tracing::warn!(
                            to = %queued.notification.to,
                            attempt = queued.attempts,
                            "Notification delivery failed, requeueing: {}",
                            e
                        );
                        let requeue = requeue.clone();
                        let delay = Duration::from_secs(config.retry_delay_secs);
                        tokio::spawn(async move {
                            tokio::time::sleep(delay).await;
                            let _ = requeue.send(queued);
                        });
                    }
                    Err(e) => {
                        tracing::error!(
                            to = %queued.notification.to,
                            attempts = queued.attempts,
                            "Notification dropped after repeated failures: {}",
                            e
                        );
                    }
                }
            }
        });

        Self { tx }
    }

    /// Enqueue a notification; never blocks and never fails the caller
    pub fn enqueue(&self, notification: Notification) {
        if self
            .tx
            .send(QueuedNotification {
                notification,
                attempts: 0,
            })
            .is_err()
        {
            tracing::error!("Notification queue is closed, notice lost");
        }
    }
}
