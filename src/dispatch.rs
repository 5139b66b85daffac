//! Inline or queued login processing
//!
//! [`LoginListener`] is the entry point for login success signals. With no
//! queue attached it runs [`LoginService::execute`] right away; with one, it
//! enqueues the [`LoginParameters`] and a [`LoginWorker`] replays them later.
//! Only plain values cross the queue, so a replayed login has exactly the
//! effects an inline one would.

use std::sync::Arc;
use tokio::sync::mpsc;

use crate::error::{AuthLogError, Result};
use crate::models::LoginParameters;
use crate::service::LoginService;

/// Sending half of the login queue
#[derive(Clone)]
pub struct LoginQueue {
    tx: mpsc::Sender<LoginParameters>,
}

impl LoginQueue {
    /// Create a bounded queue and its receiving end
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<LoginParameters>) {
        let (tx, rx) = mpsc::channel(capacity);
        (LoginQueue { tx }, rx)
    }

    /// Queue a login, waiting for room if the queue is full
    pub async fn enqueue(&self, params: LoginParameters) -> Result<()> {
        self.tx
            .send(params)
            .await
            .map_err(|_| AuthLogError::QueueClosed)
    }

    /// Queue a login without waiting
    pub fn try_enqueue(&self, params: LoginParameters) -> Result<()> {
        self.tx.try_send(params).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => {
                log::warn!("Login queue full");
                AuthLogError::QueueFull
            }
            mpsc::error::TrySendError::Closed(_) => AuthLogError::QueueClosed,
        })
    }

    /// Check if the queue is closed
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Consumes queued logins
pub struct LoginWorker {
    service: Arc<LoginService>,
}

impl LoginWorker {
    pub fn new(service: Arc<LoginService>) -> Self {
        LoginWorker { service }
    }

    /// Process queued logins until every sender is dropped
    ///
    /// A failed login is logged and does not stop the worker. Returns the
    /// number of logins processed successfully.
    pub async fn run(self, mut rx: mpsc::Receiver<LoginParameters>) -> usize {
        log::info!("Login worker started");
        let mut processed = 0;

        while let Some(params) = rx.recv().await {
            match self.service.execute(&params).await {
                Ok(()) => processed += 1,
                Err(e) => log::error!(
                    "Failed to process login for {} '{}': {}",
                    params.factory_name,
                    params.user_identifier,
                    e
                ),
            }
        }

        log::info!("Login worker stopped after {} login(s)", processed);
        processed
    }
}

/// Fail when the worker processed fewer logins than were enqueued
pub fn ensure_processed(enqueued: usize, processed: usize) -> Result<()> {
    if processed < enqueued {
        return Err(AuthLogError::QueuedLoginsFailed {
            failed: enqueued - processed,
            enqueued,
        });
    }
    Ok(())
}

/// Receives login success signals
pub struct LoginListener {
    service: Arc<LoginService>,
    queue: Option<LoginQueue>,
}

impl LoginListener {
    pub fn new(service: Arc<LoginService>) -> Self {
        LoginListener {
            service,
            queue: None,
        }
    }

    /// Route logins through `queue`, or back inline with `None`
    pub fn set_queue(&mut self, queue: Option<LoginQueue>) {
        self.queue = queue;
    }

    pub fn is_async(&self) -> bool {
        self.queue.is_some()
    }

    pub async fn on_login(&self, params: LoginParameters) -> Result<()> {
        match self.queue {
            Some(ref queue) => queue.enqueue(params).await,
            None => self.service.execute(&params).await,
        }
    }
}
