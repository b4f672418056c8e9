//! Runs continuation requests off the UI thread.
//!
//! Each request gets a worker thread that calls the source and a waiter that
//! enforces the deadline. Exactly one of `GenerationComplete` or
//! `GenerationFailed` is delivered per request unless the handle was
//! cancelled first.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::error::SourceError;
use crate::runtime::TrainerEvent;
use crate::session::GenerationRequest;
use crate::sources::TextSource;

/// Cancels delivery of one in-flight request.
#[derive(Debug, Clone)]
pub struct GenerationHandle {
    cancelled: Arc<AtomicBool>,
}

impl GenerationHandle {
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

pub struct GenerationAdapter {
    source: Arc<dyn TextSource>,
    timeout: Duration,
    tx: Sender<TrainerEvent>,
}

impl GenerationAdapter {
    pub fn new(source: Arc<dyn TextSource>, timeout: Duration, tx: Sender<TrainerEvent>) -> Self {
        Self {
            source,
            timeout,
            tx,
        }
    }

    pub fn supports_continuation(&self) -> bool {
        self.source.supports_continuation()
    }

    pub fn request_continuation(&self, request: GenerationRequest) -> GenerationHandle {
        let handle = GenerationHandle {
            cancelled: Arc::new(AtomicBool::new(false)),
        };
        info!(
            error_chars = request.error_chars.len(),
            error_words = request.error_words.len(),
            "generating continuation"
        );

        let (result_tx, result_rx) = mpsc::channel();
        let source = Arc::clone(&self.source);
        thread::spawn(move || {
            let result = source.continuation(
                &request.context,
                &request.error_chars,
                &request.error_words,
            );
            // the waiter may already have given up
            let _ = result_tx.send(result);
        });

        let tx = self.tx.clone();
        let timeout = self.timeout;
        let waiter_handle = handle.clone();
        thread::spawn(move || {
            let result = match result_rx.recv_timeout(timeout) {
                Ok(result) => result,
                Err(RecvTimeoutError::Timeout) => Err(SourceError::Timeout(timeout)),
                Err(RecvTimeoutError::Disconnected) => Err(SourceError::Disconnected),
            };

            if waiter_handle.is_cancelled() {
                debug!("generation result dropped after cancel");
                return;
            }

            let event = match result {
                Ok(text) => TrainerEvent::GenerationComplete(text),
                Err(err) => {
                    warn!(error = %err, "continuation request failed");
                    TrainerEvent::GenerationFailed(err.to_string())
                }
            };
            let _ = tx.send(event);
        });

        handle
    }
}
