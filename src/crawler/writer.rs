//! The single writer between workers and the store
//!
//! Every persistence write goes through one bounded channel to one task, so
//! writes never race on the same normalized URL. Producers await `send` when
//! the queue is full. The task runs until every sender is dropped, which
//! drains all queued articles before a run ends.

use crate::state::CrawlCounters;
use crate::storage::{ArticleSnapshot, SharedStore};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

/// A message for the writer task
#[derive(Debug)]
pub enum WriterMessage {
    Save(ArticleSnapshot),
    /// Acknowledged once every earlier message has been written
    Flush(oneshot::Sender<()>),
}

/// Creates the bounded save queue
pub fn save_queue(capacity: usize) -> (mpsc::Sender<WriterMessage>, mpsc::Receiver<WriterMessage>) {
    mpsc::channel(capacity.max(1))
}

/// Spawns the writer task
///
/// Persistence failures are logged and counted; they never stop the writer.
pub fn spawn_writer(
    store: SharedStore,
    mut rx: mpsc::Receiver<WriterMessage>,
    counters: Arc<CrawlCounters>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(message) = rx.recv().await {
            match message {
                WriterMessage::Save(article) => write_one(&store, &article, &counters),
                WriterMessage::Flush(ack) => {
                    let _ = ack.send(());
                }
            }
        }
        tracing::debug!("Save queue drained");
    })
}

fn write_one(store: &SharedStore, article: &ArticleSnapshot, counters: &CrawlCounters) {
    let result = {
        let mut store = store.lock().unwrap_or_else(|e| e.into_inner());
        store.save_document(article)
    };

    match result {
        Ok(kind) => {
            counters.record_write(kind);
            tracing::debug!(url = %article.normalized_url, write = %kind, "Saved article");
        }
        Err(e) => {
            counters.record_save_failure();
            tracing::error!(url = %article.normalized_url, error = %e, "Failed to save article");
        }
    }
}

/// Waits until everything queued before this call has been written
///
/// Returns `false` if the writer is gone.
pub async fn flush(tx: &mpsc::Sender<WriterMessage>) -> bool {
    let (ack, done) = oneshot::channel();
    if tx.send(WriterMessage::Flush(ack)).await.is_err() {
        return false;
    }
    done.await.is_ok()
}
