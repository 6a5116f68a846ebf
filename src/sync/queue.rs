//! Offline operation queue
//!
//! `OperationQueue` is the seam where a durable queue plugs in. The default
//! `LoggingOperationQueue` only logs what it is given and drains nothing.

use async_trait::async_trait;

use super::types::SyncOperation;
use crate::error::Result;

#[async_trait]
pub trait OperationQueue: Send + Sync {
    /// Accept an operation captured while offline
    async fn enqueue(&self, op: SyncOperation) -> Result<()>;

    /// Send whatever is queued
    async fn process(&self) -> Result<()>;
}

/// Stub queue: logs enqueued operations, processing is a no-op
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingOperationQueue;

#[async_trait]
impl OperationQueue for LoggingOperationQueue {
    async fn enqueue(&self, op: SyncOperation) -> Result<()> {
        tracing::info!(
            "Queued {} {} {} ({} bytes, op {})",
            op.op_type.as_str(),
            op.entity_type,
            op.entity_id,
            op.payload.len(),
            op.id
        );
        Ok(())
    }

    async fn process(&self) -> Result<()> {
        tracing::debug!("Operation queue processing is not implemented; nothing drained");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sync::OperationType;

    #[tokio::test]
    async fn test_stub_queue_accepts_and_drains_nothing() {
        let queue = LoggingOperationQueue;
        let op = SyncOperation::new(OperationType::Update, "clients", "3", b"{}".to_vec());

        queue.enqueue(op).await.unwrap();
        queue.process().await.unwrap();
    }
}
