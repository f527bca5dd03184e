use crate::registry::PositionRegistry;
use anyhow::Result;
use order_relay_core::{BrokerSession, ComputedOrder, StrategyId};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// One pending open submission.
#[derive(Debug, Clone)]
pub struct OpenRequest {
    pub strategy: StrategyId,
    pub order: ComputedOrder,
}

#[derive(Debug)]
enum QueueCommand {
    Submit(OpenRequest),
    Shutdown,
}

/// Clonable producer side of the open-submission queue.
#[derive(Clone)]
pub struct ExecutionHandle {
    tx: mpsc::Sender<QueueCommand>,
}

impl ExecutionHandle {
    /// Queues an open for the worker.
    ///
    /// # Errors
    /// Returns an error if the worker has shut down.
    pub async fn submit(&self, request: OpenRequest) -> Result<()> {
        self.tx.send(QueueCommand::Submit(request)).await?;
        Ok(())
    }

    /// Asks the worker to drain whatever is queued and then stop.
    ///
    /// # Errors
    /// Returns an error if the worker has already shut down.
    pub async fn shutdown(&self) -> Result<()> {
        self.tx.send(QueueCommand::Shutdown).await?;
        Ok(())
    }
}

/// Spawns the single open-order worker and returns its handle.
///
/// Exactly one worker consumes the queue, so open calls reach the broker
/// strictly in submission order with at most one in flight. That is the
/// relay's ordering guarantee against the broker's rate limit.
#[must_use]
pub fn spawn_open_worker(
    session: Arc<dyn BrokerSession>,
    registry: Arc<PositionRegistry>,
    queue_depth: usize,
) -> (ExecutionHandle, JoinHandle<()>) {
    let (tx, rx) = mpsc::channel(queue_depth);
    let worker = tokio::spawn(run_open_worker(rx, session, registry));
    (ExecutionHandle { tx }, worker)
}

async fn run_open_worker(
    mut rx: mpsc::Receiver<QueueCommand>,
    session: Arc<dyn BrokerSession>,
    registry: Arc<PositionRegistry>,
) {
    while let Some(command) = rx.recv().await {
        match command {
            QueueCommand::Submit(request) => {
                let OpenRequest { strategy, order } = request;
                match session.open_position(&order).await {
                    Ok(deal) => {
                        registry.record_open(strategy, &order.symbol, deal.clone()).await;
                        tracing::info!(
                            strategy,
                            symbol = %order.symbol,
                            %deal,
                            lot = %order.lot,
                            direction = %order.direction,
                            "position opened"
                        );
                    }
                    Err(e) => {
                        // dropped, not retried: a phantom open must never
                        // land in the registry
                        tracing::error!(
                            strategy,
                            symbol = %order.symbol,
                            error = %e,
                            "open rejected, dropping submission"
                        );
                    }
                }
            }
            QueueCommand::Shutdown => {
                // stop accepting, keep draining what is already queued
                rx.close();
            }
        }
    }
    tracing::info!("open worker drained and stopped");
}
