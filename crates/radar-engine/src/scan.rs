//! First-scan batches streamed out of a blocking search thread.

use crate::cancel::CancelSignal;
use crate::error::RouteError;
use radar_core::{GridCoord, PathFinder, ScanBatch};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Receiving end of a coarse-to-fine scan running on the blocking pool.
///
/// The producer checks the signal before each level and stops early when it
/// is raised or when the stream is dropped.
#[derive(Debug)]
pub struct ScanStream {
    rx: mpsc::Receiver<ScanBatch>,
    producer: JoinHandle<()>,
}

impl ScanStream {
    pub fn spawn(
        finder: Arc<PathFinder>,
        origin: GridCoord,
        destination: GridCoord,
        cancel: CancelSignal,
    ) -> Self {
        let capacity = finder.config().levels.len().max(1);
        let (tx, rx) = mpsc::channel(capacity);

        let producer = tokio::task::spawn_blocking(move || {
            let mut scan = finder.run_first_scan(origin, destination);
            loop {
                if cancel.is_cancelled() {
                    tracing::debug!("First scan towards {} cancelled", destination);
                    break;
                }
                let Some(batch) = scan.next() else {
                    break;
                };
                if tx.blocking_send(batch).is_err() {
                    break;
                }
            }
        });

        Self { rx, producer }
    }

    /// Next batch, coarsest first. `None` once the scan is over.
    pub async fn next(&mut self) -> Option<ScanBatch> {
        self.rx.recv().await
    }

    /// Wait for the producer to exit and surface a panic in the search.
    pub async fn finish(self) -> Result<(), RouteError> {
        drop(self.rx);
        self.producer.await?;
        Ok(())
    }
}

/// Run one exact search on the blocking pool.
pub async fn find_path_blocking(
    finder: Arc<PathFinder>,
    origin: GridCoord,
    destination: GridCoord,
) -> Result<Vec<GridCoord>, RouteError> {
    let path = tokio::task::spawn_blocking(move || finder.find_path(origin, destination)).await?;
    Ok(path)
}
