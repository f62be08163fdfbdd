//! Cooperative, hierarchical cancellation.
//!
//! A [`CancelSignal`] is raised once and stays raised. Signals derived with
//! [`CancelSignal::child`] observe every ancestor, so raising a session's
//! signal stops all of its workers while a worker's own signal only stops
//! that worker.

use futures::future::select_all;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use tokio::sync::watch;

#[derive(Debug, Clone)]
pub struct CancelSignal {
    own: Arc<watch::Sender<bool>>,
    /// Receivers for this signal and every ancestor.
    chain: Vec<watch::Receiver<bool>>,
}

impl Default for CancelSignal {
    fn default() -> Self {
        Self::new()
    }
}

impl CancelSignal {
    pub fn new() -> Self {
        let (tx, rx) = watch::channel(false);
        Self {
            own: Arc::new(tx),
            chain: vec![rx],
        }
    }

    /// A signal raised by `cancel()` on itself or on any ancestor of `self`.
    pub fn child(&self) -> Self {
        let mut child = Self::new();
        child.chain.splice(0..0, self.chain.iter().cloned());
        child
    }

    /// A child that additionally follows `other` and its ancestors.
    pub fn child_with(&self, other: &CancelSignal) -> Self {
        let mut child = self.child();
        child.chain.splice(0..0, other.chain.iter().cloned());
        child
    }

    pub fn cancel(&self) {
        self.own.send_replace(true);
    }

    pub fn is_cancelled(&self) -> bool {
        self.chain.iter().any(|rx| *rx.borrow())
    }

    /// Resolves once this signal or an ancestor is raised.
    pub async fn cancelled(&self) {
        if self.is_cancelled() {
            return;
        }
        let waits: Vec<Pin<Box<dyn Future<Output = ()> + Send>>> = self
            .chain
            .iter()
            .map(|rx| {
                let mut rx = rx.clone();
                Box::pin(async move {
                    // A dropped sender can never be raised any more.
                    let closed = rx.wait_for(|raised| *raised).await.is_err();
                    if closed {
                        std::future::pending::<()>().await;
                    }
                }) as Pin<Box<dyn Future<Output = ()> + Send>>
            })
            .collect();
        select_all(waits).await;
    }
}
