//! Time and cancellation primitives driving the reconciliation loop.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

/// Source of delays between reconciliation cycles.
#[async_trait]
pub trait Clock: Send + Sync {
	async fn sleep(&self, duration: Duration);
}

/// Real time, backed by the tokio timer.
pub struct TokioClock;

#[async_trait]
impl Clock for TokioClock {
	async fn sleep(&self, duration: Duration) {
		tokio::time::sleep(duration).await;
	}
}

/// Cloneable cancellation flag shared between a session and its owner.
#[derive(Clone)]
pub struct ShutdownHandle {
	sender: Arc<watch::Sender<bool>>,
}

impl Default for ShutdownHandle {
	fn default() -> Self {
		Self::new()
	}
}

impl ShutdownHandle {
	pub fn new() -> Self {
		let (sender, _) = watch::channel(false);
		Self {
			sender: Arc::new(sender),
		}
	}

	/// Requests cancellation. Idempotent.
	pub fn shutdown(&self) {
		self.sender.send_replace(true);
	}

	pub fn is_shutdown(&self) -> bool {
		*self.sender.borrow()
	}

	/// Resolves once cancellation has been requested.
	pub async fn cancelled(&self) {
		let mut receiver = self.sender.subscribe();
		// The sender lives as long as `self`, so this only ends on `true`
		let _ = receiver.wait_for(|cancelled| *cancelled).await;
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[tokio::test]
	async fn test_cancelled_resolves_after_shutdown() {
		let handle = ShutdownHandle::new();
		assert!(!handle.is_shutdown());

		let waiter = {
			let handle = handle.clone();
			tokio::spawn(async move { handle.cancelled().await })
		};

		handle.shutdown();
		waiter.await.unwrap();
		assert!(handle.is_shutdown());

		// Already cancelled handles resolve immediately
		handle.cancelled().await;
	}
}
