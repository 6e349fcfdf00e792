use std::{future::Future, sync::Arc, time::Duration};

use tokio::{sync::watch, time::Instant};

use crate::{Error, Result};
use vitrine_config::Tenant;
use vitrine_domain::effective_groups;

/// Identity and cancellation state of one inbound request.
///
/// Built once by the gateway adapter and passed explicitly into every core call.
#[derive(Clone)]
pub struct RequestContext {
	tenant: Arc<Tenant>,
	caller_groups: Vec<String>,
	groups: Vec<String>,
	cancel: CancelSignal,
}
impl RequestContext {
	pub fn new(tenant: Arc<Tenant>, caller_groups: Vec<String>, cancel: CancelSignal) -> Self {
		let groups = effective_groups(&tenant.groups, &caller_groups);

		Self { tenant, caller_groups, groups, cancel }
	}

	pub fn tenant(&self) -> &Tenant {
		&self.tenant
	}

	pub fn caller_groups(&self) -> &[String] {
		&self.caller_groups
	}

	/// Lowercased, deduplicated union of tenant and caller groups.
	pub fn groups(&self) -> &[String] {
		&self.groups
	}

	pub fn cancel_signal(&self) -> &CancelSignal {
		&self.cancel
	}

	pub(crate) async fn guard<F, T>(&self, operation: &str, fut: F) -> Result<T>
	where
		F: Future<Output = Result<T>>,
	{
		self.cancel.guard(operation, fut).await
	}
}

/// Observes caller cancellation and an optional deadline.
#[derive(Clone, Debug, Default)]
pub struct CancelSignal {
	rx: Option<watch::Receiver<bool>>,
	deadline: Option<Instant>,
}
impl CancelSignal {
	/// A signal that never fires.
	pub fn never() -> Self {
		Self::default()
	}

	pub fn with_deadline(mut self, deadline: Instant) -> Self {
		self.deadline = Some(self.deadline.map_or(deadline, |current| current.min(deadline)));

		self
	}

	pub fn with_timeout(self, timeout: Duration) -> Self {
		self.with_deadline(Instant::now() + timeout)
	}

	pub fn deadline(&self) -> Option<Instant> {
		self.deadline
	}

	pub fn is_cancelled(&self) -> bool {
		self.rx.as_ref().is_some_and(|rx| *rx.borrow())
	}

	/// Runs `fut` unless the caller cancels or the deadline passes first.
	pub async fn guard<F, T>(&self, operation: &str, fut: F) -> Result<T>
	where
		F: Future<Output = Result<T>>,
	{
		let cancelled = async {
			match self.rx.clone() {
				Some(mut rx) => {
					let closed = rx.wait_for(|cancelled| *cancelled).await.is_err();

					// A dropped handle can no longer cancel.
					if closed {
						std::future::pending::<()>().await;
					}
				},
				None => std::future::pending::<()>().await,
			}
		};
		let expired = async {
			match self.deadline {
				Some(deadline) => tokio::time::sleep_until(deadline).await,
				None => std::future::pending::<()>().await,
			}
		};

		tokio::select! {
			biased;
			_ = cancelled => Err(Error::Cancelled { operation: operation.to_string() }),
			_ = expired => Err(Error::DeadlineExceeded { operation: operation.to_string() }),
			out = fut => out,
		}
	}
}

/// Caller side of a [`CancelSignal`].
pub struct CancelHandle {
	tx: watch::Sender<bool>,
}
impl CancelHandle {
	pub fn new() -> (Self, CancelSignal) {
		let (tx, rx) = watch::channel(false);

		(Self { tx }, CancelSignal { rx: Some(rx), deadline: None })
	}

	pub fn cancel(&self) {
		self.tx.send_replace(true);
	}
}
