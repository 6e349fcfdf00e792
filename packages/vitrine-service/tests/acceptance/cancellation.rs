use std::time::Duration;

use super::{doc, live_service};
use vitrine_service::{CancelHandle, CancelSignal, Error, SearchRequest};

#[tokio::test]
async fn slow_backend_hits_the_deadline() {
	let (index, service) = live_service(vec![doc("a", &["grpa"])]).await;

	index.delay_responses(Duration::from_millis(500));

	let signal = CancelSignal::never().with_timeout(Duration::from_millis(50));
	let ctx = service
		.context(Some("test"), Some(Vec::new()), signal)
		.expect("Failed to build request context.");
	let err = service.search(&ctx, &SearchRequest::default()).await.expect_err("Deadline must apply.");

	assert!(matches!(err, Error::DeadlineExceeded { ref operation } if operation == "search"), "{err:?}");

	let err = service.batch_get(&ctx, &["a".to_string()]).await.expect_err("Deadline must apply.");

	assert!(matches!(err, Error::DeadlineExceeded { .. }), "{err:?}");
}

#[tokio::test]
async fn cancelled_request_never_reaches_the_backend() {
	let (index, service) = live_service(vec![doc("a", &["grpa"])]).await;
	let (handle, signal) = CancelHandle::new();
	let ctx = service
		.context(Some("test"), Some(Vec::new()), signal)
		.expect("Failed to build request context.");

	handle.cancel();

	let err = service.search(&ctx, &SearchRequest::default()).await.expect_err("Cancel must apply.");

	assert!(matches!(err, Error::Cancelled { .. }), "{err:?}");
	assert_eq!(index.search_calls(), 0);
}

#[tokio::test]
async fn cancellation_during_a_slow_call_aborts_it() {
	let (index, service) = live_service(vec![doc("a", &["grpa"])]).await;

	index.delay_responses(Duration::from_millis(500));

	let (handle, signal) = CancelHandle::new();
	let ctx = service
		.context(Some("test"), Some(Vec::new()), signal)
		.expect("Failed to build request context.");
	let canceller = tokio::spawn(async move {
		tokio::time::sleep(Duration::from_millis(50)).await;
		handle.cancel();
	});
	let err = service
		.batch_get(&ctx, &["a".to_string()])
		.await
		.expect_err("Cancel must apply.");

	canceller.await.expect("Canceller task failed.");

	assert!(matches!(err, Error::Cancelled { .. }), "{err:?}");
}
