use std::fs;

use serde_json::json;

use super::{config, default_tenants, doc, snapshot_backend, temp_dir, with};
use vitrine_service::{CancelSignal, Error, SearchRequest, VectorSearchRequest, VitrineService};
use vitrine_storage::snapshot::SnapshotWriter;

#[tokio::test]
async fn lookups_work_and_search_is_unsupported() {
	let root = temp_dir("snapshot_backend");
	let writer = SnapshotWriter::create(&root).expect("Failed to create snapshot.");

	for (id, source) in [
		with(doc("origin", &["grpa"]), "references", json!([{ "signature": "a" }])),
		doc("a", &["grpa"]),
		doc("hidden", &["grpx"]),
	] {
		assert!(writer.put(&id, &source, false).expect("Failed to write entry."));
	}

	let service = VitrineService::new(config(snapshot_backend(&root), default_tenants()))
		.expect("Failed to build service.");
	let ctx = service
		.context(Some("test"), Some(Vec::new()), CancelSignal::never())
		.expect("Failed to build request context.");

	assert_eq!(service.resolver.backend(), "snapshot");

	let ids = ["origin", "hidden", "missing"].map(str::to_string);
	let entries = service.entries(&ctx, &ids, true).await.expect("Lookup failed.");

	assert_eq!(entries.len(), 1);
	assert_eq!(entries[0].id, "origin");
	assert_eq!(entries[0].references_full.len(), 1);
	assert_eq!(entries[0].references_full[0].signature, "a");

	let search = service.search(&ctx, &SearchRequest::default()).await;
	let vector = service
		.vector_search(&ctx, &VectorSearchRequest { vector: vec![1.0], ..VectorSearchRequest::default() })
		.await;

	assert!(matches!(search, Err(Error::Unsupported { ref backend, .. }) if backend == "snapshot"));
	assert!(matches!(vector, Err(Error::Unsupported { ref operation, .. }) if operation == "vector_search"));

	fs::remove_dir_all(&root).expect("Failed to clean up snapshot.");
}

#[tokio::test]
async fn existing_entries_are_kept_unless_overwritten() {
	let root = temp_dir("snapshot_overwrite");
	let writer = SnapshotWriter::create(&root).expect("Failed to create snapshot.");
	let (id, first) = doc("a", &["grpa"]);
	let (_, second) = with(doc("a", &["grpa"]), "series", json!("Second"));

	assert!(writer.put(&id, &first, false).expect("Failed to write entry."));
	assert!(!writer.put(&id, &second, false).expect("Failed to write entry."));

	let service = VitrineService::new(config(snapshot_backend(&root), default_tenants()))
		.expect("Failed to build service.");
	let ctx = service
		.context(Some("test"), Some(Vec::new()), CancelSignal::never())
		.expect("Failed to build request context.");
	let entries = service.batch_get(&ctx, &[id.clone()]).await.expect("Lookup failed.");

	assert_eq!(entries[0].base.series, "");

	assert!(writer.put(&id, &second, true).expect("Failed to write entry."));

	fs::remove_dir_all(&root).expect("Failed to clean up snapshot.");
}

#[test]
fn missing_snapshot_directory_is_a_config_error() {
	let root = temp_dir("snapshot_missing");
	let result = VitrineService::new(config(snapshot_backend(&root), default_tenants()));

	assert!(matches!(result, Err(Error::Config { .. })));
}
