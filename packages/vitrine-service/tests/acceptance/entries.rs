use serde_json::{Value, json};

use super::{context, doc, live_service, with};
use vitrine_service::{CancelSignal, Error};

fn refs(signatures: &[&str]) -> Value {
	json!(
		signatures
			.iter()
			.map(|signature| json!({ "type": "signature", "signature": signature }))
			.collect::<Vec<_>>()
	)
}

fn ids(values: &[&str]) -> Vec<String> {
	values.iter().map(|value| value.to_string()).collect()
}

fn media() -> Value {
	json!({ "images": [{ "name": "front", "uri": "mediaserver:collection/front" }] })
}

#[tokio::test]
async fn repeated_lookups_are_served_from_cache() {
	let docs = vec![doc("a", &["grpa"]), doc("b", &["grpa"])];
	let (index, service) = live_service(docs).await;
	let ctx = context(&service, "test", &["grpA"]);
	let first = service.batch_get(&ctx, &ids(&["a", "b"])).await.expect("Lookup failed.");
	let second = service.batch_get(&ctx, &ids(&["b", "a"])).await.expect("Lookup failed.");

	assert_eq!(first.len(), 2);
	assert_eq!(second.len(), 2);
	assert_eq!(index.mget_calls(), 1);

	service.batch_get(&ctx, &ids(&["a", "c"])).await.expect("Lookup failed.");

	assert_eq!(index.mget_calls(), 2);
	assert_eq!(index.mget_ids(), 3);
}

#[tokio::test]
async fn unknown_and_hidden_ids_are_skipped() {
	let hidden = (
		"hidden".to_string(),
		json!({ "signature": "hidden", "acl": { "meta": [], "content": ["global/guest"] } }),
	);
	let docs = vec![doc("a", &["grpa"]), hidden];
	let (_index, service) = live_service(docs).await;
	let ctx = context(&service, "test", &["grpA"]);
	let entries =
		service.batch_get(&ctx, &ids(&["a", "hidden", "missing"])).await.expect("Lookup failed.");

	assert_eq!(entries.iter().map(|entry| entry.id.as_str()).collect::<Vec<_>>(), vec!["a"]);
}

#[tokio::test]
async fn media_follows_content_access() {
	let docs = vec![
		with(with(doc("protected", &["grpa"]), "media", media()), "poster", json!({ "name": "p" })),
		with(
			(
				"public".to_string(),
				json!({ "signature": "public", "acl": { "meta": ["grpa"], "content": ["global/guest"] } }),
			),
			"media",
			media(),
		),
	];
	let (_index, service) = live_service(docs).await;
	let stranger = context(&service, "test", &["grpA"]);
	let entries =
		service.batch_get(&stranger, &ids(&["protected", "public"])).await.expect("Lookup failed.");
	let protected = entries.iter().find(|entry| entry.id == "protected").expect("Entry expected.");
	let public = entries.iter().find(|entry| entry.id == "public").expect("Entry expected.");

	assert!(!protected.content_access);
	assert!(protected.media_protected);
	assert!(protected.media.is_empty());
	assert!(protected.base.poster.is_none());
	assert!(!public.media_protected);
	assert_eq!(public.media.len(), 1);

	let owner = context(&service, "test", &["grpB"]);
	let entries = service.batch_get(&owner, &ids(&["protected"])).await.expect("Lookup failed.");

	assert!(entries[0].content_access);
	assert_eq!(entries[0].media[0].items[0].name, "front");
	assert!(entries[0].base.poster.is_some());
}

#[tokio::test]
async fn expansion_skips_self_and_hidden_references() {
	let docs = vec![
		with(doc("origin", &["grpa"]), "references", refs(&["origin", "a", "secret", "b", "a"])),
		doc("a", &["grpa"]),
		doc("b", &["grpa"]),
		doc("secret", &["grpx"]),
	];
	let (_index, service) = live_service(docs).await;
	let ctx = context(&service, "test", &["grpA"]);
	let origin = service.batch_get(&ctx, &ids(&["origin"])).await.expect("Lookup failed.");
	let references =
		service.expand_references(&ctx, &origin[0]).await.expect("Expansion failed.");
	let mut signatures: Vec<&str> =
		references.iter().map(|entry| entry.signature.as_str()).collect();

	signatures.sort();

	assert_eq!(signatures, vec!["a", "b"]);
}

#[tokio::test]
async fn entries_can_carry_expanded_references() {
	let docs = vec![
		with(doc("origin", &["grpa"]), "references", refs(&["a"])),
		doc("a", &["grpa"]),
	];
	let (_index, service) = live_service(docs).await;
	let ctx = context(&service, "test", &["grpA"]);
	let plain = service.entries(&ctx, &ids(&["origin"]), false).await.expect("Lookup failed.");
	let expanded = service.entries(&ctx, &ids(&["origin"]), true).await.expect("Lookup failed.");

	assert!(plain[0].references_full.is_empty());
	assert_eq!(expanded[0].references_full.len(), 1);
	assert_eq!(expanded[0].references_full[0].id, "a");
}

#[tokio::test]
async fn entry_without_references_expands_without_backend_call() {
	let (index, service) = live_service(vec![doc("a", &["grpa"])]).await;
	let ctx = context(&service, "test", &["grpA"]);
	let entries = service.batch_get(&ctx, &ids(&["a"])).await.expect("Lookup failed.");
	let references = service.expand_references(&ctx, &entries[0]).await.expect("Expansion failed.");

	assert!(references.is_empty());
	assert_eq!(index.mget_calls(), 1);
}

#[tokio::test]
async fn backend_failure_is_not_cached() {
	let (index, service) = live_service(vec![doc("a", &["grpa"])]).await;
	let ctx = context(&service, "test", &["grpA"]);

	index.fail_with(503);

	let err = service.batch_get(&ctx, &ids(&["a"])).await.expect_err("Lookup must fail.");

	assert!(matches!(err, Error::Backend { .. }), "{err:?}");

	index.recover();

	let entries = service.batch_get(&ctx, &ids(&["a"])).await.expect("Lookup failed.");

	assert_eq!(entries.len(), 1);
}

#[tokio::test]
async fn document_error_fails_the_whole_batch() {
	let (index, service) = live_service(vec![doc("a", &["grpa"]), doc("b", &["grpa"])]).await;
	let ctx = context(&service, "test", &["grpA"]);

	index.fail_documents(&["b"]);

	let err = service.batch_get(&ctx, &ids(&["a", "b"])).await.expect_err("Lookup must fail.");

	assert!(matches!(&err, Error::Backend { message, .. } if message.contains("'b'")), "{err:?}");

	index.recover();

	let entries = service.batch_get(&ctx, &ids(&["a", "b"])).await.expect("Lookup failed.");

	assert_eq!(entries.len(), 2);
	assert_eq!(index.mget_ids(), 4);
}

#[tokio::test]
async fn identity_is_required() {
	let (_index, service) = live_service(vec![doc("a", &["grpa"])]).await;
	let missing_tenant = service.context(None, Some(Vec::new()), CancelSignal::never());
	let missing_groups = service.context(Some("test"), None, CancelSignal::never());
	let unknown_tenant = service.context(Some("nobody"), Some(Vec::new()), CancelSignal::never());
	let unknown_key =
		service.context_for_api_key(Some("wrong"), Some(Vec::new()), CancelSignal::never());

	assert!(matches!(missing_tenant, Err(Error::AuthContext { .. })));
	assert!(matches!(missing_groups, Err(Error::AuthContext { .. })));
	assert!(matches!(unknown_tenant, Err(Error::Config { .. })));
	assert!(matches!(unknown_key, Err(Error::AuthContext { .. })));

	let ctx = service
		.context_for_api_key(Some("other-key"), Some(Vec::new()), CancelSignal::never())
		.expect("Known key must resolve.");

	assert_eq!(ctx.tenant().name, "other");
}
