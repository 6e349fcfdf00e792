use serde_json::json;

use super::{context, doc, live_service, with};
use vitrine_domain::{Cursor, FilterTerm, SortField, SortOrder};
use vitrine_service::{Error, SearchRequest, VectorSearchRequest};

#[tokio::test]
async fn first_page_reports_next_cursor() {
	let docs = (0..12).map(|i| doc(&format!("sig-{i:02}"), &["grpa"])).collect();
	let (index, service) = live_service(docs).await;
	let ctx = context(&service, "test", &["grpA"]);
	let request = SearchRequest { first: Some(0), size: Some(10), ..SearchRequest::default() };
	let result = service.search(&ctx, &request).await.expect("Search failed.");

	assert_eq!(result.total_count, 12);
	assert_eq!(result.edges.len(), 10);
	assert!(result.page_info.has_next_page);
	assert!(!result.page_info.has_previous_page);

	let end = result.page_info.end_cursor.as_deref().expect("End cursor expected.");

	assert_eq!(Cursor::decode(end).expect("Cursor must decode."), Cursor::new(9, 10));
	assert_eq!(index.search_calls(), 1);
}

#[tokio::test]
async fn cursor_drives_the_next_request() {
	let docs = (0..12).map(|i| doc(&format!("sig-{i:02}"), &["grpa"])).collect();
	let (index, service) = live_service(docs).await;
	let ctx = context(&service, "test", &["grpA"]);
	let cursor = Cursor::new(9, 10).encode().expect("Cursor must encode.");
	let request = SearchRequest {
		first: Some(0),
		size: Some(3),
		cursor: Some(cursor),
		..SearchRequest::default()
	};
	let result = service.search(&ctx, &request).await.expect("Search failed.");
	let body = index.last_search_body().expect("Search body expected.");

	assert_eq!((body["from"].clone(), body["size"].clone()), (json!(9), json!(10)));
	assert_eq!(result.edges.len(), 3);
	assert!(!result.page_info.has_next_page);
	assert!(result.page_info.has_previous_page);

	let start = result.page_info.start_cursor.as_deref().expect("Start cursor expected.");

	assert_eq!(Cursor::decode(start).expect("Cursor must decode."), Cursor::new(-1, 10));
}

#[tokio::test]
async fn acl_clause_isolates_tenants() {
	let docs = vec![doc("a", &["grpa"]), doc("b", &["grpb"]), doc("c", &["grpa", "grpb"])];
	let (index, service) = live_service(docs).await;
	let ctx = context(&service, "test", &[]);
	let result = service.search(&ctx, &SearchRequest::default()).await.expect("Search failed.");
	let ids: Vec<&str> = result.edges.iter().map(|entry| entry.id.as_str()).collect();

	assert_eq!(ids, vec!["a", "c"]);

	let body = index.last_search_body().expect("Search body expected.");
	let filter = &body["query"]["boosting"]["positive"]["bool"]["filter"];

	assert_eq!(
		filter[0],
		json!({ "bool": { "should": [{ "term": { "acl.meta.keyword": { "value": "grpa" } } }], "minimum_should_match": 1 } })
	);
}

#[tokio::test]
async fn caller_groups_widen_the_acl_clause() {
	let docs = vec![doc("a", &["grpa"]), doc("b", &["grpb"]), doc("x", &["grpx"])];
	let (_index, service) = live_service(docs).await;
	let ctx = context(&service, "test", &["GRPB"]);
	let result = service.search(&ctx, &SearchRequest::default()).await.expect("Search failed.");

	assert_eq!(result.total_count, 2);
}

#[tokio::test]
async fn text_query_and_filters_narrow_results() {
	let docs = vec![
		with(doc("a", &["grpa"]), "category", json!(["film"])),
		with(doc("b", &["grpa"]), "category", json!(["audio"])),
		with(
			with(doc("c", &["grpa"]), "category", json!(["film"])),
			"series",
			json!("Harbour views"),
		),
	];
	let (_index, service) = live_service(docs).await;
	let ctx = context(&service, "test", &["grpA"]);
	let filtered = SearchRequest {
		filters: vec![FilterTerm::all_of("category.keyword", ["film"])],
		..SearchRequest::default()
	};
	let result = service.search(&ctx, &filtered).await.expect("Search failed.");

	assert_eq!(result.total_count, 2);

	let text = SearchRequest { query: "harbour".to_string(), ..filtered };
	let result = service.search(&ctx, &text).await.expect("Search failed.");

	assert_eq!(result.edges.len(), 1);
	assert_eq!(result.edges[0].id, "c");
}

#[tokio::test]
async fn nested_reference_filters_scope_to_one_reference() {
	let refs = |signatures: &[&str]| {
		json!(
			signatures
				.iter()
				.map(|signature| json!({ "type": "signature", "signature": signature }))
				.collect::<Vec<_>>()
		)
	};
	let docs = vec![
		with(doc("both", &["grpa"]), "references", refs(&["a", "b"])),
		with(doc("only-a", &["grpa"]), "references", refs(&["a"])),
		with(doc("none", &["grpa"]), "references", refs(&["z"])),
	];
	let (_index, service) = live_service(docs).await;
	let ctx = context(&service, "test", &["grpA"]);
	let all = SearchRequest {
		filters: vec![FilterTerm::all_of("[references].signature", ["a", "b"])],
		..SearchRequest::default()
	};
	let any = SearchRequest {
		filters: vec![FilterTerm::any_of("[references].signature", ["a", "b"])],
		..SearchRequest::default()
	};
	let all = service.search(&ctx, &all).await.expect("Search failed.");
	let any = service.search(&ctx, &any).await.expect("Search failed.");

	assert_eq!(all.edges.iter().map(|entry| entry.id.as_str()).collect::<Vec<_>>(), vec!["both"]);
	assert_eq!(any.total_count, 2);
}

#[tokio::test]
async fn vector_clause_skips_documents_without_embedding() {
	let docs = (0..10)
		.map(|i| {
			let entry = doc(&format!("sig-{i}"), &["grpa"]);

			if i < 3 { entry } else { with(entry, "content_vector", json!([1.0, i as f64 / 10.0])) }
		})
		.collect();
	let (index, service) = live_service(docs).await;
	let ctx = context(&service, "test", &["grpA"]);
	let request = VectorSearchRequest { filters: Vec::new(), vector: vec![1.0, 0.0], size: Some(10) };
	let result = service.vector_search(&ctx, &request).await.expect("Vector search failed.");

	assert_eq!(result.total_count, 7);
	assert_eq!(result.edges.len(), 7);
	assert!(result.edges.iter().all(|entry| !["sig-0", "sig-1", "sig-2"].contains(&entry.id.as_str())));

	let body = index.last_search_body().expect("Search body expected.");

	assert_eq!(body["_source"]["excludes"], json!(["title_vector", "content_vector"]));
	assert!(body.get("aggs").is_none());
}

#[tokio::test]
async fn documents_without_poster_rank_lower() {
	let docs = vec![
		with(doc("plain", &["grpa"]), "series", json!("harbour")),
		with(
			with(doc("illustrated", &["grpa"]), "series", json!("harbour")),
			"poster",
			json!({ "name": "cover", "uri": "mediaserver:cover" }),
		),
	];
	let (_index, service) = live_service(docs).await;
	let ctx = context(&service, "test", &["grpA"]);
	let request = SearchRequest { query: "harbour".to_string(), ..SearchRequest::default() };
	let result = service.search(&ctx, &request).await.expect("Search failed.");
	let ids: Vec<&str> = result.edges.iter().map(|entry| entry.id.as_str()).collect();

	assert_eq!(ids, vec!["illustrated", "plain"]);
}

#[tokio::test]
async fn sort_is_forwarded_and_validated() {
	let docs = vec![
		with(doc("old", &["grpa"]), "date", json!("1901")),
		with(doc("new", &["grpa"]), "date", json!("1999")),
	];
	let (index, service) = live_service(docs).await;
	let ctx = context(&service, "test", &["grpA"]);
	let request = SearchRequest {
		sort: vec![SortField { field: "date".to_string(), order: SortOrder::Desc }],
		..SearchRequest::default()
	};
	let result = service.search(&ctx, &request).await.expect("Search failed.");

	assert_eq!(result.edges[0].id, "new");

	let invalid = SearchRequest {
		sort: vec![SortField { field: "date desc".to_string(), order: SortOrder::Asc }],
		..SearchRequest::default()
	};
	let err = service.search(&ctx, &invalid).await.expect_err("Invalid sort must fail.");

	assert!(matches!(err, Error::FilterCompile { .. }));
	assert_eq!(index.search_calls(), 1);
}

#[tokio::test]
async fn backend_failure_surfaces_as_backend_error() {
	let (index, service) = live_service(vec![doc("a", &["grpa"])]).await;
	let ctx = context(&service, "test", &["grpA"]);

	index.fail_with(503);

	let err = service.search(&ctx, &SearchRequest::default()).await.expect_err("Search must fail.");

	assert!(matches!(err, Error::Backend { ref operation, .. } if operation == "search"), "{err:?}");
}
