use serde_json::{Value, json};

use super::{context, doc, live_service, with};
use vitrine_domain::{FacetRequest, FilterTerm, TermSpec};
use vitrine_service::{Error, FacetValue, SearchRequest};

fn catalog() -> Vec<(String, Value)> {
	[
		("1", "film", vec!["red"]),
		("2", "film", vec!["blue"]),
		("3", "audio", vec!["red"]),
		("4", "audio", vec!["red", "blue"]),
		("5", "text", vec![]),
	]
	.into_iter()
	.map(|(id, category, tags)| {
		with(with(doc(id, &["grpa"]), "category", json!([category])), "tags", json!(tags))
	})
	.collect()
}

fn facet(name: &str, field: &str, filter: FilterTerm) -> FacetRequest {
	FacetRequest { term: TermSpec::new(name, field), filter }
}

fn counts(values: &[FacetValue]) -> Vec<(String, u64)> {
	values
		.iter()
		.map(|value| match value {
			FacetValue::String { value, count } => (value.clone(), *count),
			FacetValue::Int { value, count } => (value.to_string(), *count),
		})
		.collect()
}

#[tokio::test]
async fn drill_down_counts_ignore_own_selection() {
	let (index, service) = live_service(catalog()).await;
	let ctx = context(&service, "test", &["grpA"]);
	let request = SearchRequest {
		facets: vec![
			facet("category", "category.keyword", FilterTerm::any_of("category.keyword", ["film"])),
			facet("tags", "tags.keyword", FilterTerm::all_of("tags.keyword", ["red"])),
		],
		..SearchRequest::default()
	};
	let result = service.search(&ctx, &request).await.expect("Search failed.");

	assert_eq!(result.total_count, 1);
	assert_eq!(result.edges[0].id, "1");
	assert_eq!(result.facets.len(), 2);
	assert_eq!(result.facets[0].name, "category");
	assert_eq!(
		counts(&result.facets[0].values),
		vec![("audio".to_string(), 2), ("film".to_string(), 1)]
	);
	assert_eq!(result.facets[1].name, "tags");
	assert_eq!(counts(&result.facets[1].values), vec![("red".to_string(), 1)]);

	let body = index.last_search_body().expect("Search body expected.");

	assert!(body.get("post_filter").is_some());
	assert_eq!(body["aggs"]["tags"]["filter"]["bool"]["filter"].as_array().map(Vec::len), Some(1));
}

#[tokio::test]
async fn include_set_reports_zero_count_values() {
	let (index, service) = live_service(catalog()).await;
	let ctx = context(&service, "test", &["grpA"]);
	let mut term = TermSpec::new("category", "category.keyword");

	term.include = ["film", "audio", "text", "video"].map(str::to_string).to_vec();

	let request = SearchRequest {
		facets: vec![FacetRequest {
			term,
			filter: FilterTerm::any_of("category.keyword", Vec::<String>::new()),
		}],
		..SearchRequest::default()
	};
	let result = service.search(&ctx, &request).await.expect("Search failed.");

	assert_eq!(result.total_count, 5);
	assert_eq!(
		counts(&result.facets[0].values),
		vec![
			("audio".to_string(), 2),
			("film".to_string(), 2),
			("text".to_string(), 1),
			("video".to_string(), 0),
		]
	);

	let body = index.last_search_body().expect("Search body expected.");
	let terms = &body["aggs"]["category"]["aggs"]["values"]["terms"];

	assert_eq!(terms["size"], json!(4));
	assert_eq!(terms["min_doc_count"], json!(0));
	assert_eq!(body["aggs"]["category"]["filter"], json!({ "match_all": {} }));
}

#[tokio::test]
async fn integer_bucket_keys_decode_as_int_values() {
	let (index, service) = live_service(catalog()).await;
	let ctx = context(&service, "test", &["grpA"]);

	index.override_aggregations(json!({
		"year": { "doc_count": 5, "values": { "buckets": [{ "key": 1999, "doc_count": 3 }] } }
	}));

	let request = SearchRequest {
		facets: vec![facet("year", "year", FilterTerm::any_of("year", Vec::<String>::new()))],
		..SearchRequest::default()
	};
	let result = service.search(&ctx, &request).await.expect("Search failed.");

	assert_eq!(result.facets[0].values, vec![FacetValue::Int { value: 1999, count: 3 }]);
}

#[tokio::test]
async fn unsupported_bucket_key_is_a_decode_error() {
	let (index, service) = live_service(catalog()).await;
	let ctx = context(&service, "test", &["grpA"]);

	index.override_aggregations(json!({
		"year": { "doc_count": 5, "values": { "buckets": [{ "key": 19.5, "doc_count": 3 }] } }
	}));

	let request = SearchRequest {
		facets: vec![facet("year", "year", FilterTerm::any_of("year", Vec::<String>::new()))],
		..SearchRequest::default()
	};
	let err = service.search(&ctx, &request).await.expect_err("Float keys must not decode.");

	assert!(matches!(err, Error::Decode { .. }), "{err:?}");
}

#[tokio::test]
async fn too_many_facets_are_rejected_before_the_backend() {
	let (index, service) = live_service(catalog()).await;
	let ctx = context(&service, "test", &["grpA"]);
	let request = SearchRequest {
		facets: (0..25)
			.map(|i| facet(&format!("facet-{i}"), "tags.keyword", FilterTerm::exists("tags")))
			.collect(),
		..SearchRequest::default()
	};
	let err = service.search(&ctx, &request).await.expect_err("Facet limit must apply.");

	assert!(matches!(err, Error::InvalidRequest { .. }), "{err:?}");
	assert_eq!(index.search_calls(), 0);
}
