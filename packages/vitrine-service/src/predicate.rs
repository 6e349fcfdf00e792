//! Backend predicate tree and its JSON query form.

use serde_json::{Map, Value, json};

#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
	MatchAll,
	Exists { field: String },
	Term { field: String, value: String },
	Terms { field: String, values: Vec<String> },
	Nested { path: String, query: Box<Predicate> },
	Bool(BoolQuery),
	SimpleQueryString { query: String },
	/// Cosine similarity against `field`, scored only for documents that carry the field.
	CosineScore { field: String, vector: Vec<f32> },
	Boosting { positive: Box<Predicate>, negative: Box<Predicate>, negative_boost: f32 },
}
impl Predicate {
	/// Every predicate must match.
	pub fn all(must: Vec<Predicate>) -> Self {
		Self::Bool(BoolQuery { must, ..BoolQuery::default() })
	}

	/// At least one predicate must match.
	pub fn any(should: Vec<Predicate>) -> Self {
		Self::Bool(BoolQuery { should, minimum_should_match: Some(1), ..BoolQuery::default() })
	}

	/// Non-scoring conjunction, or `match_all` when `filter` is empty.
	pub fn filter_all(filter: Vec<Predicate>) -> Self {
		if filter.is_empty() {
			return Self::MatchAll;
		}

		Self::Bool(BoolQuery { filter, ..BoolQuery::default() })
	}

	pub fn to_value(&self) -> Value {
		match self {
			Self::MatchAll => json!({ "match_all": {} }),
			Self::Exists { field } => json!({ "exists": { "field": field } }),
			Self::Term { field, value } => json!({ "term": { field: { "value": value } } }),
			Self::Terms { field, values } => json!({ "terms": { field: values } }),
			Self::Nested { path, query } => {
				json!({ "nested": { "path": path, "query": query.to_value() } })
			},
			Self::Bool(query) => query.to_value(),
			Self::SimpleQueryString { query } => json!({ "simple_query_string": { "query": query } }),
			Self::CosineScore { field, vector } => json!({
				"script_score": {
					"query": { "exists": { "field": field } },
					"script": {
						"source": format!("cosineSimilarity(params.query_vector, '{field}') + 1.0"),
						"params": { "query_vector": vector },
					},
				}
			}),
			Self::Boosting { positive, negative, negative_boost } => json!({
				"boosting": {
					"positive": positive.to_value(),
					"negative": negative.to_value(),
					"negative_boost": negative_boost,
				}
			}),
		}
	}
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct BoolQuery {
	pub must: Vec<Predicate>,
	pub should: Vec<Predicate>,
	pub filter: Vec<Predicate>,
	pub must_not: Vec<Predicate>,
	pub minimum_should_match: Option<u32>,
}
impl BoolQuery {
	pub fn to_value(&self) -> Value {
		let mut body = Map::new();

		for (key, clauses) in [
			("must", &self.must),
			("should", &self.should),
			("filter", &self.filter),
			("must_not", &self.must_not),
		] {
			if !clauses.is_empty() {
				body.insert(key.to_string(), clauses.iter().map(Predicate::to_value).collect());
			}
		}

		if let Some(minimum) = self.minimum_should_match {
			body.insert("minimum_should_match".to_string(), json!(minimum));
		}

		json!({ "bool": body })
	}
}
