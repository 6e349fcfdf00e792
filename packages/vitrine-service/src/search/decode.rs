//! Typed decoding of facet aggregation results.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{
	Error, Result,
	facet::{FacetPlan, TERMS_AGGREGATION},
};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Facet {
	pub name: String,
	pub values: Vec<FacetValue>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FacetValue {
	String { value: String, count: u64 },
	Int { value: i64, count: u64 },
}
impl FacetValue {
	pub fn count(&self) -> u64 {
		match self {
			Self::String { count, .. } | Self::Int { count, .. } => *count,
		}
	}
}

#[derive(Deserialize)]
struct TermsAggregate {
	buckets: Vec<TermsBucket>,
}

#[derive(Deserialize)]
struct TermsBucket {
	key: BucketKey,
	doc_count: u64,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum BucketKey {
	String(String),
	Int(i64),
}

/// Decodes one facet per planned aggregation, in plan order. Missing, unplanned or unrecognized
/// aggregations are errors.
pub fn decode_facets(plan: &FacetPlan, aggregations: &Map<String, Value>) -> Result<Vec<Facet>> {
	if let Some(name) = aggregations
		.keys()
		.find(|name| !plan.aggregations.iter().any(|aggregation| &aggregation.name == *name))
	{
		return Err(Error::Decode {
			message: format!("aggregation '{name}' was not requested."),
		});
	}

	plan.aggregations
		.iter()
		.map(|aggregation| {
			let name = aggregation.name.as_str();
			let filtered = aggregations.get(name).ok_or_else(|| Error::Decode {
				message: format!("aggregation '{name}' is missing from the response."),
			})?;
			let terms = filtered.get(TERMS_AGGREGATION).ok_or_else(|| Error::Decode {
				message: format!("aggregation '{name}' is not a filter aggregation over terms."),
			})?;
			let terms = TermsAggregate::deserialize(terms).map_err(|err| Error::Decode {
				message: format!("aggregation '{name}' has unsupported buckets: {err}"),
			})?;
			let values = terms
				.buckets
				.into_iter()
				.map(|bucket| match bucket.key {
					BucketKey::String(value) => FacetValue::String { value, count: bucket.doc_count },
					BucketKey::Int(value) => FacetValue::Int { value, count: bucket.doc_count },
				})
				.collect();

			Ok(Facet { name: name.to_string(), values })
		})
		.collect()
}
