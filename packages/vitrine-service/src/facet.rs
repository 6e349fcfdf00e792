//! Aggregation planning with drill-down scoping and pre/post filter placement.

use std::collections::HashSet;

use serde_json::{Map, Value, json};

use crate::{Error, Result, filter, predicate::Predicate};
use vitrine_domain::{CombineMode, FacetRequest, FilterTerm};

/// Name of the terms aggregation nested inside every facet's filter aggregation.
pub const TERMS_AGGREGATION: &str = "values";

/// Where a facet's own filter applies to the result set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
	/// Narrows the hits and the drill-down baseline of every other facet.
	Pre,
	/// Narrows only the returned hits, after aggregations are computed.
	Post,
}
impl Placement {
	pub fn of(term: &FilterTerm) -> Self {
		match term {
			FilterTerm::Exists { .. } | FilterTerm::BoolTerm { mode: CombineMode::And, .. } => {
				Self::Pre
			},
			FilterTerm::BoolTerm { mode: CombineMode::Or, .. } => Self::Post,
		}
	}
}

#[derive(Debug, Clone, PartialEq)]
pub enum Include {
	All,
	/// One pinned value restricts the aggregation to that value.
	Single(String),
	/// Every listed value is reported, zero counts included.
	Set(Vec<String>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct AggregationPlan {
	pub name: String,
	pub field: String,
	pub size: i64,
	pub min_doc_count: i64,
	pub include: Include,
	/// Compiled filters of every other facet. Never contains this facet's own filter.
	pub scope: Vec<Predicate>,
}
impl AggregationPlan {
	pub fn to_value(&self) -> Value {
		let mut terms = Map::new();

		terms.insert("field".to_string(), json!(self.field));
		terms.insert("size".to_string(), json!(self.size));
		terms.insert("min_doc_count".to_string(), json!(self.min_doc_count));

		match &self.include {
			Include::All => {},
			Include::Single(value) => {
				terms.insert("include".to_string(), json!(value));
			},
			Include::Set(values) => {
				terms.insert("include".to_string(), json!(values));
			},
		}

		json!({
			"filter": Predicate::filter_all(self.scope.clone()).to_value(),
			"aggs": { TERMS_AGGREGATION: { "terms": terms } },
		})
	}
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FacetPlan {
	pub aggregations: Vec<AggregationPlan>,
	pub pre_filters: Vec<Predicate>,
	pub post_filters: Vec<Predicate>,
}
impl FacetPlan {
	pub fn aggregations_value(&self) -> Option<Value> {
		if self.aggregations.is_empty() {
			return None;
		}

		let aggs: Map<String, Value> = self
			.aggregations
			.iter()
			.map(|aggregation| (aggregation.name.clone(), aggregation.to_value()))
			.collect();

		Some(Value::Object(aggs))
	}

	pub fn post_filter_value(&self) -> Option<Value> {
		if self.post_filters.is_empty() {
			return None;
		}

		Some(Predicate::filter_all(self.post_filters.clone()).to_value())
	}
}

pub struct FacetPlanner {
	max_facets: usize,
}
impl FacetPlanner {
	pub fn new(max_facets: usize) -> Self {
		Self { max_facets }
	}

	/// Plans every facet. Work is quadratic in the facet count, which `max_facets` bounds.
	pub fn plan(&self, facets: &[FacetRequest]) -> Result<FacetPlan> {
		if facets.len() > self.max_facets {
			return Err(Error::InvalidRequest {
				message: format!(
					"at most {} facets may be requested, got {}.",
					self.max_facets,
					facets.len()
				),
			});
		}

		let mut names = HashSet::with_capacity(facets.len());

		for facet in facets {
			validate_facet(facet)?;

			if !names.insert(facet.name()) {
				return Err(Error::InvalidRequest {
					message: format!("facet name '{}' is used more than once.", facet.name()),
				});
			}
		}

		let compiled = facets
			.iter()
			.map(|facet| filter::compile(&facet.filter))
			.collect::<Result<Vec<_>>>()?;
		let mut plan = FacetPlan::default();

		for (index, facet) in facets.iter().enumerate() {
			if let Some(predicate) = &compiled[index] {
				match Placement::of(&facet.filter) {
					Placement::Pre => plan.pre_filters.push(predicate.clone()),
					Placement::Post => plan.post_filters.push(predicate.clone()),
				}
			}

			let scope = compiled
				.iter()
				.enumerate()
				.filter(|(other, _)| *other != index)
				.filter_map(|(_, predicate)| predicate.clone())
				.collect();
			let term = &facet.term;
			let (include, size, min_doc_count) = match term.include.as_slice() {
				[] => (Include::All, term.size, term.min_doc_count),
				[single] => (Include::Single(single.clone()), term.size, term.min_doc_count),
				values => (Include::Set(values.to_vec()), values.len() as i64, 0),
			};

			plan.aggregations.push(AggregationPlan {
				name: term.name.clone(),
				field: term.field.clone(),
				size,
				min_doc_count,
				include,
				scope,
			});
		}

		Ok(plan)
	}
}

fn validate_facet(facet: &FacetRequest) -> Result<()> {
	let term = &facet.term;

	if term.name.trim().is_empty() {
		return Err(Error::InvalidRequest { message: "facet name must be non-empty.".to_string() });
	}
	if term.field.trim().is_empty() {
		return Err(Error::InvalidRequest {
			message: format!("facet '{}' must name a field.", term.name),
		});
	}
	if term.size <= 0 {
		return Err(Error::InvalidRequest {
			message: format!("facet '{}' size must be greater than zero.", term.name),
		});
	}
	if term.min_doc_count < 0 {
		return Err(Error::InvalidRequest {
			message: format!("facet '{}' min_doc_count must not be negative.", term.name),
		});
	}

	Ok(())
}
