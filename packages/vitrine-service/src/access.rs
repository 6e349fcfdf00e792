//! Mandatory isolation predicates derived from tenant policy and caller groups.

use crate::predicate::Predicate;
use vitrine_config::Tenant;
use vitrine_domain::effective_groups;

/// Isolation clauses for one request. Both clauses are AND-ed into every query.
#[derive(Debug, Clone, PartialEq)]
pub struct AccessFilter {
	/// Tenant base filter, absent when the tenant configures no AND-groups.
	pub base: Option<Predicate>,
	/// Meta-scope ACL match, absent when the effective group set is empty.
	pub acl: Option<Predicate>,
	pub groups: Vec<String>,
}
impl AccessFilter {
	pub fn into_predicates(self) -> Vec<Predicate> {
		self.base.into_iter().chain(self.acl).collect()
	}
}

pub struct AccessFilterBuilder<'a> {
	acl_field: &'a str,
}
impl<'a> AccessFilterBuilder<'a> {
	pub fn new(acl_field: &'a str) -> Self {
		Self { acl_field }
	}

	pub fn build(&self, tenant: &Tenant, caller_groups: &[String]) -> AccessFilter {
		let groups = effective_groups(&tenant.groups, caller_groups);
		let acl = (!groups.is_empty()).then(|| {
			Predicate::any(
				groups
					.iter()
					.map(|group| Predicate::Term {
						field: self.acl_field.to_string(),
						value: group.clone(),
					})
					.collect(),
			)
		});

		AccessFilter { base: base_filter(tenant), acl, groups }
	}
}

fn base_filter(tenant: &Tenant) -> Option<Predicate> {
	if tenant.and.is_empty() {
		return None;
	}

	let groups = tenant
		.and
		.iter()
		.map(|group| {
			Predicate::any(
				group
					.or
					.iter()
					.filter(|clause| !clause.field.is_empty())
					.map(|clause| Predicate::Terms {
						field: clause.field.clone(),
						values: clause.values.clone(),
					})
					.collect(),
			)
		})
		.collect();

	Some(Predicate::all(groups))
}

#[cfg(test)]
mod tests {
	use super::*;
	use vitrine_config::{BaseFilterClause, BaseFilterGroup};

	fn tenant(groups: &[&str], and: Vec<BaseFilterGroup>) -> Tenant {
		Tenant {
			name: "test".to_string(),
			api_key: "key".to_string(),
			jwt_secret: String::new(),
			jwt_max_age_secs: 3_600,
			groups: groups.iter().map(|group| group.to_string()).collect(),
			and,
		}
	}

	fn acl_values(filter: &AccessFilter) -> Vec<String> {
		match &filter.acl {
			Some(Predicate::Bool(query)) => {
				assert_eq!(query.minimum_should_match, Some(1));

				query
					.should
					.iter()
					.map(|clause| match clause {
						Predicate::Term { field, value } => {
							assert_eq!(field, "acl.meta.keyword");

							value.clone()
						},
						other => panic!("unexpected clause {other:?}"),
					})
					.collect()
			},
			other => panic!("unexpected ACL clause {other:?}"),
		}
	}

	#[test]
	fn acl_clause_is_the_normalized_union() {
		let builder = AccessFilterBuilder::new("acl.meta.keyword");
		let filter =
			builder.build(&tenant(&["grpA", "Shared"], Vec::new()), &["shared".to_string(), "GRPb".to_string()]);

		assert_eq!(acl_values(&filter), vec!["grpa", "grpb", "shared"]);
		assert_eq!(filter.groups, vec!["grpa", "grpb", "shared"]);
		assert!(filter.base.is_none());
	}

	#[test]
	fn acl_clause_is_omitted_without_groups() {
		let builder = AccessFilterBuilder::new("acl.meta.keyword");
		let filter = builder.build(&tenant(&[], Vec::new()), &[" ".to_string()]);

		assert!(filter.acl.is_none());
		assert!(filter.into_predicates().is_empty());
	}

	#[test]
	fn base_filter_is_and_of_or_groups() {
		let and = vec![
			BaseFilterGroup {
				or: vec![
					BaseFilterClause { field: "catalog.keyword".to_string(), values: vec!["mediathek".to_string()] },
					BaseFilterClause { field: "category.keyword".to_string(), values: vec!["film".to_string(), "audio".to_string()] },
				],
			},
			BaseFilterGroup {
				or: vec![BaseFilterClause { field: "public".to_string(), values: vec!["true".to_string()] }],
			},
		];
		let filter = AccessFilterBuilder::new("acl.meta.keyword").build(&tenant(&["grpA"], and), &[]);
		let Some(Predicate::Bool(base)) = &filter.base else {
			panic!("base filter missing");
		};

		assert_eq!(base.must.len(), 2);

		let Predicate::Bool(first) = &base.must[0] else {
			panic!("group must be a bool query");
		};

		assert_eq!(first.minimum_should_match, Some(1));
		assert_eq!(first.should[1], Predicate::Terms {
			field: "category.keyword".to_string(),
			values: vec!["film".to_string(), "audio".to_string()],
		});
		assert_eq!(filter.into_predicates().len(), 2);
	}
}
