//! Evaluates the subset of the index query language the gateway emits against in-memory documents.

use std::{
	cmp::Ordering,
	collections::{BTreeMap, BTreeSet},
};

use serde_json::{Map, Value, json};

pub(crate) type EvalResult<T> = std::result::Result<T, String>;

/// Score of `doc` under `query`, or `None` when the document does not match.
pub(crate) fn score(query: &Value, doc: &Value) -> EvalResult<Option<f64>> {
	let (kind, body) = single_entry(query)?;

	match kind {
		"match_all" => Ok(Some(1.0)),
		"exists" => {
			let field = str_field(body, "field")?;

			Ok(values_at(doc, field).iter().any(|value| !value.is_null()).then_some(1.0))
		},
		"term" => {
			let (field, expected) = single_entry(body)?;
			let expected = expected.get("value").unwrap_or(expected);

			Ok(values_at(doc, field).iter().any(|value| same(value, expected)).then_some(1.0))
		},
		"terms" => {
			let (field, expected) = single_entry(body)?;
			let expected =
				expected.as_array().ok_or_else(|| format!("[terms] on {field} needs an array"))?;
			let values = values_at(doc, field);

			Ok(values
				.iter()
				.any(|value| expected.iter().any(|candidate| same(value, candidate)))
				.then_some(1.0))
		},
		"nested" => nested(body, doc),
		"bool" => boolean(body, doc),
		"simple_query_string" => simple_query_string(body, doc),
		"script_score" => script_score(body, doc),
		"boosting" => boosting(body, doc),
		other => Err(format!("unknown query [{other}]")),
	}
}

pub(crate) fn matches(query: &Value, doc: &Value) -> EvalResult<bool> {
	Ok(score(query, doc)?.is_some())
}

/// Runs an aggregation tree over `docs`. Supports `filter` buckets and `terms` leaves.
pub(crate) fn aggregate(aggs: &Map<String, Value>, docs: &[&Value]) -> EvalResult<Map<String, Value>> {
	let mut out = Map::new();

	for (name, spec) in aggs {
		let result = if let Some(filter) = spec.get("filter") {
			let mut subset = Vec::new();

			for doc in docs {
				if matches(filter, doc)? {
					subset.push(*doc);
				}
			}

			let mut bucket = Map::new();

			bucket.insert("doc_count".to_string(), json!(subset.len()));

			if let Some(children) = sub_aggregations(spec) {
				bucket.extend(aggregate(children, &subset)?);
			}

			Value::Object(bucket)
		} else if let Some(terms) = spec.get("terms") {
			terms_buckets(terms, docs)?
		} else {
			return Err(format!("aggregation [{name}] has an unsupported type"));
		};

		out.insert(name.clone(), result);
	}

	Ok(out)
}

pub(crate) fn sub_aggregations(spec: &Value) -> Option<&Map<String, Value>> {
	spec.get("aggs").or_else(|| spec.get("aggregations")).and_then(Value::as_object)
}

/// All values reachable at a dotted `path`, flattening arrays along the way.
/// A trailing `.keyword` addresses the raw field.
pub(crate) fn values_at<'a>(doc: &'a Value, path: &str) -> Vec<&'a Value> {
	let path = path.strip_suffix(".keyword").unwrap_or(path);
	let mut current = vec![doc];

	for segment in path.split('.') {
		current = flatten(current).into_iter().filter_map(|value| value.get(segment)).collect();
	}

	flatten(current)
}

pub(crate) fn compare_values(left: Option<&Value>, right: Option<&Value>) -> Ordering {
	match (left, right) {
		(Some(Value::Number(a)), Some(Value::Number(b))) => a
			.as_f64()
			.unwrap_or_default()
			.partial_cmp(&b.as_f64().unwrap_or_default())
			.unwrap_or(Ordering::Equal),
		(Some(a), Some(b)) => key_string(a).cmp(&key_string(b)),
		(Some(_), None) => Ordering::Less,
		(None, Some(_)) => Ordering::Greater,
		(None, None) => Ordering::Equal,
	}
}

fn flatten(values: Vec<&Value>) -> Vec<&Value> {
	values
		.into_iter()
		.flat_map(|value| match value {
			Value::Array(items) => items.iter().collect::<Vec<_>>(),
			other => vec![other],
		})
		.collect()
}

fn single_entry(value: &Value) -> EvalResult<(&str, &Value)> {
	let object = value.as_object().ok_or_else(|| "query must be an object".to_string())?;
	let mut entries = object.iter();

	match (entries.next(), entries.next()) {
		(Some((key, body)), None) => Ok((key.as_str(), body)),
		_ => Err("query object must have exactly one key".to_string()),
	}
}

fn str_field<'a>(body: &'a Value, key: &str) -> EvalResult<&'a str> {
	body.get(key).and_then(Value::as_str).ok_or_else(|| format!("missing string [{key}]"))
}

fn clauses<'a>(body: &'a Value, key: &str) -> Vec<&'a Value> {
	match body.get(key) {
		Some(Value::Array(items)) => items.iter().collect(),
		Some(single @ Value::Object(_)) => vec![single],
		_ => Vec::new(),
	}
}

fn same(actual: &Value, expected: &Value) -> bool {
	match (actual, expected) {
		(Value::String(a), Value::String(b)) => a == b,
		(Value::Number(a), Value::Number(b)) => a.as_f64() == b.as_f64(),
		(Value::String(a), other) | (other, Value::String(a)) => *a == other.to_string(),
		(a, b) => a == b,
	}
}

fn key_string(value: &Value) -> String {
	match value {
		Value::String(text) => text.clone(),
		other => other.to_string(),
	}
}

fn nested(body: &Value, doc: &Value) -> EvalResult<Option<f64>> {
	let path = str_field(body, "path")?;
	let inner = body.get("query").ok_or_else(|| "[nested] needs a query".to_string())?;
	let mut best: Option<f64> = None;

	for element in values_at(doc, path) {
		let mut wrapped = element.clone();

		for segment in path.rsplit('.') {
			let mut parent = Map::new();

			parent.insert(segment.to_string(), wrapped);

			wrapped = Value::Object(parent);
		}

		if let Some(found) = score(inner, &wrapped)? {
			best = Some(best.map_or(found, |current| current.max(found)));
		}
	}

	Ok(best)
}

fn boolean(body: &Value, doc: &Value) -> EvalResult<Option<f64>> {
	let must = clauses(body, "must");
	let filter = clauses(body, "filter");
	let should = clauses(body, "should");
	let mut total = 0.0;

	for clause in &must {
		match score(clause, doc)? {
			Some(found) => total += found,
			None => return Ok(None),
		}
	}
	for clause in &filter {
		if !matches(clause, doc)? {
			return Ok(None);
		}
	}
	for clause in clauses(body, "must_not") {
		if matches(clause, doc)? {
			return Ok(None);
		}
	}

	let default_minimum = usize::from(must.is_empty() && filter.is_empty() && !should.is_empty());
	let minimum = match body.get("minimum_should_match") {
		None => default_minimum,
		Some(Value::Number(number)) => number.as_u64().unwrap_or_default() as usize,
		Some(Value::String(text)) => text
			.parse()
			.map_err(|_| format!("unsupported minimum_should_match [{text}]"))?,
		Some(other) => return Err(format!("unsupported minimum_should_match [{other}]")),
	};
	let mut matched = 0;

	for clause in &should {
		if let Some(found) = score(clause, doc)? {
			matched += 1;
			total += found;
		}
	}

	if matched < minimum {
		return Ok(None);
	}

	Ok(Some(total))
}

fn simple_query_string(body: &Value, doc: &Value) -> EvalResult<Option<f64>> {
	let query = str_field(body, "query")?.to_lowercase();
	let mut texts = Vec::new();

	collect_strings(doc, &mut texts);

	let hits = query
		.split_whitespace()
		.filter(|token| texts.iter().any(|text| text.contains(token)))
		.count();

	Ok((hits > 0).then_some(hits as f64))
}

fn collect_strings(value: &Value, out: &mut Vec<String>) {
	match value {
		Value::String(text) => out.push(text.to_lowercase()),
		Value::Array(items) => items.iter().for_each(|item| collect_strings(item, out)),
		Value::Object(map) => map.values().for_each(|item| collect_strings(item, out)),
		_ => {},
	}
}

fn script_score(body: &Value, doc: &Value) -> EvalResult<Option<f64>> {
	let inner = body.get("query").ok_or_else(|| "[script_score] needs a query".to_string())?;

	if !matches(inner, doc)? {
		return Ok(None);
	}

	let script = body.get("script").ok_or_else(|| "[script_score] needs a script".to_string())?;
	let source = str_field(script, "source")?;
	let field = source
		.split('\'')
		.nth(1)
		.ok_or_else(|| format!("script [{source}] does not name a vector field"))?;
	let query_vector = numbers(script.pointer("/params/query_vector"));
	let stored = numbers(doc.get(field));

	if stored.is_empty() {
		return Err(format!("runtime error: document has no value for [{field}]"));
	}
	if stored.len() != query_vector.len() {
		return Err(format!(
			"runtime error: vector dims differ: {} vs {}",
			stored.len(),
			query_vector.len()
		));
	}

	Ok(Some(cosine(&query_vector, &stored) + 1.0))
}

fn numbers(value: Option<&Value>) -> Vec<f64> {
	value
		.and_then(Value::as_array)
		.map(|items| items.iter().filter_map(Value::as_f64).collect())
		.unwrap_or_default()
}

fn cosine(a: &[f64], b: &[f64]) -> f64 {
	let dot: f64 = a.iter().zip(b).map(|(x, y)| x * y).sum();
	let norm_a = a.iter().map(|x| x * x).sum::<f64>().sqrt();
	let norm_b = b.iter().map(|x| x * x).sum::<f64>().sqrt();

	if norm_a == 0.0 || norm_b == 0.0 { 0.0 } else { dot / (norm_a * norm_b) }
}

fn boosting(body: &Value, doc: &Value) -> EvalResult<Option<f64>> {
	let positive = body.get("positive").ok_or_else(|| "[boosting] needs positive".to_string())?;
	let negative = body.get("negative").ok_or_else(|| "[boosting] needs negative".to_string())?;
	let negative_boost = body.get("negative_boost").and_then(Value::as_f64).unwrap_or(1.0);
	let Some(found) = score(positive, doc)? else {
		return Ok(None);
	};

	if matches(negative, doc)? { Ok(Some(found * negative_boost)) } else { Ok(Some(found)) }
}

fn terms_buckets(terms: &Value, docs: &[&Value]) -> EvalResult<Value> {
	let field = str_field(terms, "field")?;
	let size = terms.get("size").and_then(Value::as_u64).unwrap_or(10) as usize;
	let min_doc_count = terms.get("min_doc_count").and_then(Value::as_u64).unwrap_or(1) as usize;
	let include: Option<BTreeSet<String>> = match terms.get("include") {
		None => None,
		Some(Value::String(single)) => Some(BTreeSet::from([single.clone()])),
		Some(Value::Array(items)) => Some(items.iter().map(key_string).collect()),
		Some(other) => return Err(format!("unsupported include [{other}]")),
	};
	let mut counts: BTreeMap<String, (Value, usize)> = BTreeMap::new();

	for doc in docs {
		let mut seen = BTreeSet::new();

		for value in values_at(doc, field) {
			let key = key_string(value);

			if value.is_null() || !seen.insert(key.clone()) {
				continue;
			}

			counts.entry(key).or_insert_with(|| (value.clone(), 0)).1 += 1;
		}
	}

	if min_doc_count == 0
		&& let Some(include) = &include
	{
		for key in include {
			counts.entry(key.clone()).or_insert_with(|| (Value::String(key.clone()), 0));
		}
	}

	let mut buckets: Vec<(String, Value, usize)> = counts
		.into_iter()
		.filter(|(key, _)| include.as_ref().is_none_or(|include| include.contains(key)))
		.filter(|(_, (_, count))| *count >= min_doc_count)
		.map(|(key, (value, count))| (key, value, count))
		.collect();

	buckets.sort_by(|a, b| b.2.cmp(&a.2).then_with(|| a.0.cmp(&b.0)));

	let other: usize = buckets.iter().skip(size).map(|bucket| bucket.2).sum();
	let buckets: Vec<Value> = buckets
		.into_iter()
		.take(size)
		.map(|(_, key, count)| json!({ "key": key, "doc_count": count }))
		.collect();

	Ok(json!({
		"doc_count_error_upper_bound": 0,
		"sum_other_doc_count": other,
		"buckets": buckets,
	}))
}
