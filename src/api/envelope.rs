//! Response-shape normalisation.
//!
//! The backend wraps payloads inconsistently: a bare value, `{data: ...}`,
//! or a resource-named key such as `{scenarios: [...]}`. Call sites describe
//! the shapes they accept as an ordered [`Normalizer`] instead of probing
//! fields inline.

use serde_json::Value;

/// One way a payload may be wrapped.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Shape {
	/// The payload itself.
	Bare,
	/// `{ "data": payload }`
	Data,
	/// `{ "<key>": payload }`
	Named(String),
	/// `{ "data": { "<key>": payload } }`
	DataNamed(String),
}

impl Shape {
	fn unwrap<'a>(&self, value: &'a Value) -> Option<&'a Value> {
		match self {
			Shape::Bare => Some(value),
			Shape::Data => value.get("data"),
			Shape::Named(key) => value.get(key.as_str()),
			Shape::DataNamed(key) => value.get("data").and_then(|d| d.get(key.as_str())),
		}
	}
}

/// Ordered list of shapes, tried first to last.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Normalizer {
	shapes: Vec<Shape>,
}

impl Normalizer {
	pub fn new(shapes: Vec<Shape>) -> Self {
		Self { shapes }
	}

	/// Shapes for a single record of a resource whose singular key is `singular`
	/// and plural key is `plural`.
	pub fn for_record(singular: &str, plural: &str) -> Self {
		Self::new(vec![
			Shape::DataNamed(singular.into()),
			Shape::Named(singular.into()),
			Shape::Data,
			Shape::Named(plural.into()),
			Shape::Bare,
		])
	}

	/// Shapes for a list of resources keyed by `plural` (and any extra aliases).
	pub fn for_list(plural: &[&str]) -> Self {
		let mut shapes = vec![Shape::Bare, Shape::Data];
		shapes.extend(plural.iter().map(|key| Shape::Named((*key).into())));
		shapes.extend(plural.iter().map(|key| Shape::DataNamed((*key).into())));
		Self::new(shapes)
	}

	/// Adds a shape with the lowest priority.
	pub fn push(mut self, shape: Shape) -> Self {
		self.shapes.push(shape);
		self
	}

	/// First result `pick` returns for any unwrapped payload.
	pub fn find<'a, R>(&self, value: &'a Value, mut pick: impl FnMut(&'a Value) -> Option<R>) -> Option<R> {
		self.shapes
			.iter()
			.find_map(|shape| shape.unwrap(value).and_then(&mut pick))
	}

	/// First array any shape yields.
	pub fn list(&self, value: &Value) -> Option<Vec<Value>> {
		self.shapes.iter().find_map(|shape| match shape.unwrap(value) {
			Some(Value::Array(items)) => Some(items.clone()),
			_ => None,
		})
	}

	/// Like [`Normalizer::list`], but an unrecognised payload yields an empty list.
	pub fn list_or_empty(&self, value: &Value) -> Vec<Value> {
		self.list(value).unwrap_or_else(|| {
			log::debug!("no list shape matched, treating response as empty");
			Vec::new()
		})
	}

	/// First object carrying an id that any shape yields.
	///
	/// A shape that yields an array contributes its first element.
	pub fn record(&self, value: &Value) -> Option<Value> {
		self.shapes.iter().find_map(|shape| {
			let candidate = match shape.unwrap(value)? {
				Value::Array(items) => items.first()?,
				other => other,
			};
			record_id(candidate).map(|_| candidate.clone())
		})
	}
}

/// Canonical id of a record: `id`, then `_id`, then `{_id: {$oid}}`.
///
/// Numeric ids are rendered as strings.
pub fn record_id(value: &Value) -> Option<String> {
	let object = value.as_object()?;
	["id", "_id"].iter().find_map(|key| match object.get(*key)? {
		Value::String(s) if !is_blank_id(s) => Some(s.clone()),
		Value::Number(n) => Some(n.to_string()),
		Value::Object(inner) => inner.get("$oid")?.as_str().map(str::to_string),
		_ => None,
	})
}

/// Ids the old client produced by stringifying missing values.
pub fn is_blank_id(id: &str) -> bool {
	let id = id.trim();
	id.is_empty() || id == "undefined" || id == "null"
}

#[cfg(test)]
mod tests {
	use serde_json::json;

	use super::*;

	fn scenario_shapes() -> Normalizer {
		Normalizer::for_record("scenario", "scenarios")
	}

	#[test]
	fn record_from_every_known_envelope() {
		let n = scenario_shapes();
		let bare = json!({"id": "s1", "name": "Q4 Review"});
		let data = json!({"success": true, "data": {"_id": "s1", "name": "Q4 Review"}});
		let plural = json!({"scenarios": [{"id": "s1"}, {"id": "s2"}]});
		let nested = json!({"data": {"scenario": {"id": "s1"}}});

		for value in [bare, data, plural, nested] {
			let record = n.record(&value).expect("record");
			assert_eq!(record_id(&record).as_deref(), Some("s1"));
		}
	}

	#[test]
	fn record_skips_objects_without_id() {
		let n = scenario_shapes();
		assert!(n.record(&json!({"success": true, "message": "ok"})).is_none());
		assert!(n.record(&json!({"data": {"id": "undefined"}})).is_none());
	}

	#[test]
	fn list_from_every_known_envelope() {
		let n = Normalizer::for_list(&["risk-events", "risk_events"]);
		for value in [
			json!([{"id": 1}]),
			json!({"data": [{"id": 1}]}),
			json!({"risk_events": [{"id": 1}]}),
			json!({"data": {"risk-events": [{"id": 1}]}}),
		] {
			assert_eq!(n.list(&value).map(|v| v.len()), Some(1), "{value}");
		}
		assert!(n.list_or_empty(&json!({"count": 0})).is_empty());
	}

	#[test]
	fn extra_shapes_are_tried_last() {
		let n = Normalizer::new(vec![Shape::Data]).push(Shape::Named("items".into()));
		assert_eq!(n.list(&json!({"items": [1, 2]})).map(|v| v.len()), Some(2));
	}

	#[test]
	fn record_id_accepts_numbers_and_oid() {
		assert_eq!(record_id(&json!({"id": 42})).as_deref(), Some("42"));
		assert_eq!(
			record_id(&json!({"_id": {"$oid": "abc"}})).as_deref(),
			Some("abc")
		);
	}
}
