//! Locations, events and defenses catalogs.
//!
//! Records are kept as a name plus the backend's own field map; the screens
//! only pick a few columns out of it.

use serde_json::{Map, Value};

use super::envelope::{Normalizer, record_id};
use super::{ApiClient, Transport};
use crate::config::{ApiConfig, Catalog};
use crate::error::{ApiError, FieldError};
use crate::scenario::validate::parse_number;

#[derive(Clone, Debug, Default, PartialEq)]
pub struct CatalogRecord {
	pub id: Option<String>,
	pub name: String,
	pub fields: Map<String, Value>,
}

impl CatalogRecord {
	pub fn from_value(value: &Value) -> Option<Self> {
		let mut fields = value.as_object()?.clone();
		let id = record_id(value);
		fields.remove("id");
		fields.remove("_id");
		let name = fields
			.remove("name")
			.and_then(|n| n.as_str().map(str::to_string))
			.unwrap_or_default();
		Some(Self { id, name, fields })
	}

	pub fn to_value(&self) -> Value {
		let mut body = self.fields.clone();
		body.insert("name".into(), Value::String(self.name.clone()));
		Value::Object(body)
	}

	/// Display text of a field; missing values render as `-`.
	pub fn text(&self, key: &str) -> String {
		match self.fields.get(key) {
			Some(Value::String(s)) => s.clone(),
			Some(Value::Number(n)) => n.to_string(),
			Some(Value::Bool(b)) => b.to_string(),
			Some(Value::Array(items)) => items
				.iter()
				.filter_map(Value::as_str)
				.collect::<Vec<_>>()
				.join(", "),
			_ => "-".into(),
		}
	}
}

/// Field a catalog form asks for, with the value a new record starts with.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FieldSpec {
	pub key: &'static str,
	pub label: &'static str,
	pub numeric: bool,
	pub default: &'static str,
}

const fn text(key: &'static str, label: &'static str, default: &'static str) -> FieldSpec {
	FieldSpec {
		key,
		label,
		numeric: false,
		default,
	}
}

const fn number(key: &'static str, label: &'static str, default: &'static str) -> FieldSpec {
	FieldSpec {
		key,
		label,
		numeric: true,
		default,
	}
}

/// Fields the backend requires on create, in form order.
pub fn fields(catalog: Catalog) -> &'static [FieldSpec] {
	const LOCATIONS: &[FieldSpec] = &[
		text("address", "Address", ""),
		text("type", "Type", "office"),
		number("employees", "Employees", "0"),
		number("annual_revenue", "Annual revenue", "0"),
		number("monthly_profit", "Monthly profit", "0"),
		number("risk_score", "Risk score", "0"),
	];
	const EVENTS: &[FieldSpec] = &[
		text("type", "Type", "cyber_attack"),
		text("severity", "Severity", "medium"),
		text("date", "Date", ""),
		text("duration", "Duration", "1 day"),
		text("location", "Location", ""),
		number("revenue_impact", "Revenue impact", "0"),
		text("recovery_time", "Recovery time", "1 day"),
	];
	const DEFENSES: &[FieldSpec] = &[
		text("type", "Type", "firewall"),
		number("effectiveness", "Effectiveness (%)", "80"),
		number("annual_cost", "Annual cost", "0"),
		number("implementation_cost", "Implementation cost", "0"),
	];
	match catalog {
		Catalog::Locations => LOCATIONS,
		Catalog::Events => EVENTS,
		Catalog::Defenses => DEFENSES,
	}
}

/// Builds a record from form input, converting numeric fields.
pub fn record_from_form(
	catalog: Catalog,
	name: &str,
	values: &[(&'static str, String)],
) -> Result<CatalogRecord, FieldError> {
	let name = name.trim();
	if name.is_empty() {
		return Err(FieldError::new("name", "Name is required"));
	}
	let mut record = CatalogRecord {
		id: None,
		name: name.to_string(),
		fields: Map::new(),
	};
	for spec in fields(catalog) {
		let raw = values
			.iter()
			.find(|(key, _)| *key == spec.key)
			.map(|(_, v)| v.as_str())
			.unwrap_or(spec.default);
		let value = if spec.numeric {
			let n = parse_number(spec.key, raw)?;
			serde_json::Number::from_f64(n).map(Value::Number).unwrap_or(Value::Null)
		} else {
			Value::String(raw.trim().to_string())
		};
		record.fields.insert(spec.key.into(), value);
	}
	Ok(record)
}

fn shapes(catalog: Catalog) -> Normalizer {
	Normalizer::for_list(&[catalog.key()])
}

pub async fn list<T: Transport>(
	client: &ApiClient<T>,
	catalog: Catalog,
) -> Result<Vec<CatalogRecord>, ApiError> {
	let response = client.get(&client.config().catalog_path(catalog)).await?;
	Ok(shapes(catalog)
		.list_or_empty(&response)
		.iter()
		.filter_map(CatalogRecord::from_value)
		.collect())
}

/// Creates the record and returns it with the id the backend assigned.
pub async fn create<T: Transport>(
	client: &ApiClient<T>,
	catalog: Catalog,
	record: &CatalogRecord,
) -> Result<CatalogRecord, ApiError> {
	let path = client.config().catalog_path(catalog);
	let response = client.post(&path, record.to_value()).await?;
	let created = Normalizer::for_record(catalog.key().trim_end_matches('s'), catalog.key())
		.record(&response)
		.and_then(|v| CatalogRecord::from_value(&v))
		.ok_or(ApiError::UnexpectedShape(path))?;
	log::info!("created {} {}", catalog.key(), created.id.as_deref().unwrap_or_default());
	Ok(created)
}

pub async fn update<T: Transport>(
	client: &ApiClient<T>,
	catalog: Catalog,
	id: &str,
	record: &CatalogRecord,
) -> Result<(), ApiError> {
	let path = ApiConfig::record_path(&client.config().catalog_path(catalog), id);
	client.put(&path, record.to_value()).await?;
	Ok(())
}

pub async fn delete<T: Transport>(
	client: &ApiClient<T>,
	catalog: Catalog,
	id: &str,
) -> Result<(), ApiError> {
	let path = ApiConfig::record_path(&client.config().catalog_path(catalog), id);
	client.delete(&path).await?;
	log::info!("deleted {} {id}", catalog.key());
	Ok(())
}

#[cfg(test)]
mod tests {
	use futures::executor::block_on;
	use serde_json::json;

	use super::*;
	use crate::api::HttpResponse;
	use crate::api::mock::MockTransport;

	#[test]
	fn list_keeps_unknown_fields() {
		let client = MockTransport::client(|_| {
			Ok(HttpResponse::new(
				200,
				json!({"locations": [{"_id": "l1", "name": "HQ", "employees": 120, "status": "active"}]}),
			))
		});
		let records = block_on(list(&client, Catalog::Locations)).unwrap();
		assert_eq!(records[0].id.as_deref(), Some("l1"));
		assert_eq!(records[0].name, "HQ");
		assert_eq!(records[0].text("employees"), "120");
		assert_eq!(records[0].text("missing"), "-");
		assert_eq!(client.transport().log(), ["Get /locations/"]);
	}

	#[test]
	fn create_then_delete() {
		let client = MockTransport::client(|req| match req.method {
			crate::api::Method::Post => Ok(HttpResponse::new(
				201,
				json!({"success": true, "data": {"id": "d1", "name": "WAF"}}),
			)),
			_ => Ok(HttpResponse::new(200, json!({"message": "deleted"}))),
		});
		let record = record_from_form(Catalog::Defenses, "WAF", &[("effectiveness", "75".into())]).unwrap();
		assert_eq!(record.fields["effectiveness"], json!(75.0));
		assert_eq!(record.fields["type"], json!("firewall"));

		let created = block_on(create(&client, Catalog::Defenses, &record)).unwrap();
		assert_eq!(created.id.as_deref(), Some("d1"));
		block_on(delete(&client, Catalog::Defenses, "d1")).unwrap();
		assert_eq!(client.transport().log(), ["Post /defenses/", "Delete /defenses/d1/"]);
	}

	#[test]
	fn update_puts_to_record_route() {
		let client = MockTransport::client(|_| Ok(HttpResponse::new(200, json!({}))));
		let record = CatalogRecord::from_value(&json!({"id": "e1", "name": "Outage", "severity": "high"})).unwrap();
		block_on(update(&client, Catalog::Events, "e1", &record)).unwrap();

		let call = &client.transport().calls()[0];
		assert!(call.url.ends_with("/events/e1/"));
		assert_eq!(call.body, Some(json!({"name": "Outage", "severity": "high"})));
	}

	#[test]
	fn form_rejects_bad_numbers() {
		let err = record_from_form(Catalog::Locations, "HQ", &[("employees", "lots".into())]).unwrap_err();
		assert_eq!(err.field, "employees");
		assert!(record_from_form(Catalog::Locations, " ", &[]).is_err());
	}
}
