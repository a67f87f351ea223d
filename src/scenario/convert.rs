//! Mapping between canvas components and the backend's per-kind collections.

use serde_json::{Map, Value, json};

use super::types::{
	AssetAttrs, Attributes, Component, ComponentKind, Criticality, DefenseAttrs, EventAttrs,
	Position,
};
use crate::api::envelope::record_id;
use crate::config::Collection;

/// Fraction (0-1) to percent (0-100).
pub fn to_percent(fraction: f64) -> f64 {
	fraction * 100.0
}

/// Percent (0-100) to fraction (0-1).
pub fn to_fraction(percent: f64) -> f64 {
	percent / 100.0
}

pub fn collection_for(kind: ComponentKind) -> Collection {
	match kind {
		ComponentKind::Event => Collection::RiskEvents,
		ComponentKind::Asset => Collection::BusinessAssets,
		ComponentKind::Defense => Collection::DefenseSystems,
	}
}

pub fn kind_for(collection: Collection) -> ComponentKind {
	match collection {
		Collection::RiskEvents => ComponentKind::Event,
		Collection::BusinessAssets => ComponentKind::Asset,
		Collection::DefenseSystems => ComponentKind::Defense,
	}
}

/// Request body for the component's backend collection.
pub fn to_remote(component: &Component) -> Value {
	let mut body = match &component.attributes {
		Attributes::Event(e) => json!({
			"type": non_empty(&e.category, "cyber_attack"),
			"probability": to_percent(e.likelihood),
			"impact_min": 0.0,
			"impact_max": e.severity,
			"duration_hours": e.duration_hrs,
			"frequency": 1.0,
		}),
		Attributes::Asset(a) => json!({
			"type": "critical_system",
			"value": a.valuation,
			"criticality": a.criticality.as_str().to_ascii_lowercase(),
			"location": a.location,
		}),
		Attributes::Defense(d) => json!({
			"type": "security_control",
			"effectiveness": to_percent(d.mitigation_pct),
			"cost": d.annual_cost_usd,
		}),
	};
	if let Value::Object(map) = &mut body {
		map.insert("name".into(), Value::String(component.name.clone()));
		map.insert(
			"description".into(),
			Value::String(component.description.clone()),
		);
	}
	body
}

/// Rebuilds a component of `kind` from a backend record.
///
/// Missing values fall back to the modal defaults; `position` is used when
/// the record carries none. Returns `None` for records without an id.
pub fn from_remote(kind: ComponentKind, record: &Value, position: Position) -> Option<Component> {
	let remote_id = record_id(record)?;
	let fields = record.as_object()?;
	let attributes = match kind {
		ComponentKind::Event => {
			let d = EventAttrs::default();
			Attributes::Event(EventAttrs {
				likelihood: number(fields, "probability")
					.map(to_fraction)
					.unwrap_or(d.likelihood),
				severity: number(fields, "impact_max").unwrap_or(d.severity),
				duration_hrs: number(fields, "duration_hours").unwrap_or(d.duration_hrs),
				category: text(fields, "type").unwrap_or(d.category),
			})
		}
		ComponentKind::Asset => {
			let d = AssetAttrs::default();
			Attributes::Asset(AssetAttrs {
				valuation: number(fields, "value").unwrap_or(d.valuation),
				criticality: text(fields, "criticality")
					.and_then(|c| Criticality::parse(&c))
					.unwrap_or(d.criticality),
				location: text(fields, "location").unwrap_or(d.location),
			})
		}
		ComponentKind::Defense => {
			let d = DefenseAttrs::default();
			Attributes::Defense(DefenseAttrs {
				mitigation_pct: number(fields, "effectiveness")
					.map(to_fraction)
					.unwrap_or(d.mitigation_pct),
				annual_cost_usd: number(fields, "cost").unwrap_or(d.annual_cost_usd),
			})
		}
	};
	let position = fields
		.get("position")
		.and_then(|p| serde_json::from_value::<Position>(p.clone()).ok())
		.unwrap_or(position);

	Some(Component {
		id: remote_id.clone(),
		name: text(fields, "name").unwrap_or_else(|| kind.label().to_string()),
		description: text(fields, "description").unwrap_or_default(),
		position,
		remote_id: Some(remote_id),
		attributes,
	})
}

/// Grid slot used when hydrating records that carry no position.
pub fn grid_position(kind: ComponentKind, index: usize) -> Position {
	let (x0, y0, cols, dx) = match kind {
		ComponentKind::Event => (100.0, 100.0, 3, 200.0),
		ComponentKind::Asset => (200.0, 300.0, 2, 300.0),
		ComponentKind::Defense => (400.0, 500.0, 4, 150.0),
	};
	Position::new(
		x0 + (index % cols) as f64 * dx,
		y0 + (index / cols) as f64 * 120.0,
	)
}

fn non_empty<'a>(s: &'a str, fallback: &'a str) -> &'a str {
	if s.trim().is_empty() { fallback } else { s }
}

/// Numbers, or numeric strings as form-encoded backends send them.
fn number(fields: &Map<String, Value>, key: &str) -> Option<f64> {
	match fields.get(key)? {
		Value::Number(n) => n.as_f64(),
		Value::String(s) => s.trim().parse().ok(),
		_ => None,
	}
}

fn text(fields: &Map<String, Value>, key: &str) -> Option<String> {
	fields
		.get(key)?
		.as_str()
		.filter(|s| !s.trim().is_empty())
		.map(str::to_string)
}

#[cfg(test)]
mod tests {
	use super::*;

	fn round_trip(component: &Component) -> Component {
		let mut record = to_remote(component);
		record["_id"] = json!("remote-1");
		from_remote(component.kind(), &record, Position::default()).unwrap()
	}

	fn assert_same_visible_fields(a: &Component, b: &Component) {
		assert_eq!(a.name, b.name);
		assert_eq!(a.kind(), b.kind());
		assert_eq!(a.description, b.description);
		match (&a.attributes, &b.attributes) {
			(Attributes::Event(x), Attributes::Event(y)) => {
				assert!((x.likelihood - y.likelihood).abs() < 1e-9);
				assert_eq!(x.severity, y.severity);
				assert_eq!(x.duration_hrs, y.duration_hrs);
				assert_eq!(x.category, y.category);
			}
			(Attributes::Defense(x), Attributes::Defense(y)) => {
				assert!((x.mitigation_pct - y.mitigation_pct).abs() < 1e-9);
				assert_eq!(x.annual_cost_usd, y.annual_cost_usd);
			}
			(x, y) => assert_eq!(x, y),
		}
	}

	#[test]
	fn event_maps_to_risk_event_fields() {
		let mut c = Component::draft(ComponentKind::Event);
		c.name = "Ransomware".into();
		c.attributes = Attributes::Event(EventAttrs {
			likelihood: 0.15,
			severity: 500_000.0,
			duration_hrs: 72.0,
			category: "cyber_attack".into(),
		});
		let body = to_remote(&c);
		assert_eq!(body["name"], "Ransomware");
		assert!((body["probability"].as_f64().unwrap() - 15.0).abs() < 1e-9);
		assert_eq!(body["impact_max"], 500_000.0);
		assert_eq!(body["duration_hours"], 72.0);
		assert_eq!(body["type"], "cyber_attack");
	}

	#[test]
	fn asset_criticality_is_sent_lowercase() {
		let mut c = Component::draft(ComponentKind::Asset);
		c.attributes = Attributes::Asset(AssetAttrs {
			valuation: 1_000_000.0,
			criticality: Criticality::High,
			location: "Frankfurt".into(),
		});
		let body = to_remote(&c);
		assert_eq!(body["criticality"], "high");
		assert_eq!(body["value"], 1_000_000.0);
	}

	#[test]
	fn round_trip_keeps_user_visible_fields() {
		for kind in ComponentKind::ALL {
			let mut c = Component::draft(kind);
			c.id = format!("{kind}-1");
			c.description = "seeded".into();
			let back = round_trip(&c);
			assert_same_visible_fields(&c, &back);
			assert_eq!(back.remote_id.as_deref(), Some("remote-1"));
		}
	}

	#[test]
	fn hydration_defaults_missing_fields() {
		let record = json!({"id": "r9", "name": "Supplier outage", "probability": "40"});
		let c = from_remote(ComponentKind::Event, &record, Position::new(5.0, 6.0)).unwrap();
		match c.attributes {
			Attributes::Event(e) => {
				assert!((e.likelihood - 0.4).abs() < 1e-9);
				assert_eq!(e.severity, EventAttrs::default().severity);
			}
			other => panic!("unexpected {other:?}"),
		}
		assert_eq!(c.position, Position::new(5.0, 6.0));
		assert!(from_remote(ComponentKind::Event, &json!({"name": "x"}), Position::default()).is_none());
	}

	#[test]
	fn percent_conversions_are_inverses() {
		for i in 0..=1000 {
			let x = i as f64 / 1000.0;
			assert!((to_fraction(to_percent(x)) - x).abs() < 1e-12, "{x}");
		}
	}

	#[test]
	fn collections_and_kinds_correspond() {
		for kind in ComponentKind::ALL {
			assert_eq!(kind_for(collection_for(kind)), kind);
		}
	}
}
