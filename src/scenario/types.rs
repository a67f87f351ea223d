use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Kind of a canvas component; fixed at creation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComponentKind {
	Event,
	Asset,
	Defense,
}

impl ComponentKind {
	pub const ALL: [ComponentKind; 3] = [
		ComponentKind::Event,
		ComponentKind::Asset,
		ComponentKind::Defense,
	];

	pub fn as_str(self) -> &'static str {
		match self {
			ComponentKind::Event => "event",
			ComponentKind::Asset => "asset",
			ComponentKind::Defense => "defense",
		}
	}

	pub fn label(self) -> &'static str {
		match self {
			ComponentKind::Event => "Risk Event",
			ComponentKind::Asset => "Business Asset",
			ComponentKind::Defense => "Defense System",
		}
	}

	pub fn parse(s: &str) -> Option<Self> {
		match s.trim().to_ascii_lowercase().as_str() {
			"event" | "risk" | "risk-event" => Some(ComponentKind::Event),
			"asset" | "business-asset" => Some(ComponentKind::Asset),
			"defense" | "defense-system" => Some(ComponentKind::Defense),
			_ => None,
		}
	}
}

impl fmt::Display for ComponentKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// Canvas coordinates in pixels.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
	pub x: f64,
	pub y: f64,
}

impl Position {
	pub fn new(x: f64, y: f64) -> Self {
		Self { x, y }
	}
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Criticality {
	Low,
	#[default]
	Medium,
	High,
}

impl Criticality {
	pub const ALL: [Criticality; 3] = [Criticality::Low, Criticality::Medium, Criticality::High];

	pub fn as_str(self) -> &'static str {
		match self {
			Criticality::Low => "Low",
			Criticality::Medium => "Medium",
			Criticality::High => "High",
		}
	}

	/// Accepts any casing; the backend's `critical` maps to `High`.
	pub fn parse(s: &str) -> Option<Self> {
		match s.trim().to_ascii_lowercase().as_str() {
			"low" => Some(Criticality::Low),
			"medium" => Some(Criticality::Medium),
			"high" | "critical" => Some(Criticality::High),
			_ => None,
		}
	}
}

/// Risk event attributes. `likelihood` is a 0-1 fraction.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventAttrs {
	pub likelihood: f64,
	pub severity: f64,
	pub duration_hrs: f64,
	pub category: String,
}

impl Default for EventAttrs {
	fn default() -> Self {
		Self {
			likelihood: 0.15,
			severity: 500_000.0,
			duration_hrs: 72.0,
			category: "cyber_attack".into(),
		}
	}
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetAttrs {
	pub valuation: f64,
	pub criticality: Criticality,
	pub location: String,
}

impl Default for AssetAttrs {
	fn default() -> Self {
		Self {
			valuation: 1_000_000.0,
			criticality: Criticality::Medium,
			location: String::new(),
		}
	}
}

/// Defense system attributes. `mitigation_pct` is a 0-1 fraction.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DefenseAttrs {
	pub mitigation_pct: f64,
	pub annual_cost_usd: f64,
}

impl Default for DefenseAttrs {
	fn default() -> Self {
		Self {
			mitigation_pct: 0.85,
			annual_cost_usd: 50_000.0,
		}
	}
}

/// Kind-specific attributes; the variant is the component's kind.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Attributes {
	Event(EventAttrs),
	Asset(AssetAttrs),
	Defense(DefenseAttrs),
}

impl Attributes {
	pub fn defaults(kind: ComponentKind) -> Self {
		match kind {
			ComponentKind::Event => Attributes::Event(EventAttrs::default()),
			ComponentKind::Asset => Attributes::Asset(AssetAttrs::default()),
			ComponentKind::Defense => Attributes::Defense(DefenseAttrs::default()),
		}
	}

	pub fn kind(&self) -> ComponentKind {
		match self {
			Attributes::Event(_) => ComponentKind::Event,
			Attributes::Asset(_) => ComponentKind::Asset,
			Attributes::Defense(_) => ComponentKind::Defense,
		}
	}
}

/// A node on the scenario canvas.
///
/// `id` is local and keys connections. `remote_id` is the id of the record
/// in the backend's per-kind collection, set once on first materialisation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Component {
	pub id: String,
	pub name: String,
	#[serde(default)]
	pub description: String,
	#[serde(default)]
	pub position: Position,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub remote_id: Option<String>,
	#[serde(flatten)]
	pub attributes: Attributes,
}

impl Component {
	/// A pre-filled component of `kind`, as shown when a modal opens.
	pub fn draft(kind: ComponentKind) -> Self {
		Self {
			id: String::new(),
			name: default_name(kind).into(),
			description: String::new(),
			position: Position::default(),
			remote_id: None,
			attributes: Attributes::defaults(kind),
		}
	}

	pub fn kind(&self) -> ComponentKind {
		self.attributes.kind()
	}

	/// Records the backend id. Returns `false` if a different id was already set.
	pub fn assign_remote_id(&mut self, remote_id: &str) -> bool {
		match &self.remote_id {
			Some(existing) => existing == remote_id,
			None => {
				self.remote_id = Some(remote_id.to_string());
				true
			}
		}
	}
}

fn default_name(kind: ComponentKind) -> &'static str {
	match kind {
		ComponentKind::Event => "Cyber Attack",
		ComponentKind::Asset => "Customer Database",
		ComponentKind::Defense => "Firewall",
	}
}

/// Derived classification of a connection.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EdgeType {
	EventToAsset,
	AssetToDefense,
	EventToDefense,
	Connection,
}

impl EdgeType {
	/// Classifies an edge from its endpoint kinds.
	pub fn between(from: ComponentKind, to: ComponentKind) -> Self {
		match (from, to) {
			(ComponentKind::Event, ComponentKind::Asset) => EdgeType::EventToAsset,
			(ComponentKind::Asset, ComponentKind::Defense) => EdgeType::AssetToDefense,
			(ComponentKind::Event, ComponentKind::Defense) => EdgeType::EventToDefense,
			_ => EdgeType::Connection,
		}
	}

	pub fn as_str(self) -> &'static str {
		match self {
			EdgeType::EventToAsset => "event-to-asset",
			EdgeType::AssetToDefense => "asset-to-defense",
			EdgeType::EventToDefense => "event-to-defense",
			EdgeType::Connection => "connection",
		}
	}
}

/// Directed edge between two component ids.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Connection {
	pub from: String,
	pub to: String,
	#[serde(rename = "type")]
	pub edge_type: EdgeType,
}

impl Connection {
	pub fn touches(&self, id: &str) -> bool {
		self.from == id || self.to == id
	}
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScenarioStatus {
	#[default]
	Draft,
	Active,
	Completed,
	Archived,
}

impl ScenarioStatus {
	pub const ALL: [ScenarioStatus; 4] = [
		ScenarioStatus::Draft,
		ScenarioStatus::Active,
		ScenarioStatus::Completed,
		ScenarioStatus::Archived,
	];

	pub fn as_str(self) -> &'static str {
		match self {
			ScenarioStatus::Draft => "draft",
			ScenarioStatus::Active => "active",
			ScenarioStatus::Completed => "completed",
			ScenarioStatus::Archived => "archived",
		}
	}
}

/// Serialized graph stored on the scenario document.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ScenarioInputs {
	#[serde(default)]
	pub nodes: Vec<Value>,
	#[serde(default)]
	pub edges: Vec<Value>,
}

/// Server-owned scenario aggregate.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
	#[serde(
		default,
		alias = "_id",
		deserialize_with = "deserialize_id",
		skip_serializing_if = "Option::is_none"
	)]
	pub id: Option<String>,
	#[serde(default, deserialize_with = "null_as_default")]
	pub name: String,
	#[serde(default, deserialize_with = "null_as_default")]
	pub description: String,
	#[serde(default, deserialize_with = "lenient_status")]
	pub status: ScenarioStatus,
	#[serde(default, deserialize_with = "null_as_default")]
	pub inputs: ScenarioInputs,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub results: Option<Value>,
}

impl Scenario {
	pub fn new(name: impl Into<String>) -> Self {
		Self {
			id: None,
			name: name.into(),
			description: String::new(),
			status: ScenarioStatus::Draft,
			inputs: ScenarioInputs::default(),
			results: None,
		}
	}

	pub fn is_persisted(&self) -> bool {
		self.id.is_some()
	}
}

impl Default for Scenario {
	fn default() -> Self {
		Self::new("New Scenario")
	}
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
	D: Deserializer<'de>,
	T: Default + Deserialize<'de>,
{
	Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Unknown statuses read as `Draft` rather than failing the whole document.
fn lenient_status<'de, D: Deserializer<'de>>(deserializer: D) -> Result<ScenarioStatus, D::Error> {
	let value = Option::<String>::deserialize(deserializer)?;
	Ok(value
		.and_then(|s| {
			ScenarioStatus::ALL
				.into_iter()
				.find(|status| status.as_str().eq_ignore_ascii_case(s.trim()))
		})
		.unwrap_or_default())
}

/// Accepts string, number or `{$oid}` ids; blank strings count as absent.
fn deserialize_id<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
	let value = Option::<Value>::deserialize(deserializer)?;
	Ok(value.and_then(|v| {
		crate::api::envelope::record_id(&serde_json::json!({ "id": v }))
	}))
}

#[cfg(test)]
mod tests {
	use serde_json::json;

	use super::*;

	#[test]
	fn edge_type_table() {
		use ComponentKind::*;
		assert_eq!(EdgeType::between(Event, Asset), EdgeType::EventToAsset);
		assert_eq!(EdgeType::between(Asset, Defense), EdgeType::AssetToDefense);
		assert_eq!(EdgeType::between(Event, Defense), EdgeType::EventToDefense);
		for (from, to) in [
			(Asset, Event),
			(Defense, Event),
			(Defense, Asset),
			(Event, Event),
			(Asset, Asset),
			(Defense, Defense),
		] {
			assert_eq!(EdgeType::between(from, to), EdgeType::Connection, "{from}->{to}");
		}
	}

	#[test]
	fn edge_type_is_stable_for_fixed_kinds() {
		for from in ComponentKind::ALL {
			for to in ComponentKind::ALL {
				let first = EdgeType::between(from, to);
				assert!((0..5).all(|_| EdgeType::between(from, to) == first));
			}
		}
	}

	#[test]
	fn component_serializes_flat_with_type_tag() {
		let mut c = Component::draft(ComponentKind::Defense);
		c.id = "defense-1".into();
		let v = serde_json::to_value(&c).unwrap();
		assert_eq!(v["type"], "defense");
		assert_eq!(v["mitigationPct"], 0.85);
		assert_eq!(v["annualCostUsd"], 50000.0);
		assert!(v.get("remoteId").is_none());
	}

	#[test]
	fn connection_serializes_type_as_kebab_case() {
		let c = Connection {
			from: "a".into(),
			to: "b".into(),
			edge_type: EdgeType::EventToAsset,
		};
		assert_eq!(
			serde_json::to_value(&c).unwrap(),
			json!({"from": "a", "to": "b", "type": "event-to-asset"})
		);
	}

	#[test]
	fn scenario_accepts_mongo_style_ids() {
		let s: Scenario = serde_json::from_value(json!({"_id": "abc", "name": "Q4"})).unwrap();
		assert_eq!(s.id.as_deref(), Some("abc"));
		assert_eq!(s.status, ScenarioStatus::Draft);

		let s: Scenario = serde_json::from_value(json!({"id": 7})).unwrap();
		assert_eq!(s.id.as_deref(), Some("7"));
	}

	#[test]
	fn scenario_tolerates_nulls_and_unknown_status() {
		let s: Scenario = serde_json::from_value(json!({
			"id": "s1",
			"name": "Q4",
			"description": null,
			"status": "in_review",
			"inputs": null
		}))
		.unwrap();
		assert_eq!(s.description, "");
		assert_eq!(s.status, ScenarioStatus::Draft);
		assert!(s.inputs.nodes.is_empty());
	}

	#[test]
	fn criticality_parse_is_case_insensitive() {
		assert_eq!(Criticality::parse("high"), Some(Criticality::High));
		assert_eq!(Criticality::parse("Critical"), Some(Criticality::High));
		assert_eq!(Criticality::parse("none"), None);
	}

	#[test]
	fn remote_id_is_immutable_once_assigned() {
		let mut c = Component::draft(ComponentKind::Event);
		assert!(c.assign_remote_id("r1"));
		assert!(c.assign_remote_id("r1"));
		assert!(!c.assign_remote_id("r2"));
		assert_eq!(c.remote_id.as_deref(), Some("r1"));
	}
}
