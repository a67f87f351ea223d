//! In-memory component and connection stores for one scenario.

use serde_json::Value;

use super::types::{Component, ComponentKind, Connection, EdgeType, Position};

/// Result of replacing a stored component.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UpdateOutcome {
	Updated,
	NotFound,
}

/// Result of finishing a two-click connection.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ConnectOutcome {
	Created(Connection),
	/// Not in connecting mode, or no source was chosen yet.
	NoPending,
	SelfLoop,
	UnknownEndpoint,
	Duplicate,
}

/// Components, connections and the pending connect gesture.
///
/// Every mutation bumps [`ScenarioGraph::revision`]; the editor watches it to
/// schedule auto-saves.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ScenarioGraph {
	components: Vec<Component>,
	connections: Vec<Connection>,
	connecting: bool,
	pending_source: Option<String>,
	last_drop: Option<Position>,
	revision: u64,
}

impl ScenarioGraph {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn components(&self) -> &[Component] {
		&self.components
	}

	pub fn connections(&self) -> &[Connection] {
		&self.connections
	}

	pub fn component(&self, id: &str) -> Option<&Component> {
		self.components.iter().find(|c| c.id == id)
	}

	pub fn kind_of(&self, id: &str) -> Option<ComponentKind> {
		self.component(id).map(Component::kind)
	}

	pub fn count(&self, kind: ComponentKind) -> usize {
		self.components.iter().filter(|c| c.kind() == kind).count()
	}

	pub fn has_events(&self) -> bool {
		self.count(ComponentKind::Event) > 0
	}

	pub fn revision(&self) -> u64 {
		self.revision
	}

	fn touch(&mut self) {
		self.revision += 1;
	}

	/// Remembers where something was dropped so the next add lands there.
	pub fn set_drop_position(&mut self, position: Position) {
		self.last_drop = Some(position);
	}

	/// Forgets a drop whose component was never added.
	pub fn clear_drop_position(&mut self) {
		self.last_drop = None;
	}

	/// Appends a component and returns the stored copy.
	///
	/// An empty `id` gets a local `{kind}-{timestamp}` id. Position is the
	/// explicit one, else the last drop position, else a scattered default.
	pub fn add_component(&mut self, mut component: Component, position: Option<Position>) -> Component {
		if component.id.is_empty() || self.component(&component.id).is_some() {
			component.id = self.allocate_id(component.kind());
		}
		component.position = position
			.or_else(|| self.last_drop.take())
			.unwrap_or_else(|| scatter(self.components.len()));
		self.components.push(component.clone());
		self.touch();
		component
	}

	fn allocate_id(&self, kind: ComponentKind) -> String {
		let base = format!("{}-{}", kind, chrono::Utc::now().timestamp_millis());
		let mut id = base.clone();
		let mut n = 1;
		while self.component(&id).is_some() {
			id = format!("{base}-{n}");
			n += 1;
		}
		id
	}

	/// Replaces the component with the same id. Kind and remote id are kept
	/// from the stored entry.
	pub fn update_component(&mut self, updated: Component) -> UpdateOutcome {
		let Some(slot) = self.components.iter_mut().find(|c| c.id == updated.id) else {
			log::warn!("update for unknown component {}", updated.id);
			return UpdateOutcome::NotFound;
		};
		if slot.kind() != updated.kind() {
			log::warn!("ignoring kind change on component {}", updated.id);
			return UpdateOutcome::NotFound;
		}
		let remote_id = slot.remote_id.take().or(updated.remote_id.clone());
		*slot = Component { remote_id, ..updated };
		self.touch();
		UpdateOutcome::Updated
	}

	pub fn move_component(&mut self, id: &str, position: Position) -> bool {
		match self.components.iter_mut().find(|c| c.id == id) {
			Some(c) => {
				c.position = position;
				self.touch();
				true
			}
			None => false,
		}
	}

	/// Removes a component and every connection that names it.
	pub fn delete_component(&mut self, id: &str) -> Option<Component> {
		let index = self.components.iter().position(|c| c.id == id)?;
		let removed = self.components.remove(index);
		self.connections.retain(|c| !c.touches(id));
		if self.pending_source.as_deref() == Some(id) {
			self.cancel_connection();
		}
		self.touch();
		Some(removed)
	}

	pub fn is_connecting(&self) -> bool {
		self.connecting
	}

	pub fn pending_source(&self) -> Option<&str> {
		self.pending_source.as_deref()
	}

	/// Enters connecting mode; `None` waits for the first click to pick the source.
	pub fn begin_connection(&mut self, source: Option<&str>) {
		self.connecting = true;
		self.pending_source = source.map(str::to_string);
	}

	/// Handles a click on `id` while connecting: picks the source if none is
	/// pending, otherwise completes the connection.
	pub fn click_while_connecting(&mut self, id: &str) -> Option<ConnectOutcome> {
		if !self.connecting {
			return None;
		}
		if self.pending_source.is_none() {
			self.pending_source = Some(id.to_string());
			return None;
		}
		Some(self.complete_connection(id))
	}

	/// Completes a pending connection to `target`. Always leaves connecting mode.
	pub fn complete_connection(&mut self, target: &str) -> ConnectOutcome {
		let source = self.pending_source.take();
		self.connecting = false;
		let Some(source) = source else {
			return ConnectOutcome::NoPending;
		};
		if source == target {
			return ConnectOutcome::SelfLoop;
		}
		let (Some(from), Some(to)) = (self.kind_of(&source), self.kind_of(target)) else {
			return ConnectOutcome::UnknownEndpoint;
		};
		if self
			.connections
			.iter()
			.any(|c| c.from == source && c.to == target)
		{
			return ConnectOutcome::Duplicate;
		}
		let connection = Connection {
			from: source,
			to: target.to_string(),
			edge_type: EdgeType::between(from, to),
		};
		self.connections.push(connection.clone());
		self.touch();
		ConnectOutcome::Created(connection)
	}

	pub fn cancel_connection(&mut self) {
		self.connecting = false;
		self.pending_source = None;
	}

	pub fn delete_connection(&mut self, from: &str, to: &str) -> bool {
		let before = self.connections.len();
		self.connections.retain(|c| !(c.from == from && c.to == to));
		let removed = self.connections.len() != before;
		if removed {
			self.touch();
		}
		removed
	}

	/// Nodes and edges as stored on the scenario document.
	pub fn to_inputs(&self) -> (Vec<Value>, Vec<Value>) {
		let nodes = self
			.components
			.iter()
			.filter_map(|c| serde_json::to_value(c).ok())
			.collect();
		let edges = self
			.connections
			.iter()
			.filter_map(|c| serde_json::to_value(c).ok())
			.collect();
		(nodes, edges)
	}

	/// Rebuilds a graph from a scenario document's nodes and edges.
	///
	/// Malformed nodes are skipped. Edge types are recomputed from the
	/// endpoint kinds, and edges whose endpoints are missing are dropped.
	pub fn from_inputs(nodes: &[Value], edges: &[Value]) -> Self {
		let mut graph = Self::new();
		for node in nodes {
			match serde_json::from_value::<Component>(node.clone()) {
				Ok(component) if graph.component(&component.id).is_none() => {
					graph.components.push(component)
				}
				Ok(component) => log::warn!("duplicate node {} skipped", component.id),
				Err(err) => log::warn!("skipping malformed node: {err}"),
			}
		}
		for edge in edges {
			let (Some(from), Some(to)) = (
				edge.get("from").and_then(Value::as_str),
				edge.get("to").and_then(Value::as_str),
			) else {
				continue;
			};
			match (graph.kind_of(from), graph.kind_of(to)) {
				(Some(a), Some(b)) if from != to => graph.connections.push(Connection {
					from: from.to_string(),
					to: to.to_string(),
					edge_type: EdgeType::between(a, b),
				}),
				_ => log::debug!("dropping dangling edge {from} -> {to}"),
			}
		}
		graph
	}

	/// Adds components hydrated from the backend collections, skipping any
	/// whose remote id is already on the canvas.
	pub fn merge_remote(&mut self, components: Vec<Component>) -> usize {
		let mut added = 0;
		for component in components {
			let known = self.components.iter().any(|c| {
				c.id == component.id
					|| (c.remote_id.is_some() && c.remote_id == component.remote_id)
			});
			if !known {
				self.components.push(component);
				added += 1;
			}
		}
		if added > 0 {
			self.touch();
		}
		added
	}

	/// Records backend ids assigned during materialisation.
	pub fn assign_remote_ids(&mut self, assigned: &[(String, String)]) {
		for (local, remote) in assigned {
			if let Some(c) = self.components.iter_mut().find(|c| &c.id == local) {
				if !c.assign_remote_id(remote) {
					log::warn!("component {local} already linked to {:?}", c.remote_id);
				}
			}
		}
	}

	/// Overwrites positions without bumping the revision for each node.
	pub fn set_positions(&mut self, positions: &[(String, Position)]) {
		for (id, position) in positions {
			if let Some(c) = self.components.iter_mut().find(|c| &c.id == id) {
				c.position = *position;
			}
		}
		self.touch();
	}
}

/// Deterministic scatter so components added without a drop do not stack.
fn scatter(seed: usize) -> Position {
	Position::new(120.0 + rand_simple(seed) * 480.0, 100.0 + rand_simple(seed + 7) * 320.0)
}

fn rand_simple(seed: usize) -> f64 {
	let x = ((seed + 1) * 9301 + 49297) % 233280;
	(x as f64) / 233280.0
}

#[cfg(test)]
mod tests {
	use std::collections::HashSet;

	use super::*;
	use crate::scenario::types::{AssetAttrs, Attributes, Criticality, EventAttrs};

	fn event(graph: &mut ScenarioGraph) -> String {
		graph.add_component(Component::draft(ComponentKind::Event), None).id
	}

	fn asset(graph: &mut ScenarioGraph) -> String {
		graph.add_component(Component::draft(ComponentKind::Asset), None).id
	}

	fn connect(graph: &mut ScenarioGraph, from: &str, to: &str) -> ConnectOutcome {
		graph.begin_connection(Some(from));
		graph.complete_connection(to)
	}

	#[test]
	fn event_to_asset_example() {
		let mut g = ScenarioGraph::new();
		let mut e = Component::draft(ComponentKind::Event);
		e.attributes = Attributes::Event(EventAttrs {
			likelihood: crate::scenario::convert::to_fraction(15.0),
			severity: 500_000.0,
			duration_hrs: 72.0,
			category: "cyber_attack".into(),
		});
		let mut a = Component::draft(ComponentKind::Asset);
		a.attributes = Attributes::Asset(AssetAttrs {
			valuation: 1_000_000.0,
			criticality: Criticality::High,
			location: String::new(),
		});
		let e = g.add_component(e, None);
		let a = g.add_component(a, None);

		match connect(&mut g, &e.id, &a.id) {
			ConnectOutcome::Created(c) => assert_eq!(c.edge_type.as_str(), "event-to-asset"),
			other => panic!("unexpected {other:?}"),
		}
		match &g.component(&e.id).unwrap().attributes {
			Attributes::Event(attrs) => assert!((attrs.likelihood - 0.15).abs() < 1e-12),
			other => panic!("unexpected {other:?}"),
		}
	}

	#[test]
	fn ids_are_local_and_unique() {
		let mut g = ScenarioGraph::new();
		let ids: Vec<_> = (0..5).map(|_| event(&mut g)).collect();
		for id in &ids {
			assert!(id.starts_with("event-"));
		}
		let unique: HashSet<_> = ids.iter().collect();
		assert_eq!(unique.len(), ids.len());
	}

	#[test]
	fn position_prefers_explicit_then_drop() {
		let mut g = ScenarioGraph::new();
		g.set_drop_position(Position::new(10.0, 20.0));
		let explicit = g.add_component(
			Component::draft(ComponentKind::Asset),
			Some(Position::new(1.0, 2.0)),
		);
		assert_eq!(explicit.position, Position::new(1.0, 2.0));

		let dropped = g.add_component(Component::draft(ComponentKind::Asset), None);
		assert_eq!(dropped.position, Position::new(10.0, 20.0));

		let scattered = g.add_component(Component::draft(ComponentKind::Asset), None);
		assert_ne!(scattered.position, Position::new(10.0, 20.0));
	}

	#[test]
	fn cancelled_drop_does_not_place_the_next_add() {
		let mut g = ScenarioGraph::new();
		g.set_drop_position(Position::new(10.0, 20.0));
		g.clear_drop_position();
		let added = g.add_component(Component::draft(ComponentKind::Event), None);
		assert_ne!(added.position, Position::new(10.0, 20.0));
		assert_eq!(added.position, scatter(0));
	}

	#[test]
	fn delete_cascades_to_connections() {
		let mut g = ScenarioGraph::new();
		let e = event(&mut g);
		let a = asset(&mut g);
		let d = g.add_component(Component::draft(ComponentKind::Defense), None).id;
		connect(&mut g, &e, &a);
		connect(&mut g, &a, &d);
		connect(&mut g, &e, &d);
		assert_eq!(g.connections().len(), 3);

		g.delete_component(&a).unwrap();
		assert!(g.component(&a).is_none());
		assert_eq!(g.connections().len(), 1);
		assert!(g.connections().iter().all(|c| !c.touches(&a)));
	}

	#[test]
	fn deleting_every_component_leaves_no_edges() {
		let mut g = ScenarioGraph::new();
		let ids: Vec<_> = (0..4)
			.map(|i| if i % 2 == 0 { event(&mut g) } else { asset(&mut g) })
			.collect();
		for a in &ids {
			for b in &ids {
				connect(&mut g, a, b);
			}
		}
		for id in &ids {
			g.delete_component(id);
			for c in g.connections() {
				assert!(g.component(&c.from).is_some() && g.component(&c.to).is_some());
			}
		}
		assert!(g.connections().is_empty());
	}

	#[test]
	fn self_loops_are_rejected_and_mode_exits() {
		let mut g = ScenarioGraph::new();
		let e = event(&mut g);
		assert_eq!(connect(&mut g, &e, &e), ConnectOutcome::SelfLoop);
		assert!(g.connections().is_empty());
		assert!(!g.is_connecting());
	}

	#[test]
	fn complete_without_pending_is_a_no_op() {
		let mut g = ScenarioGraph::new();
		let e = event(&mut g);
		assert_eq!(g.complete_connection(&e), ConnectOutcome::NoPending);
		assert!(!g.is_connecting());
	}

	#[test]
	fn cancel_leaves_no_edge() {
		let mut g = ScenarioGraph::new();
		let e = event(&mut g);
		let a = asset(&mut g);
		g.begin_connection(Some(&e));
		g.cancel_connection();
		assert_eq!(g.complete_connection(&a), ConnectOutcome::NoPending);
		assert!(g.connections().is_empty());
	}

	#[test]
	fn two_click_connect() {
		let mut g = ScenarioGraph::new();
		let e = event(&mut g);
		let a = asset(&mut g);
		g.begin_connection(None);
		assert_eq!(g.click_while_connecting(&e), None);
		assert!(matches!(
			g.click_while_connecting(&a),
			Some(ConnectOutcome::Created(_))
		));
		assert!(!g.is_connecting());
	}

	#[test]
	fn unknown_endpoints_and_duplicates_are_rejected() {
		let mut g = ScenarioGraph::new();
		let e = event(&mut g);
		let a = asset(&mut g);
		assert_eq!(connect(&mut g, &e, "ghost"), ConnectOutcome::UnknownEndpoint);
		assert!(matches!(connect(&mut g, &e, &a), ConnectOutcome::Created(_)));
		assert_eq!(connect(&mut g, &e, &a), ConnectOutcome::Duplicate);
		assert_eq!(g.connections().len(), 1);
	}

	#[test]
	fn update_reports_not_found() {
		let mut g = ScenarioGraph::new();
		let mut ghost = Component::draft(ComponentKind::Event);
		ghost.id = "event-0".into();
		assert_eq!(g.update_component(ghost), UpdateOutcome::NotFound);

		let mut stored = g.add_component(Component::draft(ComponentKind::Event), None);
		stored.name = "Phishing".into();
		assert_eq!(g.update_component(stored.clone()), UpdateOutcome::Updated);
		assert_eq!(g.component(&stored.id).unwrap().name, "Phishing");
	}

	#[test]
	fn update_cannot_change_kind() {
		let mut g = ScenarioGraph::new();
		let id = event(&mut g);
		let mut swapped = Component::draft(ComponentKind::Asset);
		swapped.id = id.clone();
		assert_eq!(g.update_component(swapped), UpdateOutcome::NotFound);
		assert_eq!(g.kind_of(&id), Some(ComponentKind::Event));
	}

	#[test]
	fn direct_connection_delete() {
		let mut g = ScenarioGraph::new();
		let e = event(&mut g);
		let a = asset(&mut g);
		connect(&mut g, &e, &a);
		assert!(g.delete_connection(&e, &a));
		assert!(!g.delete_connection(&e, &a));
		assert!(g.connections().is_empty());
	}

	#[test]
	fn mutations_bump_revision() {
		let mut g = ScenarioGraph::new();
		let r0 = g.revision();
		let e = event(&mut g);
		assert!(g.revision() > r0);
		let r1 = g.revision();
		g.move_component(&e, Position::new(3.0, 4.0));
		assert!(g.revision() > r1);
	}

	#[test]
	fn inputs_round_trip_and_drop_dangling_edges() {
		let mut g = ScenarioGraph::new();
		let e = event(&mut g);
		let a = asset(&mut g);
		connect(&mut g, &e, &a);
		let (mut nodes, mut edges) = g.to_inputs();
		edges.push(serde_json::json!({"from": e, "to": "missing", "type": "connection"}));
		nodes.push(serde_json::json!({"id": "broken"}));

		let back = ScenarioGraph::from_inputs(&nodes, &edges);
		assert_eq!(back.components(), g.components());
		assert_eq!(back.connections(), g.connections());
	}

	#[test]
	fn merge_remote_skips_known_records() {
		let mut g = ScenarioGraph::new();
		let mut c = Component::draft(ComponentKind::Event);
		c.remote_id = Some("r1".into());
		g.add_component(c.clone(), None);

		let mut incoming = c.clone();
		incoming.id = "r1".into();
		let mut fresh = Component::draft(ComponentKind::Asset);
		fresh.id = "r2".into();
		fresh.remote_id = Some("r2".into());

		assert_eq!(g.merge_remote(vec![incoming, fresh]), 1);
		assert_eq!(g.components().len(), 2);
	}
}
