use std::collections::HashSet;

use crate::scenario::{ComponentKind, EdgeType, Position, ScenarioGraph};

pub const NODE_RADIUS: f64 = 26.0;
pub const HIT_RADIUS: f64 = 30.0;
pub const EDGE_HIT: f64 = 6.0;
/// Pointer travel, in screen pixels, below which a press counts as a click.
const CLICK_SLOP: f64 = 4.0;

pub fn kind_color(kind: ComponentKind) -> &'static str {
	match kind {
		ComponentKind::Event => "#ef4444",
		ComponentKind::Asset => "#3b82f6",
		ComponentKind::Defense => "#22c55e",
	}
}

pub fn edge_rgb(edge: EdgeType) -> &'static str {
	match edge {
		EdgeType::EventToAsset => "239, 68, 68",
		EdgeType::AssetToDefense => "59, 130, 246",
		EdgeType::EventToDefense => "34, 197, 94",
		EdgeType::Connection => "148, 163, 184",
	}
}

#[derive(Clone, Debug, PartialEq)]
pub struct NodeView {
	pub id: String,
	pub label: String,
	pub kind: ComponentKind,
	pub x: f64,
	pub y: f64,
}

#[derive(Clone, Debug, PartialEq)]
pub struct EdgeView {
	pub from: String,
	pub to: String,
	pub edge_type: EdgeType,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ViewTransform {
	pub x: f64,
	pub y: f64,
	pub k: f64,
}

impl Default for ViewTransform {
	fn default() -> Self {
		Self { x: 0.0, y: 0.0, k: 1.0 }
	}
}

#[derive(Clone, Debug, Default)]
pub struct DragState {
	pub node: Option<String>,
	pub start_x: f64,
	pub start_y: f64,
	pub node_start_x: f64,
	pub node_start_y: f64,
	pub moved: bool,
}

#[derive(Clone, Debug, Default)]
pub struct PanState {
	pub active: bool,
	pub start_x: f64,
	pub start_y: f64,
	pub transform_start_x: f64,
	pub transform_start_y: f64,
	pub moved: bool,
}

#[derive(Clone, Debug, Default)]
pub struct HoverState {
	pub node: Option<String>,
	pub neighbors: HashSet<String>,
	pub highlight_t: f64,
}

/// What a finished press turned out to be.
#[derive(Clone, Debug, PartialEq)]
pub enum Release {
	Click(String),
	Moved(String, Position),
	BackgroundClick,
	None,
}

/// View-side state of the scenario canvas: a snapshot of the graph plus the
/// pan/zoom transform and in-progress pointer gestures.
pub struct CanvasState {
	pub nodes: Vec<NodeView>,
	pub edges: Vec<EdgeView>,
	pub selected: Option<String>,
	pub pending_source: Option<String>,
	pub connecting: bool,
	pub transform: ViewTransform,
	pub drag: DragState,
	pub pan: PanState,
	pub hover: HoverState,
	pub width: f64,
	pub height: f64,
	pub flow_time: f64,
}

impl CanvasState {
	pub fn new(width: f64, height: f64) -> Self {
		Self {
			nodes: Vec::new(),
			edges: Vec::new(),
			selected: None,
			pending_source: None,
			connecting: false,
			transform: ViewTransform::default(),
			drag: DragState::default(),
			pan: PanState::default(),
			hover: HoverState::default(),
			width,
			height,
			flow_time: 0.0,
		}
	}

	/// Replaces the snapshot, keeping the view and any node being dragged.
	pub fn sync(&mut self, graph: &ScenarioGraph) {
		let dragging = self.drag.node.clone();
		let held = dragging
			.as_deref()
			.and_then(|id| self.node(id))
			.map(|n| (n.x, n.y));

		self.nodes = graph
			.components()
			.iter()
			.map(|c| NodeView {
				id: c.id.clone(),
				label: c.name.clone(),
				kind: c.kind(),
				x: c.position.x,
				y: c.position.y,
			})
			.collect();
		self.edges = graph
			.connections()
			.iter()
			.map(|c| EdgeView {
				from: c.from.clone(),
				to: c.to.clone(),
				edge_type: c.edge_type,
			})
			.collect();
		self.connecting = graph.is_connecting();
		self.pending_source = graph.pending_source().map(str::to_string);

		if let (Some(id), Some((x, y))) = (dragging, held) {
			match self.nodes.iter_mut().find(|n| n.id == id) {
				Some(node) => (node.x, node.y) = (x, y),
				None => self.drag = DragState::default(),
			}
		}
		if let Some(selected) = &self.selected {
			if self.node(selected).is_none() {
				self.selected = None;
			}
		}
		let hovered = self.hover.node.clone().filter(|id| self.node(id).is_some());
		self.hover.node = None;
		self.set_hover(hovered);
	}

	pub fn node(&self, id: &str) -> Option<&NodeView> {
		self.nodes.iter().find(|n| n.id == id)
	}

	pub fn screen_to_graph(&self, sx: f64, sy: f64) -> (f64, f64) {
		(
			(sx - self.transform.x) / self.transform.k,
			(sy - self.transform.y) / self.transform.k,
		)
	}

	/// Topmost node under a screen point. Later nodes draw on top.
	pub fn component_at_position(&self, sx: f64, sy: f64) -> Option<String> {
		let (gx, gy) = self.screen_to_graph(sx, sy);
		self.nodes
			.iter()
			.rev()
			.find(|n| (n.x - gx).hypot(n.y - gy) < HIT_RADIUS)
			.map(|n| n.id.clone())
	}

	/// Connection whose line passes within [`EDGE_HIT`] of a screen point.
	pub fn connection_at_position(&self, sx: f64, sy: f64) -> Option<(String, String)> {
		let (gx, gy) = self.screen_to_graph(sx, sy);
		let tolerance = EDGE_HIT / self.transform.k;
		self.edges
			.iter()
			.filter_map(|e| {
				let (a, b) = (self.node(&e.from)?, self.node(&e.to)?);
				let d = segment_distance(gx, gy, a.x, a.y, b.x, b.y);
				(d < tolerance).then(|| (d, (e.from.clone(), e.to.clone())))
			})
			.min_by(|a, b| a.0.total_cmp(&b.0))
			.map(|(_, ids)| ids)
	}

	pub fn press(&mut self, x: f64, y: f64) {
		match self.component_at_position(x, y) {
			Some(id) => {
				let (nx, ny) = self.node(&id).map(|n| (n.x, n.y)).unwrap_or_default();
				self.drag = DragState {
					node: Some(id),
					start_x: x,
					start_y: y,
					node_start_x: nx,
					node_start_y: ny,
					moved: false,
				};
			}
			None => {
				self.pan = PanState {
					active: true,
					start_x: x,
					start_y: y,
					transform_start_x: self.transform.x,
					transform_start_y: self.transform.y,
					moved: false,
				};
			}
		}
	}

	pub fn pointer_move(&mut self, x: f64, y: f64) {
		if let Some(id) = self.drag.node.clone() {
			let (dx, dy) = (x - self.drag.start_x, y - self.drag.start_y);
			if dx.hypot(dy) >= CLICK_SLOP {
				self.drag.moved = true;
			}
			if self.drag.moved {
				let (nx, ny) = (
					self.drag.node_start_x + dx / self.transform.k,
					self.drag.node_start_y + dy / self.transform.k,
				);
				if let Some(node) = self.nodes.iter_mut().find(|n| n.id == id) {
					(node.x, node.y) = (nx, ny);
				}
			}
			return;
		}
		if self.pan.active {
			let (dx, dy) = (x - self.pan.start_x, y - self.pan.start_y);
			if dx.hypot(dy) >= CLICK_SLOP {
				self.pan.moved = true;
			}
			self.transform.x = self.pan.transform_start_x + dx;
			self.transform.y = self.pan.transform_start_y + dy;
			return;
		}
		let hovered = self.component_at_position(x, y);
		self.set_hover(hovered);
	}

	pub fn release(&mut self) -> Release {
		let drag = std::mem::take(&mut self.drag);
		let pan = std::mem::take(&mut self.pan);
		match drag.node {
			Some(id) if drag.moved => match self.node(&id) {
				Some(n) => Release::Moved(id, Position::new(n.x, n.y)),
				None => Release::None,
			},
			Some(id) => {
				self.selected = Some(id.clone());
				Release::Click(id)
			}
			None if pan.active && !pan.moved => {
				self.selected = None;
				Release::BackgroundClick
			}
			None => Release::None,
		}
	}

	/// Abandons any gesture, e.g. when the pointer leaves the canvas.
	pub fn cancel(&mut self) {
		if let Some(id) = self.drag.node.take() {
			let (x, y) = (self.drag.node_start_x, self.drag.node_start_y);
			if let Some(node) = self.nodes.iter_mut().find(|n| n.id == id) {
				(node.x, node.y) = (x, y);
			}
		}
		self.drag = DragState::default();
		self.pan = PanState::default();
		self.set_hover(None);
	}

	/// Zooms by one wheel notch around a screen point.
	pub fn zoom_at(&mut self, x: f64, y: f64, delta_y: f64) {
		let factor = if delta_y > 0.0 { 0.9 } else { 1.1 };
		let new_k = (self.transform.k * factor).clamp(0.2, 4.0);
		let ratio = new_k / self.transform.k;
		self.transform.x = x - (x - self.transform.x) * ratio;
		self.transform.y = y - (y - self.transform.y) * ratio;
		self.transform.k = new_k;
	}

	pub fn set_hover(&mut self, node: Option<String>) {
		if self.hover.node == node {
			return;
		}
		self.hover.neighbors = match &node {
			Some(id) => self
				.edges
				.iter()
				.filter_map(|e| {
					if &e.from == id {
						Some(e.to.clone())
					} else if &e.to == id {
						Some(e.from.clone())
					} else {
						None
					}
				})
				.collect(),
			None => HashSet::new(),
		};
		self.hover.node = node;
	}

	pub fn is_highlighted(&self, id: &str) -> bool {
		self.hover.node.as_deref() == Some(id) || self.hover.neighbors.contains(id)
	}

	pub fn tick(&mut self, dt: f64) {
		self.flow_time += dt;
		let target = if self.hover.node.is_some() { 1.0 } else { 0.0 };
		self.hover.highlight_t += (target - self.hover.highlight_t) * 1.8 * dt;
		if target == 0.0 && self.hover.highlight_t < 0.01 {
			self.hover.highlight_t = 0.0;
		}
	}

	pub fn resize(&mut self, width: f64, height: f64) {
		self.width = width;
		self.height = height;
	}
}

fn segment_distance(px: f64, py: f64, ax: f64, ay: f64, bx: f64, by: f64) -> f64 {
	let (dx, dy) = (bx - ax, by - ay);
	let len2 = dx * dx + dy * dy;
	if len2 == 0.0 {
		return (px - ax).hypot(py - ay);
	}
	let t = (((px - ax) * dx + (py - ay) * dy) / len2).clamp(0.0, 1.0);
	(px - (ax + t * dx)).hypot(py - (ay + t * dy))
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::scenario::{Component, ConnectOutcome};

	fn graph() -> (ScenarioGraph, String, String) {
		let mut g = ScenarioGraph::new();
		let e = g.add_component(Component::draft(ComponentKind::Event), Some(Position::new(100.0, 100.0)));
		let a = g.add_component(Component::draft(ComponentKind::Asset), Some(Position::new(300.0, 100.0)));
		g.begin_connection(Some(&e.id));
		assert!(matches!(g.complete_connection(&a.id), ConnectOutcome::Created(_)));
		(g, e.id, a.id)
	}

	#[test]
	fn hit_testing_respects_transform() {
		let (g, e, _) = graph();
		let mut s = CanvasState::new(800.0, 600.0);
		s.sync(&g);
		assert_eq!(s.component_at_position(100.0, 100.0), Some(e.clone()));

		s.transform = ViewTransform { x: 50.0, y: 0.0, k: 2.0 };
		assert_eq!(s.component_at_position(250.0, 200.0), Some(e));
		assert_eq!(s.component_at_position(100.0, 100.0), None);
	}

	#[test]
	fn press_without_travel_is_a_click() {
		let (g, e, _) = graph();
		let mut s = CanvasState::new(800.0, 600.0);
		s.sync(&g);
		s.press(100.0, 100.0);
		s.pointer_move(101.0, 101.0);
		assert_eq!(s.release(), Release::Click(e.clone()));
		assert_eq!(s.selected.as_deref(), Some(e.as_str()));
	}

	#[test]
	fn drag_reports_final_graph_position() {
		let (g, e, _) = graph();
		let mut s = CanvasState::new(800.0, 600.0);
		s.transform.k = 2.0;
		s.sync(&g);
		s.press(200.0, 200.0);
		s.pointer_move(240.0, 220.0);
		assert_eq!(s.release(), Release::Moved(e, Position::new(120.0, 110.0)));
	}

	#[test]
	fn resync_keeps_dragged_node_in_hand() {
		let (mut g, e, _) = graph();
		let mut s = CanvasState::new(800.0, 600.0);
		s.sync(&g);
		s.press(100.0, 100.0);
		s.pointer_move(150.0, 100.0);
		g.add_component(Component::draft(ComponentKind::Defense), None);
		s.sync(&g);
		assert_eq!(s.node(&e).map(|n| n.x), Some(150.0));
		assert_eq!(s.nodes.len(), 3);
	}

	#[test]
	fn background_drag_pans() {
		let mut s = CanvasState::new(800.0, 600.0);
		s.press(10.0, 10.0);
		s.pointer_move(30.0, 5.0);
		assert_eq!(s.release(), Release::None);
		assert_eq!((s.transform.x, s.transform.y), (20.0, -5.0));
	}

	#[test]
	fn hover_highlights_neighbours() {
		let (g, e, a) = graph();
		let mut s = CanvasState::new(800.0, 600.0);
		s.sync(&g);
		s.pointer_move(300.0, 100.0);
		assert!(s.is_highlighted(&a));
		assert!(s.is_highlighted(&e));
		s.cancel();
		assert!(!s.is_highlighted(&e));
	}

	#[test]
	fn clicking_a_line_finds_the_connection() {
		let (g, e, a) = graph();
		let mut s = CanvasState::new(800.0, 600.0);
		s.sync(&g);
		assert_eq!(s.connection_at_position(200.0, 103.0), Some((e, a)));
		assert_eq!(s.connection_at_position(200.0, 140.0), None);
	}

	#[test]
	fn zoom_keeps_point_under_cursor() {
		let mut s = CanvasState::new(800.0, 600.0);
		let before = s.screen_to_graph(400.0, 300.0);
		s.zoom_at(400.0, 300.0, -1.0);
		let after = s.screen_to_graph(400.0, 300.0);
		assert!((before.0 - after.0).abs() < 1e-9 && (before.1 - after.1).abs() < 1e-9);
		assert!(s.transform.k > 1.0);
	}
}
