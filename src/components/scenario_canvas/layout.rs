//! Force-directed placement of scenario components.

use std::collections::HashMap;
use std::f64::consts::PI;

use force_graph::{EdgeData, ForceGraph, NodeData, SimulationParameters};

use crate::scenario::{Position, ScenarioGraph};

/// Runs the simulation for `iterations` steps and returns new positions
/// centred on `center`. Components start from where they are now.
pub fn auto_arrange(graph: &ScenarioGraph, iterations: usize, center: Position) -> Vec<(String, Position)> {
	let components = graph.components();
	if components.is_empty() {
		return Vec::new();
	}

	let mut sim: ForceGraph<String, ()> = ForceGraph::new(SimulationParameters {
		force_charge: 12000.0,
		force_spring: 0.05,
		force_max: 280.0,
		node_speed: 7000.0,
		damping_factor: 0.95,
	});
	let mut index = HashMap::new();
	let n = components.len() as f64;
	for (i, component) in components.iter().enumerate() {
		// nudge so coincident components separate
		let angle = i as f64 * 2.0 * PI / n;
		let idx = sim.add_node(NodeData {
			x: (component.position.x + 10.0 * angle.cos()) as f32,
			y: (component.position.y + 10.0 * angle.sin()) as f32,
			mass: 10.0,
			is_anchor: false,
			user_data: component.id.clone(),
		});
		index.insert(component.id.as_str(), idx);
	}
	for connection in graph.connections() {
		if let (Some(&a), Some(&b)) = (
			index.get(connection.from.as_str()),
			index.get(connection.to.as_str()),
		) {
			sim.add_edge(a, b, EdgeData::default());
		}
	}

	for _ in 0..iterations {
		sim.update(0.016);
	}

	let mut placed = Vec::with_capacity(components.len());
	sim.visit_nodes(|node| {
		let (x, y) = (node.x() as f64, node.y() as f64);
		if x.is_finite() && y.is_finite() {
			placed.push((node.data.user_data.clone(), Position::new(x, y)));
		}
	});
	if placed.is_empty() {
		return placed;
	}

	let count = placed.len() as f64;
	let (cx, cy) = placed
		.iter()
		.fold((0.0, 0.0), |(sx, sy), (_, p)| (sx + p.x, sy + p.y));
	let (shift_x, shift_y) = (center.x - cx / count, center.y - cy / count);
	for (_, p) in &mut placed {
		p.x += shift_x;
		p.y += shift_y;
	}
	log::debug!("arranged {} components over {iterations} steps", placed.len());
	placed
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::scenario::{Component, ComponentKind};

	#[test]
	fn stacked_components_are_spread_and_centred() {
		let mut g = ScenarioGraph::new();
		let here = Some(Position::new(50.0, 50.0));
		let e = g.add_component(Component::draft(ComponentKind::Event), here);
		let a = g.add_component(Component::draft(ComponentKind::Asset), here);
		g.add_component(Component::draft(ComponentKind::Defense), here);
		g.begin_connection(Some(&e.id));
		g.complete_connection(&a.id);

		let placed = auto_arrange(&g, 200, Position::new(400.0, 300.0));
		assert_eq!(placed.len(), 3);

		let (cx, cy) = placed
			.iter()
			.fold((0.0, 0.0), |(x, y), (_, p)| (x + p.x / 3.0, y + p.y / 3.0));
		assert!((cx - 400.0).abs() < 1e-6 && (cy - 300.0).abs() < 1e-6);

		for (i, (_, p)) in placed.iter().enumerate() {
			for (_, q) in &placed[i + 1..] {
				assert!((p.x - q.x).hypot(p.y - q.y) > 1.0);
			}
		}
	}

	#[test]
	fn empty_graph_has_nothing_to_place() {
		assert!(auto_arrange(&ScenarioGraph::new(), 10, Position::default()).is_empty());
	}
}
