use std::f64::consts::PI;

use wasm_bindgen::JsValue;
use web_sys::CanvasRenderingContext2d;

use super::state::{CanvasState, NODE_RADIUS, edge_rgb, kind_color};

fn ease_out_cubic(t: f64) -> f64 {
	1.0 - (1.0 - t).powi(3)
}

pub fn render(state: &CanvasState, ctx: &CanvasRenderingContext2d) {
	ctx.set_fill_style_str("#0f172a");
	ctx.fill_rect(0.0, 0.0, state.width, state.height);
	ctx.save();
	let _ = ctx.translate(state.transform.x, state.transform.y);
	let _ = ctx.scale(state.transform.k, state.transform.k);
	draw_edges(state, ctx);
	draw_nodes(state, ctx);
	ctx.restore();
}

fn draw_edges(state: &CanvasState, ctx: &CanvasRenderingContext2d) {
	let k = state.transform.k;
	let (line_width, dash, gap, arrow_size) = (2.0 / k, 8.0 / k, 4.0 / k, 10.0 / k);
	let dash_offset = -(state.flow_time * 30.0) % (dash + gap);
	let t = ease_out_cubic(state.hover.highlight_t);

	for edge in &state.edges {
		let (Some(a), Some(b)) = (state.node(&edge.from), state.node(&edge.to)) else {
			continue;
		};
		let (dx, dy) = (b.x - a.x, b.y - a.y);
		let dist = dx.hypot(dy);
		if dist < NODE_RADIUS * 2.0 {
			continue;
		}

		let lit = state.is_highlighted(&edge.from) && state.is_highlighted(&edge.to);
		// t=0: every edge at 0.7; t=1: lit edges at 1.0, the rest at 0.2
		let (alpha, width) = if lit {
			(0.7 + 0.3 * t, line_width * (1.0 + 0.3 * t))
		} else {
			(0.7 - 0.5 * t, line_width * (1.0 - 0.3 * t))
		};
		let rgb = edge_rgb(edge.edge_type);

		ctx.set_stroke_style_str(&format!("rgba({rgb}, {alpha})"));
		ctx.set_line_width(width);
		let _ = ctx.set_line_dash(&js_sys::Array::of2(
			&JsValue::from_f64(dash),
			&JsValue::from_f64(gap),
		));
		ctx.set_line_dash_offset(dash_offset);

		let (ux, uy) = (dx / dist, dy / dist);
		ctx.begin_path();
		ctx.move_to(a.x + ux * NODE_RADIUS, a.y + uy * NODE_RADIUS);
		ctx.line_to(
			b.x - ux * (NODE_RADIUS + arrow_size),
			b.y - uy * (NODE_RADIUS + arrow_size),
		);
		ctx.stroke();

		let _ = ctx.set_line_dash(&js_sys::Array::new());
		ctx.set_fill_style_str(&format!("rgba({rgb}, {})", (alpha + 0.1).min(1.0)));
		let (tip_x, tip_y) = (b.x - ux * NODE_RADIUS, b.y - uy * NODE_RADIUS);
		let (back_x, back_y) = (tip_x - ux * arrow_size, tip_y - uy * arrow_size);
		let (px, py) = (-uy * arrow_size * 0.5, ux * arrow_size * 0.5);
		ctx.begin_path();
		ctx.move_to(tip_x, tip_y);
		ctx.line_to(back_x + px, back_y + py);
		ctx.line_to(back_x - px, back_y - py);
		ctx.close_path();
		ctx.fill();
	}
	let _ = ctx.set_line_dash(&js_sys::Array::new());
}

fn draw_nodes(state: &CanvasState, ctx: &CanvasRenderingContext2d) {
	let (has_highlight, t, k) = (
		state.hover.node.is_some(),
		ease_out_cubic(state.hover.highlight_t),
		state.transform.k,
	);
	let font = format!("{}px sans-serif", 12.0 / k.max(0.5));

	for node in &state.nodes {
		let lit = state.is_highlighted(&node.id);
		let hovered = state.hover.node.as_deref() == Some(node.id.as_str());
		let alpha = if has_highlight && !lit { 1.0 - 0.6 * t } else { 1.0 };
		let radius = if hovered {
			NODE_RADIUS * (1.0 + 0.15 * t)
		} else {
			NODE_RADIUS
		};
		let color = kind_color(node.kind);

		if hovered && t > 0.01 {
			if let Ok(gradient) =
				ctx.create_radial_gradient(node.x, node.y, radius * 0.5, node.x, node.y, radius * 1.8)
			{
				let _ = gradient.add_color_stop(0.0, &format!("rgba(255, 255, 255, {})", 0.3 * t));
				let _ = gradient.add_color_stop(1.0, "rgba(255, 255, 255, 0)");
				ctx.begin_path();
				let _ = ctx.arc(node.x, node.y, radius * 1.8, 0.0, 2.0 * PI);
				#[allow(deprecated)]
				ctx.set_fill_style(&gradient);
				ctx.fill();
			}
		}

		ctx.set_global_alpha(alpha);
		ctx.begin_path();
		let _ = ctx.arc(node.x, node.y, radius, 0.0, 2.0 * PI);
		ctx.set_fill_style_str(color);
		ctx.fill();

		let ring = if state.pending_source.as_deref() == Some(node.id.as_str()) {
			Some("#facc15")
		} else if state.selected.as_deref() == Some(node.id.as_str()) {
			Some("#f8fafc")
		} else {
			None
		};
		if let Some(ring) = ring {
			ctx.begin_path();
			let _ = ctx.arc(node.x, node.y, radius + 4.0 / k, 0.0, 2.0 * PI);
			ctx.set_stroke_style_str(ring);
			ctx.set_line_width(2.5 / k);
			ctx.stroke();
		}

		ctx.set_fill_style_str("white");
		ctx.set_font(&font);
		ctx.set_text_align("center");
		let _ = ctx.fill_text(node.kind.label(), node.x, node.y + 4.0);
		ctx.set_fill_style_str(&format!("rgba(226, 232, 240, {})", alpha));
		let _ = ctx.fill_text(&node.label, node.x, node.y + radius + 16.0 / k.max(0.5));
		ctx.set_global_alpha(1.0);
	}
	ctx.set_text_align("start");
}
