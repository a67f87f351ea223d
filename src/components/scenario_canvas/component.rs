use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use leptos::prelude::*;
use wasm_bindgen::prelude::*;
use web_sys::{CanvasRenderingContext2d, DragEvent, HtmlCanvasElement, MouseEvent, WheelEvent};

use super::render;
use super::state::{CanvasState, Release};
use crate::scenario::{ComponentKind, Position, ScenarioGraph};

/// `DataTransfer` type the palette sets when a component kind is dragged.
pub const DRAG_KIND: &str = "application/x-scenario-component";

type Frame = Rc<RefCell<Option<Closure<dyn FnMut()>>>>;

fn local_point(canvas: &NodeRef<leptos::html::Canvas>, ev: &MouseEvent) -> Option<(f64, f64)> {
	let canvas: HtmlCanvasElement = canvas.get()?.into();
	let rect = canvas.get_bounding_client_rect();
	Some((
		ev.client_x() as f64 - rect.left(),
		ev.client_y() as f64 - rect.top(),
	))
}

fn parent_size(canvas: &HtmlCanvasElement) -> (f64, f64) {
	canvas
		.parent_element()
		.map(|p| (p.client_width() as f64, p.client_height() as f64))
		.filter(|(w, h)| *w > 0.0 && *h > 0.0)
		.unwrap_or((800.0, 600.0))
}

/// Pan/zoom canvas showing the scenario graph.
///
/// Clicks, drags, double-clicks on a connection and palette drops are
/// reported through the callbacks; the graph itself is only read.
#[component]
pub fn ScenarioCanvas(
	#[prop(into)] graph: Signal<ScenarioGraph>,
	#[prop(into)] on_select: Callback<String>,
	#[prop(into)] on_move: Callback<(String, Position)>,
	#[prop(into)] on_drop: Callback<(ComponentKind, Position)>,
	#[prop(into)] on_delete_connection: Callback<(String, String)>,
	#[prop(into, optional)] on_background: Option<Callback<()>>,
) -> impl IntoView {
	let canvas_ref = NodeRef::<leptos::html::Canvas>::new();
	let state: Rc<RefCell<Option<CanvasState>>> = Rc::new(RefCell::new(None));
	let animate: Frame = Rc::new(RefCell::new(None));
	let resize_cb: Frame = Rc::new(RefCell::new(None));
	let alive = Arc::new(AtomicBool::new(true));
	let (state_init, animate_init, resize_cb_init, alive_init) =
		(state.clone(), animate.clone(), resize_cb.clone(), alive.clone());

	let alive_cleanup = alive.clone();
	on_cleanup(move || alive_cleanup.store(false, Ordering::Relaxed));

	Effect::new(move |_| {
		let Some(canvas) = canvas_ref.get() else {
			return;
		};
		if state_init.borrow().is_some() {
			return;
		}
		let canvas: HtmlCanvasElement = canvas.into();
		let Some(window) = web_sys::window() else {
			return;
		};
		let (w, h) = parent_size(&canvas);
		canvas.set_width(w as u32);
		canvas.set_height(h as u32);

		let Some(ctx) = canvas
			.get_context("2d")
			.ok()
			.flatten()
			.and_then(|c| c.dyn_into::<CanvasRenderingContext2d>().ok())
		else {
			log::error!("canvas 2d context unavailable");
			return;
		};
		let mut initial = CanvasState::new(w, h);
		initial.sync(&graph.get_untracked());
		*state_init.borrow_mut() = Some(initial);

		let (state_resize, canvas_resize) = (state_init.clone(), canvas.clone());
		*resize_cb_init.borrow_mut() = Some(Closure::new(move || {
			let (nw, nh) = parent_size(&canvas_resize);
			canvas_resize.set_width(nw as u32);
			canvas_resize.set_height(nh as u32);
			if let Some(ref mut s) = *state_resize.borrow_mut() {
				s.resize(nw, nh);
			}
		}));
		if let Some(ref cb) = *resize_cb_init.borrow() {
			let _ = window.add_event_listener_with_callback("resize", cb.as_ref().unchecked_ref());
		}

		let (state_anim, animate_inner, alive_anim) =
			(state_init.clone(), animate_init.clone(), alive_init.clone());
		*animate_init.borrow_mut() = Some(Closure::new(move || {
			if !alive_anim.load(Ordering::Relaxed) {
				return;
			}
			if let Some(ref mut s) = *state_anim.borrow_mut() {
				s.tick(0.016);
				render::render(s, &ctx);
			}
			if let (Some(cb), Some(win)) = (&*animate_inner.borrow(), web_sys::window()) {
				let _ = win.request_animation_frame(cb.as_ref().unchecked_ref());
			}
		}));
		if let Some(ref cb) = *animate_init.borrow() {
			let _ = window.request_animation_frame(cb.as_ref().unchecked_ref());
		}
	});

	let state_sync = state.clone();
	Effect::new(move |_| {
		let current = graph.get();
		if let Some(ref mut s) = *state_sync.borrow_mut() {
			s.sync(&current);
		}
	});

	let state_md = state.clone();
	let on_mousedown = move |ev: MouseEvent| {
		let Some((x, y)) = local_point(&canvas_ref, &ev) else {
			return;
		};
		if let Some(ref mut s) = *state_md.borrow_mut() {
			s.press(x, y);
		}
	};

	let state_mm = state.clone();
	let on_mousemove = move |ev: MouseEvent| {
		let Some((x, y)) = local_point(&canvas_ref, &ev) else {
			return;
		};
		if let Some(ref mut s) = *state_mm.borrow_mut() {
			s.pointer_move(x, y);
		}
	};

	let state_mu = state.clone();
	let on_mouseup = move |_: MouseEvent| {
		// release before running callbacks, which may update the graph and resync
		let released = state_mu
			.borrow_mut()
			.as_mut()
			.map(CanvasState::release)
			.unwrap_or(Release::None);
		match released {
			Release::Click(id) => on_select.run(id),
			Release::Moved(id, position) => on_move.run((id, position)),
			Release::BackgroundClick => {
				if let Some(cb) = on_background {
					cb.run(());
				}
			}
			Release::None => {}
		}
	};

	let state_ml = state.clone();
	let on_mouseleave = move |_: MouseEvent| {
		if let Some(ref mut s) = *state_ml.borrow_mut() {
			s.cancel();
		}
	};

	let state_dbl = state.clone();
	let on_dblclick = move |ev: MouseEvent| {
		let Some((x, y)) = local_point(&canvas_ref, &ev) else {
			return;
		};
		let hit = state_dbl
			.borrow()
			.as_ref()
			.and_then(|s| s.connection_at_position(x, y));
		if let Some(ids) = hit {
			on_delete_connection.run(ids);
		}
	};

	let state_wh = state.clone();
	let on_wheel = move |ev: WheelEvent| {
		ev.prevent_default();
		let Some((x, y)) = local_point(&canvas_ref, &ev) else {
			return;
		};
		if let Some(ref mut s) = *state_wh.borrow_mut() {
			s.zoom_at(x, y, ev.delta_y());
		}
	};

	let on_dragover = move |ev: DragEvent| ev.prevent_default();

	let state_drop = state.clone();
	let on_drop_ev = move |ev: DragEvent| {
		ev.prevent_default();
		let kind = ev
			.data_transfer()
			.and_then(|dt| dt.get_data(DRAG_KIND).ok())
			.and_then(|raw| ComponentKind::parse(&raw));
		let (Some(kind), Some((x, y))) = (kind, local_point(&canvas_ref, &ev)) else {
			return;
		};
		let point = state_drop.borrow().as_ref().map(|s| s.screen_to_graph(x, y));
		if let Some((gx, gy)) = point {
			on_drop.run((kind, Position::new(gx, gy)));
		}
	};

	view! {
		<canvas
			node_ref=canvas_ref
			class="scenario-canvas"
			on:mousedown=on_mousedown
			on:mousemove=on_mousemove
			on:mouseup=on_mouseup
			on:mouseleave=on_mouseleave
			on:dblclick=on_dblclick
			on:wheel=on_wheel
			on:dragover=on_dragover
			on:drop=on_drop_ev
			style="display: block; cursor: grab;"
		/>
	}
}
