use leptos::prelude::*;
use web_sys::DragEvent;

use super::scenario_canvas::DRAG_KIND;
use crate::scenario::ComponentKind;

/// Component kinds that can be dragged onto the canvas, or clicked to add
/// one at the default spot.
#[component]
pub fn Palette(
	#[prop(into)] on_add: Callback<ComponentKind>,
	#[prop(into)] disabled: Signal<bool>,
) -> impl IntoView {
	view! {
		<aside class="palette">
			<h3>"Components"</h3>
			{ComponentKind::ALL
				.into_iter()
				.map(|kind| {
					let on_dragstart = move |ev: DragEvent| {
						if let Some(dt) = ev.data_transfer() {
							let _ = dt.set_data(DRAG_KIND, kind.as_str());
						}
					};
					view! {
						<button
							type="button"
							class=format!("palette-item palette-{}", kind.as_str())
							draggable="true"
							disabled=move || disabled.get()
							on:dragstart=on_dragstart
							on:click=move |_| on_add.run(kind)
						>
							{kind.label()}
						</button>
					}
				})
				.collect_view()}
			<p class="hint">"Drag onto the canvas, or click to add."</p>
		</aside>
	}
}
