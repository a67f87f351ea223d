//! Shared form controls.

use leptos::prelude::*;

use crate::error::FieldError;

/// Labelled input bound to a string signal.
///
/// When `errors` holds an entry for `field`, its message is shown under the
/// input.
#[component]
pub fn FormField(
	#[prop(into)] label: String,
	value: RwSignal<String>,
	#[prop(optional)] field: &'static str,
	#[prop(optional)] errors: Option<RwSignal<Vec<FieldError>>>,
	#[prop(default = "text")] input_type: &'static str,
	#[prop(optional, into)] placeholder: String,
) -> impl IntoView {
	let message = move || {
		errors.and_then(|errors| {
			errors.with(|list| list.iter().find(|e| e.field == field).map(|e| e.message.clone()))
		})
	};
	view! {
		<div class="form-field" class:has-error=move || message().is_some()>
			<label class="form-label">{label}</label>
			<input
				type=input_type
				class="form-input"
				placeholder=placeholder
				prop:value=move || value.get()
				on:input=move |e| value.set(event_target_value(&e))
			/>
			{move || message().map(|m| view! { <span class="form-error">{m}</span> })}
		</div>
	}
}

/// Dismissable banner for the last failure.
#[component]
pub fn ErrorBanner(error: RwSignal<Option<String>>) -> impl IntoView {
	move || {
		error.get().map(|message| {
			view! {
				<div class="form-error-banner">
					<span>{message}</span>
					<button type="button" class="banner-close" on:click=move |_| error.set(None)>
						"×"
					</button>
				</div>
			}
		})
	}
}
