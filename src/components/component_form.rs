//! Create/edit modal for one canvas component.

use leptos::prelude::*;

use crate::error::FieldError;
use crate::scenario::convert::to_percent;
use crate::scenario::types::{AssetAttrs, Attributes, Criticality, DefenseAttrs, EventAttrs};
use crate::scenario::validate::{self, parse_number, parse_percent};
use crate::scenario::{Component, ComponentKind};

/// Raw text of every modal input. Percentages are entered as 0-100.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FormValues {
	pub name: String,
	pub description: String,
	pub likelihood: String,
	pub severity: String,
	pub duration_hrs: String,
	pub category: String,
	pub valuation: String,
	pub criticality: String,
	pub location: String,
	pub mitigation: String,
	pub annual_cost: String,
}

impl FormValues {
	pub fn from_component(c: &Component) -> Self {
		let mut values = Self {
			name: c.name.clone(),
			description: c.description.clone(),
			..Self::default()
		};
		match &c.attributes {
			Attributes::Event(e) => {
				values.likelihood = trim_float(to_percent(e.likelihood));
				values.severity = trim_float(e.severity);
				values.duration_hrs = trim_float(e.duration_hrs);
				values.category = e.category.clone();
			}
			Attributes::Asset(a) => {
				values.valuation = trim_float(a.valuation);
				values.criticality = a.criticality.as_str().to_string();
				values.location = a.location.clone();
			}
			Attributes::Defense(d) => {
				values.mitigation = trim_float(to_percent(d.mitigation_pct));
				values.annual_cost = trim_float(d.annual_cost_usd);
			}
		}
		values
	}

	/// Applies the inputs to `base`, keeping its id, position and remote id.
	pub fn apply(&self, base: &Component) -> Result<Component, Vec<FieldError>> {
		let mut errors = Vec::new();
		let mut updated = base.clone();
		updated.name = self.name.trim().to_string();
		updated.description = self.description.trim().to_string();
		updated.attributes = match base.kind() {
			ComponentKind::Event => Attributes::Event(EventAttrs {
				likelihood: collect(parse_percent("likelihood", &self.likelihood), &mut errors),
				severity: collect(parse_number("severity", &self.severity), &mut errors),
				duration_hrs: collect(parse_number("durationHrs", &self.duration_hrs), &mut errors),
				category: self.category.trim().to_string(),
			}),
			ComponentKind::Asset => Attributes::Asset(AssetAttrs {
				valuation: collect(parse_number("valuation", &self.valuation), &mut errors),
				criticality: Criticality::parse(&self.criticality).unwrap_or_default(),
				location: self.location.trim().to_string(),
			}),
			ComponentKind::Defense => Attributes::Defense(DefenseAttrs {
				mitigation_pct: collect(parse_percent("mitigationPct", &self.mitigation), &mut errors),
				annual_cost_usd: collect(parse_number("annualCostUsd", &self.annual_cost), &mut errors),
			}),
		};
		if !errors.is_empty() {
			if updated.name.is_empty() {
				errors.insert(0, FieldError::new("name", "Name is required"));
			}
			return Err(errors);
		}
		validate::component(&updated)?;
		Ok(updated)
	}
}

fn collect(parsed: Result<f64, FieldError>, errors: &mut Vec<FieldError>) -> f64 {
	parsed.unwrap_or_else(|err| {
		errors.push(err);
		0.0
	})
}

/// `15.000000000000002` -> `15`, `0.5` -> `0.5`.
fn trim_float(value: f64) -> String {
	let rounded = (value * 1e6).round() / 1e6;
	if rounded.fract() == 0.0 {
		format!("{rounded:.0}")
	} else {
		rounded.to_string()
	}
}

fn input_row(
	values: RwSignal<FormValues>,
	errors: RwSignal<Vec<FieldError>>,
	label: &'static str,
	field: &'static str,
	get: fn(&FormValues) -> &String,
	set: fn(&mut FormValues, String),
) -> impl IntoView {
	let message = move || {
		errors.with(|list| list.iter().find(|e| e.field == field).map(|e| e.message.clone()))
	};
	view! {
		<div class="form-field" class:has-error=move || message().is_some()>
			<label class="form-label">{label}</label>
			<input
				type="text"
				class="form-input"
				prop:value=move || values.with(|v| get(v).clone())
				on:input=move |e| values.update(|v| set(v, event_target_value(&e)))
			/>
			{move || message().map(|m| view! { <span class="form-error">{m}</span> })}
		</div>
	}
}

fn kind_fields(
	kind: ComponentKind,
	values: RwSignal<FormValues>,
	errors: RwSignal<Vec<FieldError>>,
) -> AnyView {
	match kind {
		ComponentKind::Event => view! {
			{input_row(values, errors, "Likelihood (%)", "likelihood", |v| &v.likelihood, |v, s| v.likelihood = s)}
			{input_row(values, errors, "Severity ($)", "severity", |v| &v.severity, |v, s| v.severity = s)}
			{input_row(values, errors, "Duration (hours)", "durationHrs", |v| &v.duration_hrs, |v, s| v.duration_hrs = s)}
			{input_row(values, errors, "Category", "category", |v| &v.category, |v, s| v.category = s)}
		}
		.into_any(),
		ComponentKind::Asset => view! {
			{input_row(values, errors, "Valuation ($)", "valuation", |v| &v.valuation, |v, s| v.valuation = s)}
			<div class="form-field">
				<label class="form-label">"Criticality"</label>
				<select
					class="form-input"
					prop:value=move || values.with(|v| v.criticality.clone())
					on:change=move |e| values.update(|v| v.criticality = event_target_value(&e))
				>
					{Criticality::ALL
						.into_iter()
						.map(|c| view! { <option value=c.as_str()>{c.as_str()}</option> })
						.collect_view()}
				</select>
			</div>
			{input_row(values, errors, "Location", "location", |v| &v.location, |v, s| v.location = s)}
		}
		.into_any(),
		ComponentKind::Defense => view! {
			{input_row(values, errors, "Mitigation (%)", "mitigationPct", |v| &v.mitigation, |v, s| v.mitigation = s)}
			{input_row(values, errors, "Annual cost ($)", "annualCostUsd", |v| &v.annual_cost, |v, s| v.annual_cost = s)}
		}
		.into_any(),
	}
}

/// Modal form for `draft`. Saving is blocked until every field validates.
#[component]
pub fn ComponentModal(
	draft: Component,
	is_new: bool,
	#[prop(into)] on_save: Callback<Component>,
	#[prop(into)] on_cancel: Callback<()>,
	#[prop(into, optional)] on_delete: Option<Callback<String>>,
	#[prop(into, optional)] on_connect: Option<Callback<String>>,
) -> impl IntoView {
	let kind = draft.kind();
	let values = RwSignal::new(FormValues::from_component(&draft));
	let errors = RwSignal::new(Vec::<FieldError>::new());
	let base = StoredValue::new(draft);

	let submit = move |_: web_sys::MouseEvent| {
		let result = base.with_value(|b| values.with(|v| v.apply(b)));
		match result {
			Ok(component) => {
				errors.set(Vec::new());
				on_save.run(component);
			}
			Err(list) => errors.set(list),
		}
	};
	let component_id = move || base.with_value(|b| b.id.clone());
	let title = format!("{} {}", if is_new { "Add" } else { "Edit" }, kind.label());

	view! {
		<div class="modal-backdrop" on:click=move |_| on_cancel.run(())>
			<div class="modal" on:click=|e| e.stop_propagation()>
				<h2>{title}</h2>
				<form on:submit=|e| e.prevent_default()>
					{input_row(values, errors, "Name", "name", |v| &v.name, |v, s| v.name = s)}
					{input_row(values, errors, "Description", "description", |v| &v.description, |v, s| v.description = s)}
					{kind_fields(kind, values, errors)}
					<div class="modal-actions">
						{(!is_new)
							.then_some(on_delete)
							.flatten()
							.map(|cb| {
								view! {
									<button type="button" class="btn btn-danger" on:click=move |_| cb.run(component_id())>
										"Delete"
									</button>
								}
							})}
						{(!is_new)
							.then_some(on_connect)
							.flatten()
							.map(|cb| {
								view! {
									<button type="button" class="btn" on:click=move |_| cb.run(component_id())>
										"Connect from here"
									</button>
								}
							})}
						<span class="nav-spacer"></span>
						<button type="button" class="btn btn-ghost" on:click=move |_| on_cancel.run(())>
							"Cancel"
						</button>
						<button type="submit" class="btn btn-primary" on:click=submit>
							{if is_new { "Add" } else { "Save" }}
						</button>
					</div>
				</form>
			</div>
		</div>
	}
}
