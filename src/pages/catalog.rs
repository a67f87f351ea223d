use leptos::prelude::*;
use leptos::task::spawn_local;
use leptos_router::hooks::use_params_map;

use crate::api::catalog::{self, CatalogRecord, fields, record_from_form};
use crate::components::ErrorBanner;
use crate::config::Catalog;
use crate::pages::not_found::NotFound;
use crate::state::AppState;

fn defaults(catalog: Catalog) -> Vec<(&'static str, String)> {
	fields(catalog)
		.iter()
		.map(|spec| (spec.key, spec.default.to_string()))
		.collect()
}

/// Catalog screen for the `:kind` route segment.
#[component]
pub fn CatalogPage() -> impl IntoView {
	let params = use_params_map();
	let catalog = move || params.with(|p| p.get("kind")).and_then(|k| Catalog::from_key(&k));
	move || match catalog() {
		Some(catalog) => view! { <CatalogView catalog=catalog /> }.into_any(),
		None => view! { <NotFound /> }.into_any(),
	}
}

#[component]
fn CatalogView(catalog: Catalog) -> impl IntoView {
	let app = expect_context::<AppState>();
	let records = RwSignal::new(Vec::<CatalogRecord>::new());
	let loading = RwSignal::new(true);
	let error = RwSignal::new(Option::<String>::None);

	let name = RwSignal::new(String::new());
	let values = RwSignal::new(defaults(catalog));
	let editing = RwSignal::new(Option::<String>::None);

	let client = StoredValue::new(app.client.clone());
	spawn_local(async move {
		match catalog::list(&client.get_value(), catalog).await {
			Ok(list) => records.set(list),
			Err(err) => error.set(Some(err.to_string())),
		}
		loading.set(false);
	});

	let reset = move || {
		name.set(String::new());
		values.set(defaults(catalog));
		editing.set(None);
	};

	let start_edit = move |record: CatalogRecord| {
		name.set(record.name.clone());
		values.set(
			fields(catalog)
				.iter()
				.map(|spec| {
					let current = record.text(spec.key);
					(spec.key, if current == "-" { String::new() } else { current })
				})
				.collect(),
		);
		editing.set(record.id);
	};

	let on_save = move |_: web_sys::MouseEvent| {
		let record = match values.with(|v| record_from_form(catalog, &name.get_untracked(), v)) {
			Ok(record) => record,
			Err(err) => {
				error.set(Some(err.to_string()));
				return;
			}
		};
		error.set(None);
		let client = client.get_value();
		let target = editing.get_untracked();
		spawn_local(async move {
			let result = match &target {
				Some(id) => catalog::update(&client, catalog, id, &record).await.map(|()| CatalogRecord {
					id: Some(id.clone()),
					..record
				}),
				None => catalog::create(&client, catalog, &record).await,
			};
			match result {
				Ok(saved) => {
					records.update(|list| match list.iter_mut().find(|r| r.id == saved.id) {
						Some(existing) => *existing = saved,
						None => list.push(saved),
					});
					reset();
				}
				Err(err) => error.set(Some(err.to_string())),
			}
		});
	};

	let delete = move |id: String| {
		let client = client.get_value();
		spawn_local(async move {
			match catalog::delete(&client, catalog, &id).await {
				Ok(()) => records.update(|list| list.retain(|r| r.id.as_deref() != Some(id.as_str()))),
				Err(err) => error.set(Some(err.to_string())),
			}
		});
	};

	let specs = fields(catalog);

	view! {
		<div class="page page-catalog">
			<header class="page-header">
				<h1>{catalog.title()}</h1>
			</header>
			<ErrorBanner error=error />

			<form class="catalog-form" on:submit=|e| e.prevent_default()>
				<div class="form-field">
					<label class="form-label">"Name"</label>
					<input
						type="text"
						class="form-input"
						prop:value=move || name.get()
						on:input=move |e| name.set(event_target_value(&e))
					/>
				</div>
				{specs
					.iter()
					.enumerate()
					.map(|(i, spec)| {
						view! {
							<div class="form-field">
								<label class="form-label">{spec.label}</label>
								<input
									type=if spec.numeric { "number" } else { "text" }
									class="form-input"
									prop:value=move || values.with(|v| v.get(i).map(|(_, s)| s.clone()).unwrap_or_default())
									on:input=move |e| {
										let text = event_target_value(&e);
										values.update(|v| {
											if let Some(slot) = v.get_mut(i) {
												slot.1 = text;
											}
										})
									}
								/>
							</div>
						}
					})
					.collect_view()}
				<div class="form-actions">
					<button type="submit" class="btn btn-primary" on:click=on_save>
						{move || if editing.with(Option::is_some) { "Save changes" } else { "Add" }}
					</button>
					<Show when=move || editing.with(Option::is_some)>
						<button type="button" class="btn btn-ghost" on:click=move |_| reset()>
							"Cancel"
						</button>
					</Show>
				</div>
			</form>

			<Show
				when=move || !loading.get()
				fallback=|| view! { <p class="loading">"Loading..."</p> }
			>
				<table class="catalog-table">
					<thead>
						<tr>
							<th>"Name"</th>
							{specs.iter().map(|spec| view! { <th>{spec.label}</th> }).collect_view()}
							<th></th>
						</tr>
					</thead>
					<tbody>
						{move || {
							records
								.get()
								.into_iter()
								.map(|record| {
									let id = record.id.clone().unwrap_or_default();
									let cells = specs
										.iter()
										.map(|spec| view! { <td>{record.text(spec.key)}</td> })
										.collect_view();
									let name = record.name.clone();
									view! {
										<tr>
											<td>{name}</td>
											{cells}
											<td>
												<button
													type="button"
													class="btn btn-ghost"
													on:click=move |_| start_edit(record.clone())
												>
													"Edit"
												</button>
												<button
													type="button"
													class="btn btn-danger"
													on:click=move |_| delete(id.clone())
												>
													"Delete"
												</button>
											</td>
										</tr>
									}
								})
								.collect_view()
						}}
					</tbody>
				</table>
			</Show>
		</div>
	}
}
