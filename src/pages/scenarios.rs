use leptos::prelude::*;
use leptos::task::spawn_local;
use leptos_router::components::A;

use crate::components::ErrorBanner;
use crate::scenario::{Scenario, sync};
use crate::state::AppState;

fn confirm(message: &str) -> bool {
	web_sys::window()
		.and_then(|w| w.confirm_with_message(message).ok())
		.unwrap_or(false)
}

/// Saved scenarios with open and delete actions.
#[component]
pub fn ScenariosPage() -> impl IntoView {
	let app = expect_context::<AppState>();
	let scenarios = RwSignal::new(Option::<Vec<Scenario>>::None);
	let error = RwSignal::new(Option::<String>::None);

	let client = app.client.clone();
	spawn_local(async move {
		match sync::list_scenarios(&client).await {
			Ok(list) => scenarios.set(Some(list)),
			Err(err) => {
				scenarios.set(Some(Vec::new()));
				error.set(Some(err.to_string()));
			}
		}
	});

	let delete = move |id: String, name: String| {
		if !confirm(&format!("Delete scenario \"{name}\"?")) {
			return;
		}
		let client = app.client.clone();
		spawn_local(async move {
			match sync::delete_scenario(&client, &id).await {
				Ok(()) => scenarios.update(|list| {
					if let Some(list) = list {
						list.retain(|s| s.id.as_deref() != Some(id.as_str()));
					}
				}),
				Err(err) => error.set(Some(err.to_string())),
			}
		});
	};

	view! {
		<div class="page page-scenarios">
			<header class="page-header">
				<h1>"Scenarios"</h1>
				<A href="/scenarios/new">"New scenario"</A>
			</header>
			<ErrorBanner error=error />
			{move || match scenarios.get() {
				None => view! { <p class="loading">"Loading scenarios..."</p> }.into_any(),
				Some(list) if list.is_empty() => {
					view! { <p class="hint">"No scenarios yet. Create one to start modelling risk."</p> }
						.into_any()
				}
				Some(list) => view! {
					<table class="scenario-table">
						<thead>
							<tr>
								<th>"Name"</th>
								<th>"Status"</th>
								<th>"Components"</th>
								<th></th>
							</tr>
						</thead>
						<tbody>
							{list
								.into_iter()
								.filter_map(|s| {
									let id = s.id.clone()?;
									let (delete_id, name) = (id.clone(), s.name.clone());
									let delete = delete.clone();
									Some(view! {
										<tr>
											<td>
												<A href=format!("/scenarios/{id}")>{s.name.clone()}</A>
												<div class="hint">{s.description.clone()}</div>
											</td>
											<td>{s.status.as_str()}</td>
											<td>{s.inputs.nodes.len()}</td>
											<td>
												<button
													type="button"
													class="btn btn-danger"
													on:click=move |_| delete(delete_id.clone(), name.clone())
												>
													"Delete"
												</button>
											</td>
										</tr>
									})
								})
								.collect_view()}
						</tbody>
					</table>
				}
				.into_any(),
			}}
		</div>
	}
}
