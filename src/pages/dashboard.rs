use leptos::prelude::*;
use leptos::task::spawn_local;
use serde_json::Value;

use crate::api::dashboard::{self, Dashboard};
use crate::components::ErrorBanner;
use crate::components::results_panel::format_timestamp;
use crate::state::AppState;

/// One line for a recent-activity entry, whatever fields the backend sent.
pub fn activity_text(entry: &Value) -> String {
	let text = |key: &str| entry.get(key).and_then(Value::as_str).filter(|s| !s.is_empty());
	let what = ["description", "message", "action", "title", "name"]
		.into_iter()
		.find_map(text)
		.unwrap_or("Activity");
	match ["timestamp", "created_at", "updated_at"].into_iter().find_map(text) {
		Some(when) => format!("{} - {what}", format_timestamp(when)),
		None => what.to_string(),
	}
}

/// Summary statistics and recent activity.
#[component]
pub fn DashboardPage() -> impl IntoView {
	let app = expect_context::<AppState>();
	let data = RwSignal::new(Option::<Dashboard>::None);
	let error = RwSignal::new(Option::<String>::None);

	let client = app.client.clone();
	spawn_local(async move {
		match dashboard::load(&client).await {
			Ok(loaded) => data.set(Some(loaded)),
			Err(err) => error.set(Some(err.to_string())),
		}
	});

	let user_name = move || {
		app.auth.with(|state| {
			state
				.user()
				.map(|u| u.display_name().to_string())
				.unwrap_or_else(|| "there".into())
		})
	};

	view! {
		<div class="page page-dashboard">
			<header class="page-header">
				<h1>"Welcome back, " {user_name}</h1>
				<a href="/scenarios/new" class="btn btn-primary">"New scenario"</a>
			</header>
			<ErrorBanner error=error />
			{move || match data.get() {
				None => view! { <p class="loading">"Loading dashboard..."</p> }.into_any(),
				Some(dashboard) => {
					let metrics = dashboard.metrics();
					let activity = dashboard.activity;
					view! {
						<section class="stat-cards">
							{if metrics.is_empty() {
								view! { <p class="hint">"No statistics yet."</p> }.into_any()
							} else {
								metrics
									.into_iter()
									.map(|(label, value)| {
										view! {
											<div class="stat-card">
												<span class="stat-label">{label}</span>
												<span class="stat-value">{value}</span>
											</div>
										}
									})
									.collect_view()
									.into_any()
							}}
						</section>
						<section class="recent-activity">
							<h2>"Recent activity"</h2>
							<ul>
								{activity
									.iter()
									.map(|entry| view! { <li>{activity_text(entry)}</li> })
									.collect_view()}
							</ul>
						</section>
					}
					.into_any()
				}
			}}
		</div>
	}
}

#[cfg(test)]
mod tests {
	use serde_json::json;

	use super::*;

	#[test]
	fn activity_lines_pick_the_first_useful_fields() {
		assert_eq!(
			activity_text(&json!({
				"action": "scenario_created",
				"description": "Created Q3 ransomware",
				"timestamp": "2025-06-02T08:00:00Z"
			})),
			"2025-06-02 08:00 - Created Q3 ransomware"
		);
		assert_eq!(activity_text(&json!({ "message": "" , "name": "Vault"})), "Vault");
		assert_eq!(activity_text(&json!(42)), "Activity");
	}
}
