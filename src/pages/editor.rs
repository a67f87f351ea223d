use gloo_timers::callback::Timeout;
use leptos::prelude::*;
use leptos::task::spawn_local;
use leptos_router::NavigateOptions;
use leptos_router::hooks::{use_navigate, use_params_map};

use crate::components::{ComponentModal, ErrorBanner, Palette, ResultsPanel, ScenarioCanvas, auto_arrange};
use crate::error::AnalysisStep;
use crate::scenario::types::ScenarioStatus;
use crate::scenario::{
	AnalysisResult, Component, ComponentKind, ConnectOutcome, EditorPhase, EditorSession, Position,
	Scenario, ScenarioGraph, sync,
};
use crate::state::AppState;

/// Open component form: the component being edited and whether it is new.
#[derive(Clone, Debug, PartialEq)]
struct ModalState {
	draft: Component,
	is_new: bool,
}

/// Message for a connect attempt that did not add a connection.
pub fn connect_notice(outcome: &ConnectOutcome) -> Option<&'static str> {
	match outcome {
		ConnectOutcome::Created(_) => None,
		ConnectOutcome::NoPending => Some("Pick a source component first"),
		ConnectOutcome::SelfLoop => Some("A component cannot connect to itself"),
		ConnectOutcome::UnknownEndpoint => Some("That component no longer exists"),
		ConnectOutcome::Duplicate => Some("Those components are already connected"),
	}
}

pub fn phase_label(phase: EditorPhase) -> &'static str {
	match phase {
		EditorPhase::New => "Not saved yet",
		EditorPhase::Saving => "Saving...",
		EditorPhase::Persisted => "Saved",
		EditorPhase::Editing => "Unsaved changes",
		EditorPhase::Analyzing => "Analyzing...",
		EditorPhase::ResultsReady => "Results ready",
	}
}

/// Scenario editor. `/scenarios/new` starts an unsaved scenario.
#[component]
pub fn EditorPage() -> impl IntoView {
	let app = expect_context::<AppState>();
	let params = use_params_map();
	let navigate = StoredValue::new_local(use_navigate());
	let client = StoredValue::new(app.client.clone());
	let (debounce_ms, layout_iterations) = {
		let config = app.client.config();
		(config.autosave_debounce_ms, config.layout_iterations)
	};

	let scenario = RwSignal::new(Scenario::default());
	let graph = RwSignal::new(ScenarioGraph::new());
	let session = RwSignal::new(EditorSession::new(false));
	let result = RwSignal::new(Option::<AnalysisResult>::None);
	let history = RwSignal::new(Vec::<AnalysisResult>::new());
	let progress = RwSignal::new(Option::<AnalysisStep>::None);
	let modal = RwSignal::new(Option::<ModalState>::None);
	let notice = RwSignal::new(Option::<String>::None);
	let error = RwSignal::new(Option::<String>::None);
	let loading = RwSignal::new(false);

	// scenario field edits; graph edits are counted by the graph itself
	let meta_edits = RwSignal::new(0u64);
	let saved_revision = RwSignal::new(0u64);
	let load_generation = StoredValue::new(0u64);
	let pending_save = StoredValue::new_local(Option::<Timeout>::None);

	let revision = move || graph.with(ScenarioGraph::revision) + meta_edits.get();
	let revision_untracked =
		move || graph.with_untracked(ScenarioGraph::revision) + meta_edits.get_untracked();

	// session errors go to the banner
	Effect::new(move |_| {
		if let Some(message) = session.with(|s| s.error().map(str::to_string)) {
			error.set(Some(message));
			session.update(EditorSession::clear_error);
		}
	});

	let show_scenario = move |id: &str| {
		let path = format!("/scenarios/{id}");
		let _ = navigate.try_with_value(|nav| {
			nav(
				&path,
				NavigateOptions {
					replace: true,
					..Default::default()
				},
			)
		});
	};

	let adopt_id = move |id: &str| {
		let mut adopted = false;
		scenario.update(|s| {
			if s.id.is_none() {
				s.id = Some(id.to_string());
				adopted = true;
			}
		});
		if adopted {
			show_scenario(id);
		}
	};

	// (re)load when the route names a different scenario than the one open
	Effect::new(move |_| {
		let route_id = params.with(|p| p.get("id")).filter(|id| id != "new");
		if route_id == scenario.with_untracked(|s| s.id.clone()) {
			return;
		}
		load_generation.update_value(|g| *g += 1);
		let generation = load_generation.get_value();
		pending_save.set_value(None);
		result.set(None);
		history.set(Vec::new());
		modal.set(None);
		error.set(None);

		let Some(id) = route_id else {
			scenario.set(Scenario::default());
			graph.set(ScenarioGraph::new());
			session.set(EditorSession::new(false));
			saved_revision.set(revision_untracked());
			return;
		};

		loading.set(true);
		let client = client.get_value();
		spawn_local(async move {
			let loaded = sync::load(&client, &id).await;
			if load_generation.try_get_value() != Some(generation) {
				return;
			}
			loading.set(false);
			match loaded {
				Ok((loaded_scenario, loaded_graph)) => {
					let last = loaded_scenario
							.results
							.as_ref()
							.map(AnalysisResult::from_value)
							.filter(|r| !r.is_empty());
					scenario.set(loaded_scenario);
					graph.set(loaded_graph);
					session.set(EditorSession::new(true));
					result.set(last);
					saved_revision.set(revision_untracked());
				}
				Err(err) => {
					error.set(Some(err.to_string()));
					return;
				}
			}
			match sync::stored_results(&client, &id).await {
				Ok(list) => history.set(list),
				Err(err) => log::warn!("no stored results for {id}: {err}"),
			}
		});
	});

	let save_now = move || {
		let mut started = false;
		session.update(|s| started = s.begin_save());
		if !started {
			return;
		}
		let snapshot = revision_untracked();
		let current = scenario.get_untracked();
		let current_graph = graph.get_untracked();
		let client = client.get_value();
		spawn_local(async move {
			match sync::save(&client, &current, &current_graph).await {
				Ok(saved) => {
					if let Some(id) = &saved.assigned_id {
						adopt_id(id);
					}
					saved_revision.set(snapshot);
					session.update(|s| s.finish_save(Ok(())));
				}
				Err(err) => session.update(|s| s.finish_save(Err(err.to_string()))),
			}
		});
	};

	// debounced auto-save of scenarios the backend already knows
	Effect::new(move |_| {
		let current = revision();
		let (has_id, busy) = session.with(|s| (s.has_id(), s.is_busy()));
		if !has_id || busy || loading.get() || current == saved_revision.get_untracked() {
			return;
		}
		pending_save.set_value(Some(Timeout::new(debounce_ms, move || {
			log::debug!("auto-saving revision {current}");
			save_now();
		})));
	});

	let run_analysis = move |_: web_sys::MouseEvent| {
		let mut started = false;
		session.update(|s| started = s.begin_analysis());
		if !started {
			return;
		}
		pending_save.set_value(None);
		let snapshot = revision_untracked();
		let mut current = scenario.get_untracked();
		let current_graph = graph.get_untracked();
		let client = client.get_value();
		spawn_local(async move {
			let outcome = sync::run_analysis(&client, &mut current, &current_graph, |step| {
				progress.set(Some(step));
				session.update(|s| s.observe(step));
			})
			.await;
			progress.set(None);
			// keep name/description edits made during the run
			let mut adopted = false;
			scenario.update(|s| adopted = sync::absorb_run(s, &current));
			let stored = matches!(&outcome, Ok(run) if run.store_error.is_none());
			if adopted || stored {
				saved_revision.set(snapshot);
			}
			if let (true, Some(id)) = (adopted, &current.id) {
				show_scenario(id);
			}
			match outcome {
				Ok(run) => {
					graph.update(|g| g.assign_remote_ids(&run.linked));
					history.update(|h| h.insert(0, run.result.clone()));
					result.set(Some(run.result));
					session.update(|s| {
						s.finish_analysis(Ok(()));
						if let Some(err) = &run.store_error {
							s.annotate(format!("Results are shown but could not be stored: {err}"));
						}
					});
				}
				Err(err) => session.update(|s| s.finish_analysis(Err(err.to_string()))),
			}
		});
	};

	let edited = move || session.update(EditorSession::edited);

	let on_select = Callback::new(move |id: String| {
		let outcome = graph
			.try_update(|g| g.click_while_connecting(&id))
			.flatten();
		match outcome {
			Some(ConnectOutcome::Created(_)) => {
				notice.set(None);
				edited();
			}
			Some(other) => notice.set(connect_notice(&other).map(str::to_string)),
			None if graph.with_untracked(ScenarioGraph::is_connecting) => {
				notice.set(Some("Now click the target component".into()));
			}
			None => {
				if let Some(draft) = graph.with_untracked(|g| g.component(&id).cloned()) {
					modal.set(Some(ModalState {
						draft,
						is_new: false,
					}));
				}
			}
		}
	});

	let on_move = Callback::new(move |(id, position): (String, Position)| {
		if graph.try_update(|g| g.move_component(&id, position)) == Some(true) {
			edited();
		}
	});

	let open_new = move |kind: ComponentKind| {
		modal.set(Some(ModalState {
			draft: Component::draft(kind),
			is_new: true,
		}));
	};

	let on_drop = Callback::new(move |(kind, position): (ComponentKind, Position)| {
		graph.update(|g| g.set_drop_position(position));
		open_new(kind);
	});

	let on_delete_connection = Callback::new(move |(from, to): (String, String)| {
		if graph.try_update(|g| g.delete_connection(&from, &to)) == Some(true) {
			edited();
		}
	});

	let on_background = Callback::new(move |()| {
		if graph.with_untracked(ScenarioGraph::is_connecting) {
			graph.update(ScenarioGraph::cancel_connection);
			notice.set(None);
		}
	});

	let on_modal_save = Callback::new(move |component: Component| {
		let is_new = modal.with_untracked(|m| m.as_ref().is_some_and(|m| m.is_new));
		graph.update(|g| {
			if is_new {
				g.add_component(component, None);
			} else {
				g.update_component(component);
			}
		});
		modal.set(None);
		edited();
	});

	let on_modal_delete = Callback::new(move |id: String| {
		if graph.try_update(|g| g.delete_component(&id)).flatten().is_some() {
			edited();
		}
		modal.set(None);
	});

	let on_modal_connect = Callback::new(move |id: String| {
		graph.update(|g| g.begin_connection(Some(&id)));
		notice.set(Some("Now click the target component".into()));
		modal.set(None);
	});

	let toggle_connect = move |_: web_sys::MouseEvent| {
		if graph.with_untracked(ScenarioGraph::is_connecting) {
			graph.update(ScenarioGraph::cancel_connection);
			notice.set(None);
		} else {
			graph.update(|g| g.begin_connection(None));
			notice.set(Some("Click the source component".into()));
		}
	};

	let arrange = move |_: web_sys::MouseEvent| {
		let positions = graph.with_untracked(|g| {
			auto_arrange(g, layout_iterations, Position::new(400.0, 300.0))
		});
		if !positions.is_empty() {
			graph.update(|g| g.set_positions(&positions));
			edited();
		}
	};

	let edit_scenario = move |apply: &dyn Fn(&mut Scenario)| {
		scenario.update(|s| apply(s));
		meta_edits.update(|n| *n += 1);
		edited();
	};

	let busy = Signal::derive(move || session.with(EditorSession::is_busy));
	let connecting = move || graph.with(ScenarioGraph::is_connecting);
	let counts = move || {
		graph.with(|g| {
			format!(
				"{} events, {} assets, {} defenses, {} connections",
				g.count(ComponentKind::Event),
				g.count(ComponentKind::Asset),
				g.count(ComponentKind::Defense),
				g.connections().len()
			)
		})
	};

	view! {
		<div class="page page-editor">
			<header class="editor-toolbar">
				<input
					type="text"
					class="form-input scenario-name"
					placeholder="Scenario name"
					prop:value=move || scenario.with(|s| s.name.clone())
					on:input=move |e| {
						let name = event_target_value(&e);
						edit_scenario(&|s| s.name = name.clone());
					}
				/>
				<select
					class="form-input"
					prop:value=move || scenario.with(|s| s.status.as_str())
					on:change=move |e| {
						let picked = event_target_value(&e);
						if let Some(status) = ScenarioStatus::ALL.into_iter().find(|s| s.as_str() == picked) {
							edit_scenario(&|s| s.status = status);
						}
					}
				>
					{ScenarioStatus::ALL
						.into_iter()
						.map(|s| view! { <option value=s.as_str()>{s.as_str()}</option> })
						.collect_view()}
				</select>
				<span class="phase">{move || phase_label(session.with(EditorSession::phase))}</span>
				<span class="nav-spacer"></span>
				<button
					type="button"
					class=move || if connecting() { "btn active" } else { "btn" }
					on:click=toggle_connect
				>
					{move || if connecting() { "Cancel connect" } else { "Connect" }}
				</button>
				<button type="button" class="btn" on:click=arrange>
					"Auto-arrange"
				</button>
				<button
					type="button"
					class="btn"
					disabled=move || busy.get()
					on:click=move |_| save_now()
				>
					"Save"
				</button>
				<button
					type="button"
					class="btn btn-primary"
					disabled=move || busy.get() || !graph.with(ScenarioGraph::has_events)
					on:click=run_analysis
				>
					"Run analysis"
				</button>
			</header>

			<textarea
				class="form-input scenario-description"
				placeholder="Description"
				prop:value=move || scenario.with(|s| s.description.clone())
				on:input=move |e| {
					let description = event_target_value(&e);
					edit_scenario(&|s| s.description = description.clone());
				}
			></textarea>

			<ErrorBanner error=error />
			{move || notice.get().map(|n| view! { <div class="notice">{n}</div> })}
			{move || {
				progress
					.get()
					.map(|step| view! { <div class="progress">{format!("Working: {step}...")}</div> })
			}}

			<div class="editor-body">
				<Palette on_add=move |kind| open_new(kind) disabled=busy />
				<div class="canvas-wrap">
					<Show when=move || loading.get()>
						<div class="loading-overlay">"Loading scenario..."</div>
					</Show>
					<ScenarioCanvas
						graph=graph
						on_select=on_select
						on_move=on_move
						on_drop=on_drop
						on_delete_connection=on_delete_connection
						on_background=on_background
					/>
					<p class="hint canvas-status">{counts}</p>
				</div>
				<ResultsPanel result=result history=history />
			</div>

			{move || {
				modal
					.get()
					.map(|ModalState { draft, is_new }| {
						view! {
							<ComponentModal
								draft=draft
								is_new=is_new
								on_save=on_modal_save
								on_cancel=move |()| {
									graph.update(ScenarioGraph::clear_drop_position);
									modal.set(None);
								}
								on_delete=on_modal_delete
								on_connect=on_modal_connect
							/>
						}
					})
			}}
		</div>
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::scenario::{Connection, EdgeType};

	#[test]
	fn only_failed_connects_raise_a_notice() {
		let created = ConnectOutcome::Created(Connection {
			from: "a".into(),
			to: "b".into(),
			edge_type: EdgeType::EventToAsset,
		});
		assert_eq!(connect_notice(&created), None);
		assert_eq!(
			connect_notice(&ConnectOutcome::Duplicate),
			Some("Those components are already connected")
		);
		assert!(connect_notice(&ConnectOutcome::SelfLoop).is_some());
	}

	#[test]
	fn busy_phases_read_as_in_progress() {
		assert_eq!(phase_label(EditorPhase::Saving), "Saving...");
		assert_eq!(phase_label(EditorPhase::Editing), "Unsaved changes");
	}
}
