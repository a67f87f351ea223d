//! Keeps the backend's scenario document and child collections in line with
//! the local graph.

use std::collections::HashMap;

use futures::future::join3;
use serde_json::{Value, json};

use super::convert::{self, kind_for};
use super::results::AnalysisResult;
use super::store::ScenarioGraph;
use super::types::{Component, ComponentKind, Scenario};
use super::validate;
use crate::api::envelope::{Normalizer, record_id};
use crate::api::{ApiClient, Method, Transport};
use crate::config::{ApiConfig, Collection};
use crate::error::{AnalysisStep, ApiError, SyncError};

/// A saved scenario, plus the id the backend assigned if this save created it.
#[derive(Clone, Debug, PartialEq)]
pub struct Saved {
	pub scenario: Scenario,
	pub assigned_id: Option<String>,
}

/// Outcome of a completed analysis run.
#[derive(Clone, Debug, PartialEq)]
pub struct AnalysisRun {
	pub assigned_id: Option<String>,
	pub result: AnalysisResult,
	/// Local component id to backend record id, for newly linked components.
	pub linked: Vec<(String, String)>,
	/// Set when the result was computed but writing it back to the scenario failed.
	pub store_error: Option<SyncError>,
}

pub fn scenario_shapes() -> Normalizer {
	Normalizer::for_record("scenario", "scenarios")
}

fn scenario_list_shapes() -> Normalizer {
	Normalizer::for_list(&["scenarios"])
}

fn collection_shapes(collection: Collection) -> Normalizer {
	Normalizer::for_list(&[collection.segment(), collection.snake_key()])
}

/// Scenario document body for create and update.
pub fn payload(scenario: &Scenario, graph: &ScenarioGraph) -> Value {
	let (nodes, edges) = graph.to_inputs();
	let mut body = json!({
		"name": scenario.name,
		"description": scenario.description,
		"status": scenario.status.as_str(),
		"inputs": { "nodes": nodes, "edges": edges },
	});
	if let Some(results) = &scenario.results {
		body["results"] = results.clone();
	}
	body
}

pub async fn list_scenarios<T: Transport>(client: &ApiClient<T>) -> Result<Vec<Scenario>, SyncError> {
	let response = client.get(&client.config().scenarios).await?;
	Ok(scenario_list_shapes()
		.list_or_empty(&response)
		.into_iter()
		.filter_map(|v| scenario_from_record(v).ok())
		.collect())
}

pub async fn delete_scenario<T: Transport>(client: &ApiClient<T>, id: &str) -> Result<(), SyncError> {
	let path = ApiConfig::render(&client.config().scenario, id, None);
	client.delete(&path).await?;
	log::info!("deleted scenario {id}");
	Ok(())
}

/// Loads a scenario and its graph.
///
/// When the document carries no nodes, components are hydrated from the
/// child collections instead; a collection that fails to load is skipped.
pub async fn load<T: Transport>(
	client: &ApiClient<T>,
	id: &str,
) -> Result<(Scenario, ScenarioGraph), SyncError> {
	let path = ApiConfig::render(&client.config().scenario, id, None);
	let response = client.get(&path).await?;
	let record = scenario_shapes()
		.record(&response)
		.ok_or_else(|| ApiError::UnexpectedShape(path.clone()))?;
	let scenario = scenario_from_record(record)?;
	let mut graph = ScenarioGraph::from_inputs(&scenario.inputs.nodes, &scenario.inputs.edges);

	if graph.components().is_empty() {
		let (events, assets, defenses) = join3(
			list_children(client, id, Collection::RiskEvents),
			list_children(client, id, Collection::BusinessAssets),
			list_children(client, id, Collection::DefenseSystems),
		)
		.await;
		for (collection, listed) in [
			(Collection::RiskEvents, events),
			(Collection::BusinessAssets, assets),
			(Collection::DefenseSystems, defenses),
		] {
			match listed {
				Ok(records) => {
					graph.merge_remote(hydrate(kind_for(collection), &records));
				}
				Err(err) => log::warn!("could not load {}: {err}", collection.segment()),
			}
		}
	}
	Ok((scenario, graph))
}

fn hydrate(kind: ComponentKind, records: &[Value]) -> Vec<Component> {
	records
		.iter()
		.enumerate()
		.filter_map(|(i, r)| convert::from_remote(kind, r, convert::grid_position(kind, i)))
		.collect()
}

fn scenario_from_record(mut record: Value) -> Result<Scenario, ApiError> {
	if let Some(object) = record.as_object_mut() {
		if object.contains_key("id") {
			object.remove("_id");
		}
	}
	serde_json::from_value(record).map_err(|e| ApiError::Deserialize(e.to_string()))
}

/// Creates the scenario if it has no id, otherwise updates it.
///
/// Local fields win over whatever the backend echoes back; only a newly
/// assigned id is adopted.
pub async fn save<T: Transport>(
	client: &ApiClient<T>,
	scenario: &Scenario,
	graph: &ScenarioGraph,
) -> Result<Saved, SyncError> {
	validate::scenario(scenario).map_err(SyncError::Validation)?;
	let config = client.config();
	let body = payload(scenario, graph);

	let (path, response) = match &scenario.id {
		Some(id) => {
			let path = ApiConfig::render(&config.scenario, id, None);
			let response = client.put(&path, body).await?;
			(path, response)
		}
		None => {
			let response = client.post(&config.scenarios, body).await?;
			(config.scenarios.clone(), response)
		}
	};

	let (nodes, edges) = graph.to_inputs();
	let mut saved = scenario.clone();
	saved.inputs.nodes = nodes;
	saved.inputs.edges = edges;

	let echoed_id = scenario_shapes()
		.record(&response)
		.and_then(|record| record_id(&record));
	let assigned_id = match (&scenario.id, echoed_id) {
		(Some(_), _) => None,
		(None, Some(id)) => {
			log::info!("created scenario {id}");
			saved.id = Some(id.clone());
			Some(id)
		}
		(None, None) => return Err(ApiError::UnexpectedShape(path).into()),
	};
	if assigned_id.is_none() {
		log::info!("updated scenario {}", saved.id.as_deref().unwrap_or_default());
	}
	Ok(Saved {
		scenario: saved,
		assigned_id,
	})
}

/// Returns the scenario unchanged if it already has an id, otherwise saves it.
pub async fn ensure_persisted<T: Transport>(
	client: &ApiClient<T>,
	scenario: &Scenario,
	graph: &ScenarioGraph,
) -> Result<Saved, SyncError> {
	if scenario.is_persisted() {
		return Ok(Saved {
			scenario: scenario.clone(),
			assigned_id: None,
		});
	}
	save(client, scenario, graph).await
}

/// Candidate routes for a collection, with a route already known to work first.
fn candidates(
	config: &ApiConfig,
	collection: Collection,
	scenario_id: &str,
	preferred: Option<&str>,
) -> Vec<String> {
	let mut routes: Vec<String> = config
		.collection_candidates(collection)
		.iter()
		.map(|t| ApiConfig::render(t, scenario_id, None))
		.collect();
	if let Some(preferred) = preferred {
		if let Some(index) = routes.iter().position(|r| r == preferred) {
			let route = routes.remove(index);
			routes.insert(0, route);
		}
	}
	routes
}

/// Lists a child collection, trying each candidate route.
pub async fn list_children<T: Transport>(
	client: &ApiClient<T>,
	scenario_id: &str,
	collection: Collection,
) -> Result<Vec<Value>, ApiError> {
	let routes = candidates(client.config(), collection, scenario_id, None);
	let (_, response) = client.first_success(Method::Get, &routes, None).await?;
	Ok(collection_shapes(collection).list_or_empty(&response))
}

/// Upserts every component into its backend collection.
///
/// A component's `remote_id`, or else a remote record with the same name,
/// selects an update; everything else is created. Returns the local to
/// remote id links made by this call. Nothing already written is undone
/// when a later component fails.
pub async fn materialize_children<T: Transport>(
	client: &ApiClient<T>,
	scenario_id: &str,
	components: &[Component],
) -> Result<Vec<(String, String)>, SyncError> {
	let mut linked = Vec::new();
	for collection in Collection::ALL {
		let kind = kind_for(collection);
		let members: Vec<&Component> = components.iter().filter(|c| c.kind() == kind).collect();
		if members.is_empty() {
			continue;
		}

		let all_routes = candidates(client.config(), collection, scenario_id, None);
		let (working, existing) = match client.first_success(Method::Get, &all_routes, None).await {
			Ok((route, response)) => (Some(route), by_name(&collection_shapes(collection).list_or_empty(&response))),
			Err(err) if err.is_fatal() => return Err(err.into()),
			Err(err) => {
				log::warn!("listing {} failed, creating all: {err}", collection.segment());
				(None, HashMap::new())
			}
		};
		let routes = candidates(client.config(), collection, scenario_id, working.as_deref());

		for component in members {
			let body = convert::to_remote(component);
			let target = component
				.remote_id
				.clone()
				.or_else(|| existing.get(component.name.as_str()).cloned());

			let remote_id = match target {
				Some(remote_id) => {
					let record_routes: Vec<String> = routes
						.iter()
						.map(|r| ApiConfig::record_path(r, &remote_id))
						.collect();
					client
						.first_success(Method::Put, &record_routes, Some(body))
						.await?;
					remote_id
				}
				None => {
					let (route, response) = client
						.first_success(Method::Post, &routes, Some(body))
						.await?;
					Normalizer::for_record(kind.as_str(), collection.segment())
						.record(&response)
						.and_then(|r| record_id(&r))
						.ok_or(ApiError::UnexpectedShape(route))?
				}
			};
			if component.remote_id.as_deref() != Some(remote_id.as_str()) {
				linked.push((component.id.clone(), remote_id));
			}
		}
		log::info!("materialized {} into {}", kind, collection.segment());
	}
	Ok(linked)
}

fn by_name(records: &[Value]) -> HashMap<String, String> {
	records
		.iter()
		.filter_map(|r| Some((r.get("name")?.as_str()?.to_string(), record_id(r)?)))
		.collect()
}

/// Saves the scenario if needed, pushes its components to the child
/// collections, runs the backend analysis and writes the result back.
///
/// Fails before any request when the graph has no risk event. `on_step` is
/// told about each step as it starts. `scenario` is updated in place as
/// steps succeed, so an id assigned by the first step survives a later
/// failure.
pub async fn run_analysis<T: Transport>(
	client: &ApiClient<T>,
	scenario: &mut Scenario,
	graph: &ScenarioGraph,
	mut on_step: impl FnMut(AnalysisStep),
) -> Result<AnalysisRun, SyncError> {
	if !graph.has_events() {
		return Err(SyncError::Precondition(
			"At least one risk event is required to run an analysis".into(),
		));
	}

	on_step(AnalysisStep::Persisting);
	let saved = ensure_persisted(client, scenario, graph)
		.await
		.map_err(SyncError::at(AnalysisStep::Persisting))?;
	let assigned_id = saved.assigned_id;
	*scenario = saved.scenario;
	let Some(scenario_id) = scenario.id.clone() else {
		return Err(SyncError::Precondition("Scenario has no id after saving".into()));
	};

	on_step(AnalysisStep::Materializing);
	let linked = materialize_children(client, &scenario_id, graph.components())
		.await
		.map_err(SyncError::at(AnalysisStep::Materializing))?;

	on_step(AnalysisStep::Running);
	let path = ApiConfig::render(&client.config().run_analysis, &scenario_id, None);
	log::info!("running analysis for scenario {scenario_id}");
	let raw = client
		.request(Method::Post, &path, None)
		.await
		.map_err(|source| SyncError::Step {
			step: AnalysisStep::Running,
			source,
		})?;
	let result = AnalysisResult::from_value(&raw);

	on_step(AnalysisStep::StoringResults);
	let mut linked_graph = graph.clone();
	linked_graph.assign_remote_ids(&linked);
	scenario.results = Some(raw);
	let store_error = match save(client, scenario, &linked_graph).await {
		Ok(saved) => {
			*scenario = saved.scenario;
			None
		}
		Err(err) => {
			log::warn!("analysis result not stored on scenario {scenario_id}: {err}");
			Some(SyncError::at(AnalysisStep::StoringResults)(err))
		}
	};

	Ok(AnalysisRun {
		assigned_id,
		result,
		linked,
		store_error,
	})
}

/// Folds the scenario a run worked on back into the editor's copy.
///
/// The id and stored results come from `ran`; name, description and status
/// keep any local edits made while the run was in flight. Returns `true` when
/// this gave `local` its id.
pub fn absorb_run(local: &mut Scenario, ran: &Scenario) -> bool {
	let adopted = local.id.is_none() && ran.id.is_some();
	if adopted {
		local.id = ran.id.clone();
	}
	if ran.results.is_some() {
		local.results = ran.results.clone();
	}
	adopted
}

/// Earlier results stored for a scenario, in the order the backend lists them.
pub async fn stored_results<T: Transport>(
	client: &ApiClient<T>,
	scenario_id: &str,
) -> Result<Vec<AnalysisResult>, SyncError> {
	let path = ApiConfig::render(&client.config().analysis_results, scenario_id, None);
	let response = client.get(&path).await?;
	Ok(Normalizer::for_list(&["results"])
		.list_or_empty(&response)
		.iter()
		.map(AnalysisResult::from_value)
		.collect())
}
