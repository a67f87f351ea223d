//! Backend routes and client tunables.

/// Child collections the analysis engine reads, one per component kind.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Collection {
	RiskEvents,
	BusinessAssets,
	DefenseSystems,
}

impl Collection {
	pub const ALL: [Collection; 3] = [
		Collection::RiskEvents,
		Collection::BusinessAssets,
		Collection::DefenseSystems,
	];

	/// Route segment, also the plural key a list response may be wrapped in.
	pub fn segment(self) -> &'static str {
		match self {
			Collection::RiskEvents => "risk-events",
			Collection::BusinessAssets => "business-assets",
			Collection::DefenseSystems => "defense-systems",
		}
	}

	/// Plural key with underscores, which some backend builds use instead.
	pub fn snake_key(self) -> &'static str {
		match self {
			Collection::RiskEvents => "risk_events",
			Collection::BusinessAssets => "business_assets",
			Collection::DefenseSystems => "defense_systems",
		}
	}
}

/// Organisation-wide catalogs managed outside any scenario.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Catalog {
	Locations,
	Events,
	Defenses,
}

impl Catalog {
	pub const ALL: [Catalog; 3] = [Catalog::Locations, Catalog::Events, Catalog::Defenses];

	/// Route segment and plural response key.
	pub fn key(self) -> &'static str {
		match self {
			Catalog::Locations => "locations",
			Catalog::Events => "events",
			Catalog::Defenses => "defenses",
		}
	}

	pub fn from_key(key: &str) -> Option<Self> {
		Self::ALL.into_iter().find(|c| c.key() == key)
	}

	pub fn title(self) -> &'static str {
		match self {
			Catalog::Locations => "Locations",
			Catalog::Events => "Events",
			Catalog::Defenses => "Defenses",
		}
	}
}

/// Route table and tunables for the API client.
///
/// Templates use `{scenario}` and `{id}` placeholders, filled by
/// [`ApiConfig::render`].
#[derive(Clone, Debug)]
pub struct ApiConfig {
	pub base_url: String,
	pub token_key: String,
	pub autosave_debounce_ms: u32,
	pub layout_iterations: usize,
	pub scenarios: String,
	pub scenario: String,
	pub run_analysis: String,
	pub analysis_results: String,
	pub risk_events: Vec<String>,
	pub business_assets: Vec<String>,
	pub defense_systems: Vec<String>,
	pub login: String,
	pub register: String,
	pub logout: String,
	pub me: String,
	pub dashboard_overview: String,
	pub dashboard_trends: String,
	pub dashboard_activity: String,
	/// Catalog collection route; `{id}` is appended for single records.
	pub catalog: String,
}

const DEFAULT_API_URL: &str = "http://localhost:8000/api";

impl Default for ApiConfig {
	fn default() -> Self {
		Self {
			base_url: option_env!("API_URL")
				.unwrap_or(DEFAULT_API_URL)
				.trim_end_matches('/')
				.to_string(),
			token_key: "token".into(),
			autosave_debounce_ms: 500,
			layout_iterations: 300,
			scenarios: "/scenarios/".into(),
			scenario: "/scenarios/{scenario}".into(),
			run_analysis: "/analysis/scenarios/{scenario}/run-analysis".into(),
			analysis_results: "/analysis/scenarios/{scenario}/results".into(),
			risk_events: candidates("risk-events"),
			business_assets: candidates("business-assets"),
			defense_systems: candidates("defense-systems"),
			login: "/auth/login".into(),
			register: "/auth/register".into(),
			logout: "/auth/logout".into(),
			me: "/auth/me".into(),
			dashboard_overview: "/dashboard/stats/overview".into(),
			dashboard_trends: "/dashboard/stats/trends".into(),
			dashboard_activity: "/dashboard/recent-activity".into(),
			catalog: "/{catalog}/".into(),
		}
	}
}

/// Candidate collection routes, highest priority first.
fn candidates(segment: &str) -> Vec<String> {
	vec![
		format!("/scenarios/{{scenario}}/{segment}/"),
		format!("/scenarios/{{scenario}}/{segment}"),
		format!("/{segment}/?scenario_id={{scenario}}"),
	]
}

impl ApiConfig {
	pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
		self.base_url = base_url.into().trim_end_matches('/').to_string();
		self
	}

	/// Ordered candidate routes for a child collection.
	pub fn collection_candidates(&self, collection: Collection) -> &[String] {
		match collection {
			Collection::RiskEvents => &self.risk_events,
			Collection::BusinessAssets => &self.business_assets,
			Collection::DefenseSystems => &self.defense_systems,
		}
	}

	/// Collection route of `catalog`.
	pub fn catalog_path(&self, catalog: Catalog) -> String {
		self.catalog.replace("{catalog}", catalog.key())
	}

	pub fn render(template: &str, scenario: &str, id: Option<&str>) -> String {
		let path = template.replace("{scenario}", scenario);
		match id {
			Some(id) => path.replace("{id}", id),
			None => path,
		}
	}

	/// Route of a single record inside a collection candidate route.
	///
	/// A query string on the collection route is kept after the record id.
	pub fn record_path(collection_path: &str, id: &str) -> String {
		let (path, query) = match collection_path.split_once('?') {
			Some((path, query)) => (path, Some(query)),
			None => (collection_path, None),
		};
		let mut out = format!("{}/{}", path.trim_end_matches('/'), id);
		if path.ends_with('/') {
			out.push('/');
		}
		if let Some(query) = query {
			out.push('?');
			out.push_str(query);
		}
		out
	}
}
