//! Risk scenario console: a Leptos client-side app for modelling risk
//! scenarios on a canvas and running the backend's loss analysis.

use leptos::prelude::*;
use leptos_meta::*;
use leptos_router::components::*;
use leptos_router::path;
use log::{Level, info};

// Modules
pub mod api;
mod components;
pub mod config;
pub mod error;
mod pages;
pub mod scenario;
pub mod session;
pub mod state;

// Top-Level pages
use crate::components::Protected;
use crate::config::ApiConfig;
use crate::pages::catalog::CatalogPage;
use crate::pages::dashboard::DashboardPage;
use crate::pages::editor::EditorPage;
use crate::pages::login::LoginPage;
use crate::pages::not_found::NotFound;
use crate::pages::scenarios::ScenariosPage;
use crate::state::AppState;

/// Initialize logging and panic hooks for the WASM target.
pub fn init_logging() {
	let _ = console_log::init_with_level(Level::Debug);
	console_error_panic_hook::set_once();
	info!("Logging initialized");
}

/// App router. Everything except the login page requires a session.
#[component]
pub fn App() -> impl IntoView {
	// Provides context that manages stylesheets, titles, meta tags, etc.
	provide_meta_context();

	let state = AppState::new(ApiConfig::default());
	state.restore_session();
	provide_context(state);

	view! {
		<Html attr:lang="en" attr:dir="ltr" attr:data-theme="light" />

		// sets the document title
		<Title text="Risk Console" />

		// injects metadata in the <head> of the page
		<Meta charset="UTF-8" />
		<Meta name="viewport" content="width=device-width, initial-scale=1.0" />

		<Router>
			<Routes fallback=|| view! { <NotFound /> }>
				<Route path=path!("/") view=|| view! { <Redirect path="/dashboard" /> } />
				<Route path=path!("/login") view=LoginPage />
				<Route
					path=path!("/dashboard")
					view=|| view! { <Protected><DashboardPage /></Protected> }
				/>
				<Route
					path=path!("/scenarios")
					view=|| view! { <Protected><ScenariosPage /></Protected> }
				/>
				<Route
					path=path!("/scenarios/:id")
					view=|| view! { <Protected><EditorPage /></Protected> }
				/>
				<Route
					path=path!("/catalog/:kind")
					view=|| view! { <Protected><CatalogPage /></Protected> }
				/>
			</Routes>
		</Router>
	}
}
