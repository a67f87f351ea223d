//! App-wide context: the API client and a reactive mirror of the session.

use leptos::prelude::*;
use leptos::task::spawn_local;

use crate::api::{self, ApiClient};
use crate::config::ApiConfig;
use crate::session::{AuthState, Session};

#[derive(Clone)]
pub struct AppState {
	pub client: ApiClient,
	/// Follows [`Session`] changes, including expiry after a 401.
	pub auth: RwSignal<AuthState>,
}

impl AppState {
	pub fn new(config: ApiConfig) -> Self {
		let session = Session::local(config.token_key.clone());
		let auth = RwSignal::new(AuthState::Unknown);
		session.on_change(move |state| auth.set(state.clone()));
		Self {
			client: ApiClient::browser(config, session),
			auth,
		}
	}

	/// Validates a stored token in the background.
	pub fn restore_session(&self) {
		let client = self.client.clone();
		spawn_local(async move {
			let state = api::auth::restore(&client).await;
			log::debug!("session restored: {}", state.is_authenticated());
		});
	}

	pub fn logout(&self) {
		let client = self.client.clone();
		spawn_local(async move { api::auth::logout(&client).await });
	}
}
