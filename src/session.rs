//! Authenticated session context.
//!
//! One [`Session`] is created at app start and handed to the API client and
//! the router. A 401 anywhere calls [`Session::expire`], which clears the
//! stored token and notifies listeners so the UI can route to the login page.

use std::sync::{Arc, Mutex, PoisonError, RwLock};

use gloo_storage::Storage;
use serde::{Deserialize, Serialize};

/// Where the bearer token is persisted between page loads.
pub trait CredentialStore: Send + Sync {
	fn token(&self) -> Option<String>;
	fn set_token(&self, token: &str);
	fn clear(&self);
}

/// Browser `localStorage`, keyed by `key`.
pub struct LocalCredentialStore {
	key: String,
}

impl LocalCredentialStore {
	pub fn new(key: impl Into<String>) -> Self {
		Self { key: key.into() }
	}
}

impl CredentialStore for LocalCredentialStore {
	fn token(&self) -> Option<String> {
		gloo_storage::LocalStorage::get::<String>(&self.key).ok()
	}

	fn set_token(&self, token: &str) {
		if let Err(err) = gloo_storage::LocalStorage::set(&self.key, token) {
			log::warn!("failed to persist auth token: {err}");
		}
	}

	fn clear(&self) {
		gloo_storage::LocalStorage::delete(&self.key);
	}
}

/// In-process store, used before storage is available and in tests.
#[derive(Default)]
pub struct MemoryCredentialStore {
	token: Mutex<Option<String>>,
}

impl CredentialStore for MemoryCredentialStore {
	fn token(&self) -> Option<String> {
		self.token
			.lock()
			.unwrap_or_else(PoisonError::into_inner)
			.clone()
	}

	fn set_token(&self, token: &str) {
		*self.token.lock().unwrap_or_else(PoisonError::into_inner) = Some(token.to_string());
	}

	fn clear(&self) {
		*self.token.lock().unwrap_or_else(PoisonError::into_inner) = None;
	}
}

/// Signed-in user as returned by `/auth/me`.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct User {
	#[serde(default, alias = "_id")]
	pub id: Option<String>,
	#[serde(default)]
	pub email: String,
	#[serde(default, alias = "name")]
	pub full_name: String,
	#[serde(default)]
	pub company: Option<String>,
	#[serde(default)]
	pub role: Option<String>,
}

impl User {
	pub fn display_name(&self) -> &str {
		if self.full_name.trim().is_empty() {
			&self.email
		} else {
			&self.full_name
		}
	}
}

#[derive(Clone, Debug, Default, PartialEq)]
pub enum AuthState {
	#[default]
	Unknown,
	Authenticated(User),
	Unauthenticated,
}

impl AuthState {
	pub fn is_authenticated(&self) -> bool {
		matches!(self, AuthState::Authenticated(_))
	}

	pub fn user(&self) -> Option<&User> {
		match self {
			AuthState::Authenticated(user) => Some(user),
			_ => None,
		}
	}
}

type Listener = Arc<dyn Fn(&AuthState) + Send + Sync>;

/// Shared login state plus the credential store behind it.
#[derive(Clone)]
pub struct Session {
	store: Arc<dyn CredentialStore>,
	state: Arc<RwLock<AuthState>>,
	listener: Arc<Mutex<Option<Listener>>>,
}

impl Session {
	pub fn new(store: Arc<dyn CredentialStore>) -> Self {
		Self {
			store,
			state: Arc::new(RwLock::new(AuthState::Unknown)),
			listener: Arc::new(Mutex::new(None)),
		}
	}

	/// Session backed by browser storage under `key`.
	pub fn local(key: impl Into<String>) -> Self {
		Self::new(Arc::new(LocalCredentialStore::new(key)))
	}

	pub fn in_memory() -> Self {
		Self::new(Arc::new(MemoryCredentialStore::default()))
	}

	/// Registers the single callback that observes auth state changes.
	pub fn on_change(&self, listener: impl Fn(&AuthState) + Send + Sync + 'static) {
		*self.listener.lock().unwrap_or_else(PoisonError::into_inner) = Some(Arc::new(listener));
	}

	pub fn token(&self) -> Option<String> {
		self.store.token()
	}

	pub fn has_token(&self) -> bool {
		self.token().is_some()
	}

	pub fn state(&self) -> AuthState {
		self.state
			.read()
			.unwrap_or_else(PoisonError::into_inner)
			.clone()
	}

	/// Stores `token` and marks `user` as signed in.
	pub fn begin(&self, token: &str, user: User) {
		self.store.set_token(token);
		log::info!("signed in as {}", user.display_name());
		self.set_state(AuthState::Authenticated(user));
	}

	/// Marks the user behind an already stored token as signed in.
	pub fn resume(&self, user: User) {
		self.set_state(AuthState::Authenticated(user));
	}

	/// Clears credentials after logout or a 401.
	pub fn expire(&self) {
		if self.state() == AuthState::Unauthenticated && !self.has_token() {
			return;
		}
		log::info!("session ended, clearing stored credentials");
		self.store.clear();
		self.set_state(AuthState::Unauthenticated);
	}

	fn set_state(&self, next: AuthState) {
		*self.state.write().unwrap_or_else(PoisonError::into_inner) = next.clone();
		let listener = self
			.listener
			.lock()
			.unwrap_or_else(PoisonError::into_inner)
			.clone();
		if let Some(listener) = listener {
			listener(&next);
		}
	}
}

#[cfg(test)]
mod tests {
	use std::sync::atomic::{AtomicUsize, Ordering};

	use super::*;

	#[test]
	fn begin_then_expire_clears_token() {
		let session = Session::in_memory();
		session.begin(
			"abc",
			User {
				email: "a@b.co".into(),
				..User::default()
			},
		);
		assert_eq!(session.token().as_deref(), Some("abc"));
		assert!(session.state().is_authenticated());

		session.expire();
		assert_eq!(session.token(), None);
		assert_eq!(session.state(), AuthState::Unauthenticated);
	}

	#[test]
	fn listener_sees_each_transition_once() {
		let session = Session::in_memory();
		let seen = Arc::new(AtomicUsize::new(0));
		let counter = seen.clone();
		session.on_change(move |_| {
			counter.fetch_add(1, Ordering::SeqCst);
		});

		session.begin("t", User::default());
		session.expire();
		session.expire();
		assert_eq!(seen.load(Ordering::SeqCst), 2);
	}

	#[test]
	fn display_name_falls_back_to_email() {
		let user = User {
			email: "ops@example.com".into(),
			..User::default()
		};
		assert_eq!(user.display_name(), "ops@example.com");
	}
}
