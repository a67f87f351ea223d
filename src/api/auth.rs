//! Login, registration and session restore against `/auth`.

use serde::Serialize;
use serde_json::{Value, json};

use super::envelope::{Normalizer, Shape};
use super::{ApiClient, Transport};
use crate::error::{ApiError, FieldError};
use crate::session::{AuthState, User};

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct Registration {
	pub full_name: String,
	pub email: String,
	pub password: String,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub company: Option<String>,
}

impl Registration {
	/// Same rules the backend enforces, checked before submitting.
	pub fn validate(&self) -> Result<(), Vec<FieldError>> {
		let mut errors = Vec::new();
		if self.full_name.trim().is_empty() {
			errors.push(FieldError::new("full_name", "Name is required"));
		}
		if !self.email.contains('@') {
			errors.push(FieldError::new("email", "Enter a valid email address"));
		}
		let has_letter = self.password.chars().any(char::is_alphabetic);
		let has_digit = self.password.chars().any(|c| c.is_ascii_digit());
		if self.password.chars().count() < 8 || !has_letter || !has_digit {
			errors.push(FieldError::new(
				"password",
				"Password must be at least 8 characters with letters and numbers",
			));
		}
		if errors.is_empty() { Ok(()) } else { Err(errors) }
	}
}

/// Token and user out of a login or register response.
///
/// Accepts `{data: {access_token, user}}`, `{access_token, user}` and the
/// older `{token, user}`.
fn credentials(body: &Value) -> Result<(String, User), ApiError> {
	let payload = Normalizer::new(vec![Shape::Data, Shape::Bare]).find(body, |inner| {
		inner
			.get("access_token")
			.or_else(|| inner.get("token"))
			.and_then(Value::as_str)
			.map(|token| (token.to_string(), inner))
	});
	let Some((token, inner)) = payload else {
		return Err(ApiError::UnexpectedShape("login response without a token".into()));
	};
	let user = match inner.get("user") {
		Some(user) => serde_json::from_value(user.clone())
			.map_err(|e| ApiError::Deserialize(e.to_string()))?,
		None => User::default(),
	};
	Ok((token, user))
}

pub async fn login<T: Transport>(
	client: &ApiClient<T>,
	email: &str,
	password: &str,
) -> Result<User, ApiError> {
	let body = json!({ "email": email.trim(), "password": password });
	let response = client.post(&client.config().login, body).await?;
	let (token, user) = credentials(&response)?;
	client.session().begin(&token, user.clone());
	Ok(user)
}

pub async fn register<T: Transport>(
	client: &ApiClient<T>,
	registration: &Registration,
) -> Result<User, ApiError> {
	let body = serde_json::to_value(registration).map_err(|e| ApiError::Deserialize(e.to_string()))?;
	let response = client.post(&client.config().register, body).await?;
	let (token, user) = credentials(&response)?;
	client.session().begin(&token, user.clone());
	Ok(user)
}

/// Tells the backend, then drops local credentials whatever it answered.
pub async fn logout<T: Transport>(client: &ApiClient<T>) {
	if client.session().has_token() {
		if let Err(err) = client.request(super::Method::Post, &client.config().logout, None).await {
			log::warn!("logout request failed: {err}");
		}
	}
	client.session().expire();
}

/// Checks a stored token on app start.
///
/// Without a token, or when `/auth/me` fails for any reason, the session
/// ends up unauthenticated.
pub async fn restore<T: Transport>(client: &ApiClient<T>) -> AuthState {
	if !client.session().has_token() {
		client.session().expire();
		return client.session().state();
	}
	let user = client.get(&client.config().me).await.and_then(|response| {
		let record = Normalizer::new(vec![Shape::Data, Shape::Named("user".into()), Shape::Bare])
			.find(&response, |inner| inner.get("email").map(|_| inner.clone()))
			.ok_or_else(|| ApiError::UnexpectedShape("/auth/me".into()))?;
		serde_json::from_value::<User>(record).map_err(|e| ApiError::Deserialize(e.to_string()))
	});
	match user {
		Ok(user) => client.session().resume(user),
		Err(err) => {
			log::info!("stored session rejected: {err}");
			client.session().expire();
		}
	}
	client.session().state()
}

#[cfg(test)]
mod tests {
	use futures::executor::block_on;

	use super::*;
	use crate::api::HttpResponse;
	use crate::api::mock::MockTransport;

	#[test]
	fn login_accepts_each_token_shape() {
		for body in [
			json!({"success": true, "data": {"access_token": "t1", "user": {"_id": "u1", "email": "a@b.co"}}}),
			json!({"access_token": "t1", "user": {"id": "u1", "email": "a@b.co"}}),
			json!({"token": "t1", "user": {"id": "u1", "email": "a@b.co"}}),
		] {
			let client = MockTransport::client(move |_| Ok(HttpResponse::new(200, body.clone())));
			let user = block_on(login(&client, "a@b.co", "secret123")).unwrap();
			assert_eq!(user.id.as_deref(), Some("u1"));
			assert_eq!(client.session().token().as_deref(), Some("t1"));
			assert!(client.session().state().is_authenticated());
		}
	}

	#[test]
	fn bad_password_surfaces_server_detail() {
		let client = MockTransport::client(|_| {
			Ok(HttpResponse::new(400, json!({"detail": "Invalid email or password"})))
		});
		let err = block_on(login(&client, "a@b.co", "x")).unwrap_err();
		assert_eq!(err.to_string(), "Invalid email or password");
		assert!(!client.session().has_token());
	}

	#[test]
	fn restore_without_token_is_unauthenticated_and_offline() {
		let client = MockTransport::client(|_| Ok(HttpResponse::new(200, json!({}))));
		assert_eq!(block_on(restore(&client)), AuthState::Unauthenticated);
		assert!(client.transport().calls().is_empty());
	}

	#[test]
	fn restore_resumes_or_expires() {
		let client = MockTransport::client(|_| {
			Ok(HttpResponse::new(200, json!({"success": true, "data": {"_id": "u1", "email": "a@b.co", "full_name": "Ada"}})))
		});
		client.session().begin("t", User::default());
		let state = block_on(restore(&client));
		assert_eq!(state.user().map(User::display_name), Some("Ada"));

		let client = MockTransport::client(|_| Ok(HttpResponse::new(401, json!({"detail": "expired"}))));
		client.session().begin("t", User::default());
		assert_eq!(block_on(restore(&client)), AuthState::Unauthenticated);
		assert!(!client.session().has_token());
	}

	#[test]
	fn logout_clears_even_when_backend_fails() {
		let client = MockTransport::client(|_| Err(ApiError::Network("offline".into())));
		client.session().begin("t", User::default());
		block_on(logout(&client));
		assert!(!client.session().has_token());
		assert_eq!(client.transport().log(), ["Post /auth/logout"]);
	}

	#[test]
	fn registration_rules() {
		let mut r = Registration {
			full_name: "Ada".into(),
			email: "ada@example.com".into(),
			password: "password1".into(),
			company: None,
		};
		assert!(r.validate().is_ok());
		r.password = "short1".into();
		assert_eq!(r.validate().unwrap_err()[0].field, "password");
	}
}
