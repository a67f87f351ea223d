//! HTTP client for the risk backend.
//!
//! [`ApiClient`] is generic over a [`Transport`] so the sync layer can be
//! driven without a browser. In the app the transport is [`GlooTransport`].

pub mod auth;
pub mod catalog;
pub mod dashboard;
pub mod envelope;
#[cfg(test)]
pub(crate) mod mock;

use std::sync::Arc;

use gloo_net::http::Request;
use serde_json::Value;

use crate::config::ApiConfig;
use crate::error::ApiError;
use crate::session::Session;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Method {
	Get,
	Post,
	Put,
	Delete,
}

#[derive(Clone, Debug, PartialEq)]
pub struct HttpRequest {
	pub method: Method,
	pub url: String,
	pub token: Option<String>,
	pub body: Option<Value>,
}

/// Status plus body; an empty or non-JSON body becomes `Null` or a JSON string.
#[derive(Clone, Debug, PartialEq)]
pub struct HttpResponse {
	pub status: u16,
	pub body: Value,
}

impl HttpResponse {
	pub fn new(status: u16, body: Value) -> Self {
		Self { status, body }
	}

	fn parse_body(text: &str) -> Value {
		if text.trim().is_empty() {
			return Value::Null;
		}
		serde_json::from_str(text).unwrap_or_else(|_| Value::String(text.to_string()))
	}
}

/// Sends one request. Failing to get any response is [`ApiError::Network`];
/// non-2xx statuses are returned as responses, not errors.
#[allow(async_fn_in_trait)]
pub trait Transport {
	async fn send(&self, request: HttpRequest) -> Result<HttpResponse, ApiError>;
}

/// Browser `fetch` through gloo-net.
#[derive(Clone, Copy, Debug, Default)]
pub struct GlooTransport;

impl Transport for GlooTransport {
	async fn send(&self, request: HttpRequest) -> Result<HttpResponse, ApiError> {
		let url = request.url.as_str();
		let mut builder = match request.method {
			Method::Get => Request::get(url),
			Method::Post => Request::post(url),
			Method::Put => Request::put(url),
			Method::Delete => Request::delete(url),
		}
		.header("Content-Type", "application/json");
		if let Some(token) = &request.token {
			builder = builder.header("Authorization", &format!("Bearer {token}"));
		}

		let response = match &request.body {
			Some(body) => {
				builder
					.json(body)
					.map_err(|e| ApiError::Deserialize(e.to_string()))?
					.send()
					.await
			}
			None => builder.send().await,
		}
		.map_err(|e| ApiError::Network(e.to_string()))?;

		let status = response.status();
		let text = response.text().await.unwrap_or_default();
		Ok(HttpResponse::new(status, HttpResponse::parse_body(&text)))
	}
}

/// Authenticated JSON client bound to one backend.
#[derive(Clone)]
pub struct ApiClient<T = GlooTransport> {
	config: Arc<ApiConfig>,
	session: Session,
	transport: T,
}

impl ApiClient<GlooTransport> {
	pub fn browser(config: ApiConfig, session: Session) -> Self {
		Self::new(config, session, GlooTransport)
	}
}

impl<T: Transport> ApiClient<T> {
	pub fn new(config: ApiConfig, session: Session, transport: T) -> Self {
		Self {
			config: Arc::new(config),
			session,
			transport,
		}
	}

	pub fn config(&self) -> &ApiConfig {
		&self.config
	}

	pub fn session(&self) -> &Session {
		&self.session
	}

	pub fn transport(&self) -> &T {
		&self.transport
	}

	/// Sends a request and returns the body of a 2xx response.
	///
	/// A 401 ends the session before the error is returned.
	pub async fn request(
		&self,
		method: Method,
		path: &str,
		body: Option<Value>,
	) -> Result<Value, ApiError> {
		let request = HttpRequest {
			method,
			url: format!("{}{}", self.config.base_url, path),
			token: self.session.token(),
			body,
		};
		log::debug!("{:?} {}", request.method, request.url);
		let response = self.transport.send(request).await?;

		match response.status {
			200..=299 => Ok(response.body),
			status => {
				let err = ApiError::from_body(status, &response.body);
				if err == ApiError::Unauthorized {
					self.session.expire();
				}
				Err(err)
			}
		}
	}

	pub async fn get(&self, path: &str) -> Result<Value, ApiError> {
		self.request(Method::Get, path, None).await
	}

	pub async fn post(&self, path: &str, body: Value) -> Result<Value, ApiError> {
		self.request(Method::Post, path, Some(body)).await
	}

	pub async fn put(&self, path: &str, body: Value) -> Result<Value, ApiError> {
		self.request(Method::Put, path, Some(body)).await
	}

	pub async fn delete(&self, path: &str) -> Result<Value, ApiError> {
		self.request(Method::Delete, path, None).await
	}

	/// Tries `paths` in order with the same method and body; the first 2xx wins.
	///
	/// Session and connectivity failures abort immediately since another
	/// route cannot fix them. Otherwise every failure is collected into
	/// [`ApiError::AllCandidatesFailed`].
	pub async fn first_success(
		&self,
		method: Method,
		paths: &[String],
		body: Option<Value>,
	) -> Result<(String, Value), ApiError> {
		let mut attempts = Vec::new();
		for path in paths {
			match self.request(method, path, body.clone()).await {
				Ok(value) => return Ok((path.clone(), value)),
				Err(err) if err.is_fatal() => return Err(err),
				Err(err) => {
					log::warn!("{method:?} {path} failed, trying next route: {err}");
					attempts.push((path.clone(), err));
				}
			}
		}
		Err(ApiError::AllCandidatesFailed(attempts))
	}
}

#[cfg(test)]
mod tests {
	use futures::executor::block_on;
	use serde_json::json;

	use super::mock::MockTransport;
	use super::*;
	use crate::session::User;

	#[test]
	fn bearer_token_is_attached() {
		let client = MockTransport::client(|_| Ok(HttpResponse::new(200, json!({}))));
		client.session().begin("tok", User::default());
		block_on(client.get("/auth/me")).unwrap();

		let calls = client.transport().calls();
		assert_eq!(calls[0].token.as_deref(), Some("tok"));
		assert!(calls[0].url.ends_with("/auth/me"));
	}

	#[test]
	fn unauthorized_clears_session() {
		let client = MockTransport::client(|_| Ok(HttpResponse::new(401, json!({"detail": "expired"}))));
		client.session().begin("tok", User::default());

		let err = block_on(client.get("/scenarios/")).unwrap_err();
		assert_eq!(err, ApiError::Unauthorized);
		assert!(!client.session().has_token());
		assert!(!client.session().state().is_authenticated());
	}

	#[test]
	fn server_message_is_surfaced_verbatim() {
		let client = MockTransport::client(|_| {
			Ok(HttpResponse::new(400, json!({"detail": "Invalid scenario ID"})))
		});
		let err = block_on(client.get("/scenarios/x")).unwrap_err();
		assert_eq!(err.to_string(), "Invalid scenario ID");
	}

	#[test]
	fn first_success_walks_candidates_in_order() {
		let client = MockTransport::client(|req| {
			if req.url.ends_with("/b") {
				Ok(HttpResponse::new(201, json!({"id": "x"})))
			} else {
				Ok(HttpResponse::new(404, Value::Null))
			}
		});
		let paths = vec!["/a".to_string(), "/b".to_string(), "/c".to_string()];
		let (path, _) = block_on(client.first_success(Method::Post, &paths, Some(json!({})))).unwrap();

		assert_eq!(path, "/b");
		assert_eq!(client.transport().calls().len(), 2);
	}

	#[test]
	fn first_success_aggregates_failures() {
		let client = MockTransport::client(|_| Ok(HttpResponse::new(405, Value::Null)));
		let paths = vec!["/a".to_string(), "/b".to_string()];
		match block_on(client.first_success(Method::Get, &paths, None)) {
			Err(ApiError::AllCandidatesFailed(attempts)) => {
				assert_eq!(attempts.len(), 2);
				assert_eq!(attempts[1].0, "/b");
			}
			other => panic!("unexpected {other:?}"),
		}
	}

	#[test]
	fn first_success_stops_on_network_error() {
		let client = MockTransport::client(|_| Err(ApiError::Network("offline".into())));
		let paths = vec!["/a".to_string(), "/b".to_string()];
		let err = block_on(client.first_success(Method::Get, &paths, None)).unwrap_err();

		assert_eq!(err, ApiError::Network("offline".into()));
		assert_eq!(client.transport().calls().len(), 1);
	}

	#[test]
	fn non_json_bodies_are_kept_as_text() {
		assert_eq!(HttpResponse::parse_body(""), Value::Null);
		assert_eq!(
			HttpResponse::parse_body("Bad Gateway"),
			Value::String("Bad Gateway".into())
		);
	}
}
