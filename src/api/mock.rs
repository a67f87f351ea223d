use std::cell::RefCell;

use super::{ApiClient, HttpRequest, HttpResponse, Transport};
use crate::config::ApiConfig;
use crate::error::ApiError;
use crate::session::Session;

type Handler = Box<dyn Fn(&HttpRequest) -> Result<HttpResponse, ApiError>>;

/// Scripted transport that records every request it sees.
pub struct MockTransport {
	handler: Handler,
	calls: RefCell<Vec<HttpRequest>>,
}

impl MockTransport {
	pub fn new(handler: impl Fn(&HttpRequest) -> Result<HttpResponse, ApiError> + 'static) -> Self {
		Self {
			handler: Box::new(handler),
			calls: RefCell::new(Vec::new()),
		}
	}

	pub fn client(
		handler: impl Fn(&HttpRequest) -> Result<HttpResponse, ApiError> + 'static,
	) -> ApiClient<MockTransport> {
		ApiClient::new(
			ApiConfig::default().with_base_url("http://test/api"),
			Session::in_memory(),
			MockTransport::new(handler),
		)
	}

	pub fn calls(&self) -> Vec<HttpRequest> {
		self.calls.borrow().clone()
	}

	/// Paths (base URL stripped) of recorded calls, prefixed with the method.
	pub fn log(&self) -> Vec<String> {
		self.calls
			.borrow()
			.iter()
			.map(|c| {
				format!(
					"{:?} {}",
					c.method,
					c.url.trim_start_matches("http://test/api")
				)
			})
			.collect()
	}
}

impl Transport for MockTransport {
	async fn send(&self, request: HttpRequest) -> Result<HttpResponse, ApiError> {
		self.calls.borrow_mut().push(request.clone());
		(self.handler)(&request)
	}
}
