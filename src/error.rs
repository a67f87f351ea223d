//! Error taxonomy shared by the API client and the scenario sync layer.

use std::fmt;

use thiserror::Error;

/// Transport and server failures.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ApiError {
	#[error("Unable to reach the server: {0}")]
	Network(String),

	#[error("{message}")]
	Server { status: u16, message: String },

	#[error("Your session has expired, please sign in again")]
	Unauthorized,

	#[error("Not found")]
	NotFound,

	#[error("Unexpected response: {0}")]
	Deserialize(String),

	#[error("Unexpected response shape from {0}")]
	UnexpectedShape(String),

	#[error("All endpoints failed: {}", join_attempts(.0))]
	AllCandidatesFailed(Vec<(String, ApiError)>),
}

fn join_attempts(attempts: &[(String, ApiError)]) -> String {
	attempts
		.iter()
		.map(|(path, err)| format!("{path} ({err})"))
		.collect::<Vec<_>>()
		.join("; ")
}

impl ApiError {
	/// Builds a server error from a response body, preferring the body's own message.
	pub fn from_body(status: u16, body: &serde_json::Value) -> Self {
		match status {
			401 => return ApiError::Unauthorized,
			404 if server_message(body).is_none() => return ApiError::NotFound,
			_ => {}
		}
		let message = server_message(body)
			.unwrap_or_else(|| format!("Request failed with status {status}"));
		ApiError::Server { status, message }
	}

	/// Errors that should stop endpoint probing instead of moving to the next candidate.
	pub fn is_fatal(&self) -> bool {
		matches!(self, ApiError::Unauthorized | ApiError::Network(_))
	}
}

/// First of `message`, `error`, `detail` that is a non-empty string.
///
/// FastAPI validation errors put a list under `detail`; the first entry's
/// `msg` is used then.
pub fn server_message(body: &serde_json::Value) -> Option<String> {
	for key in ["message", "error", "detail"] {
		match body.get(key) {
			Some(serde_json::Value::String(s)) if !s.trim().is_empty() => return Some(s.clone()),
			Some(serde_json::Value::Array(items)) => {
				if let Some(msg) = items
					.first()
					.and_then(|item| item.get("msg"))
					.and_then(|msg| msg.as_str())
				{
					return Some(msg.to_string());
				}
			}
			_ => {}
		}
	}
	None
}

/// A single field that failed validation.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldError {
	pub field: &'static str,
	pub message: String,
}

impl FieldError {
	pub fn new(field: &'static str, message: impl Into<String>) -> Self {
		Self {
			field,
			message: message.into(),
		}
	}
}

impl fmt::Display for FieldError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}: {}", self.field, self.message)
	}
}

/// Steps of an analysis run, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnalysisStep {
	Persisting,
	Materializing,
	Running,
	StoringResults,
}

impl fmt::Display for AnalysisStep {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(match self {
			AnalysisStep::Persisting => "saving the scenario",
			AnalysisStep::Materializing => "saving scenario components",
			AnalysisStep::Running => "running the analysis",
			AnalysisStep::StoringResults => "storing the results",
		})
	}
}

/// Failures surfaced by the scenario editor.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SyncError {
	#[error("Please fix the highlighted fields: {}", join_fields(.0))]
	Validation(Vec<FieldError>),

	#[error("{0}")]
	Precondition(String),

	#[error(transparent)]
	Api(#[from] ApiError),

	#[error("Failed while {step}: {source}")]
	Step { step: AnalysisStep, source: ApiError },
}

fn join_fields(fields: &[FieldError]) -> String {
	fields
		.iter()
		.map(ToString::to_string)
		.collect::<Vec<_>>()
		.join(", ")
}

impl SyncError {
	pub fn at(step: AnalysisStep) -> impl FnOnce(SyncError) -> SyncError {
		move |err| match err {
			SyncError::Api(source) => SyncError::Step { step, source },
			other => other,
		}
	}
}

#[cfg(test)]
mod tests {
	use serde_json::json;

	use super::*;

	#[test]
	fn server_message_prefers_message_then_error_then_detail() {
		assert_eq!(
			server_message(&json!({"detail": "d", "error": "e"})).as_deref(),
			Some("e")
		);
		assert_eq!(
			server_message(&json!({"detail": "Scenario not found"})).as_deref(),
			Some("Scenario not found")
		);
		assert_eq!(
			server_message(&json!({"detail": [{"msg": "field required"}]})).as_deref(),
			Some("field required")
		);
		assert_eq!(server_message(&json!({"message": "  "})), None);
	}

	#[test]
	fn from_body_falls_back_to_generic_message() {
		let err = ApiError::from_body(500, &serde_json::Value::Null);
		assert_eq!(err.to_string(), "Request failed with status 500");
		assert_eq!(ApiError::from_body(401, &json!({"detail": "x"})), ApiError::Unauthorized);
		assert_eq!(ApiError::from_body(404, &serde_json::Value::Null), ApiError::NotFound);
	}

	#[test]
	fn step_errors_name_the_failed_step() {
		let err = SyncError::at(AnalysisStep::Running)(SyncError::Api(ApiError::Server {
			status: 400,
			message: "Scenario must have at least one risk event".into(),
		}));
		assert_eq!(
			err.to_string(),
			"Failed while running the analysis: Scenario must have at least one risk event"
		);
	}
}
