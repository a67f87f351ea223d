//! Dashboard statistics. Shown as returned; only the top-level metrics are
//! picked out for the summary cards.

use futures::future::join3;
use serde_json::Value;

use super::envelope::{Normalizer, Shape};
use super::{ApiClient, Transport};
use crate::error::ApiError;

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Dashboard {
	pub overview: Option<Value>,
	pub trends: Option<Value>,
	pub activity: Vec<Value>,
}

impl Dashboard {
	/// Scalar entries of the overview block as label/value pairs.
	pub fn metrics(&self) -> Vec<(String, String)> {
		let Some(overview) = &self.overview else {
			return Vec::new();
		};
		let block = Normalizer::new(vec![
			Shape::DataNamed("overview".into()),
			Shape::Named("overview".into()),
			Shape::Data,
			Shape::Bare,
		])
		.find(overview, |v| v.as_object().filter(|o| !o.contains_key("overview")));
		block
			.map(|object| {
				object
					.iter()
					.filter_map(|(key, value)| {
						let shown = match value {
							Value::Number(n) => n.to_string(),
							Value::String(s) => s.clone(),
							_ => return None,
						};
						Some((label(key), shown))
					})
					.collect()
			})
			.unwrap_or_default()
	}
}

/// `total_risk_score` -> `Total risk score`.
fn label(key: &str) -> String {
	let spaced = key.replace('_', " ");
	let mut chars = spaced.chars();
	match chars.next() {
		Some(first) => first.to_uppercase().chain(chars).collect(),
		None => String::new(),
	}
}

/// Loads the three dashboard blocks together.
///
/// A block whose endpoint fails is left empty; only an expired session
/// fails the whole load.
pub async fn load<T: Transport>(client: &ApiClient<T>) -> Result<Dashboard, ApiError> {
	let config = client.config();
	let (overview, trends, activity) = join3(
		client.get(&config.dashboard_overview),
		client.get(&config.dashboard_trends),
		client.get(&config.dashboard_activity),
	)
	.await;

	let keep = |name: &str, result: Result<Value, ApiError>| match result {
		Ok(value) => Ok(Some(value)),
		Err(ApiError::Unauthorized) => Err(ApiError::Unauthorized),
		Err(err) => {
			log::warn!("dashboard {name} unavailable: {err}");
			Ok(None)
		}
	};
	let overview = keep("overview", overview)?;
	let trends = keep("trends", trends)?;
	let activity = keep("recent activity", activity)?
		.map(|v| Normalizer::for_list(&["activities", "recent_activity"]).list_or_empty(&v))
		.unwrap_or_default();

	Ok(Dashboard {
		overview,
		trends,
		activity,
	})
}

#[cfg(test)]
mod tests {
	use futures::executor::block_on;
	use serde_json::json;

	use super::*;
	use crate::api::HttpResponse;
	use crate::api::mock::MockTransport;

	#[test]
	fn missing_blocks_do_not_fail_the_page() {
		let client = MockTransport::client(|req| {
			if req.url.ends_with("/stats/overview") {
				Ok(HttpResponse::new(
					200,
					json!({"success": true, "data": {"overview": {"total_scenarios": 4, "active_scenarios": 1}, "locations_count": 2}}),
				))
			} else if req.url.ends_with("/recent-activity") {
				Ok(HttpResponse::new(200, json!({"activities": [{"type": "scenario"}]})))
			} else {
				Ok(HttpResponse::new(404, Value::Null))
			}
		});
		let dashboard = block_on(load(&client)).unwrap();
		assert!(dashboard.trends.is_none());
		assert_eq!(dashboard.activity.len(), 1);
		let mut metrics = dashboard.metrics();
		metrics.sort();
		assert_eq!(
			metrics,
			[
				("Active scenarios".to_string(), "1".to_string()),
				("Total scenarios".to_string(), "4".to_string())
			]
		);
	}

	#[test]
	fn expired_session_fails_the_load() {
		let client = MockTransport::client(|_| Ok(HttpResponse::new(401, Value::Null)));
		assert_eq!(block_on(load(&client)), Err(ApiError::Unauthorized));
	}
}
