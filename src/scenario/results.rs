//! Typed view over the backend's Monte Carlo output.
//!
//! The editor only looks fields up; nothing here recomputes statistics.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ComponentsAnalyzed {
	pub risk_events: u64,
	pub business_assets: u64,
	pub defense_systems: u64,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisResult {
	pub scenario_id: Option<String>,
	pub generated_at: Option<String>,
	pub iterations: u64,
	pub p50_median_impact: f64,
	pub p90_severe_impact: f64,
	pub p95_impact: f64,
	pub p99_worst_case: f64,
	pub expected_annual_loss: f64,
	pub value_at_risk_95: f64,
	pub conditional_var_95: f64,
	pub standard_deviation: f64,
	pub maximum_loss: f64,
	pub minimum_loss: f64,
	pub confidence_intervals: BTreeMap<String, f64>,
	pub security_roi: f64,
	pub risk_score: f64,
	pub total_defense_cost: f64,
	pub total_asset_value: f64,
	pub components_analyzed: ComponentsAnalyzed,
}

impl AnalysisResult {
	/// Reads a result from a run-analysis response or a stored result.
	///
	/// Unknown or mistyped fields are ignored field by field so one odd value
	/// does not hide the rest.
	pub fn from_value(value: &Value) -> Self {
		let payload = match value.get("data") {
			Some(inner @ Value::Object(_)) if inner.get("p50_median_impact").is_some() => inner,
			_ => value,
		};
		serde_json::from_value(payload.clone()).unwrap_or_else(|err| {
			log::debug!("lenient result parse after: {err}");
			lenient(payload)
		})
	}

	pub fn is_empty(&self) -> bool {
		self.iterations == 0 && self.expected_annual_loss == 0.0 && self.p90_severe_impact == 0.0
	}

	/// Risk band shown next to the score.
	pub fn risk_band(&self) -> &'static str {
		match self.risk_score {
			s if s >= 70.0 => "High",
			s if s >= 40.0 => "Medium",
			_ => "Low",
		}
	}
}

fn lenient(value: &Value) -> AnalysisResult {
	let num = |key: &str| value.get(key).and_then(Value::as_f64).unwrap_or(0.0);
	let text = |key: &str| value.get(key).and_then(Value::as_str).map(str::to_string);
	AnalysisResult {
		scenario_id: text("scenario_id"),
		generated_at: text("generated_at"),
		iterations: value.get("iterations").and_then(Value::as_u64).unwrap_or(0),
		p50_median_impact: num("p50_median_impact"),
		p90_severe_impact: num("p90_severe_impact"),
		p95_impact: num("p95_impact"),
		p99_worst_case: num("p99_worst_case"),
		expected_annual_loss: num("expected_annual_loss"),
		value_at_risk_95: num("value_at_risk_95"),
		conditional_var_95: num("conditional_var_95"),
		standard_deviation: num("standard_deviation"),
		maximum_loss: num("maximum_loss"),
		minimum_loss: num("minimum_loss"),
		confidence_intervals: value
			.get("confidence_intervals")
			.and_then(Value::as_object)
			.map(|m| {
				m.iter()
					.filter_map(|(k, v)| Some((k.clone(), v.as_f64()?)))
					.collect()
			})
			.unwrap_or_default(),
		security_roi: num("security_roi"),
		risk_score: num("risk_score"),
		total_defense_cost: num("total_defense_cost"),
		total_asset_value: num("total_asset_value"),
		components_analyzed: value
			.get("components_analyzed")
			.and_then(|v| serde_json::from_value(v.clone()).ok())
			.unwrap_or_default(),
	}
}

/// `$1.2M`, `$75K`, `$950`.
pub fn format_currency(amount: f64) -> String {
	let abs = amount.abs();
	let sign = if amount < 0.0 { "-" } else { "" };
	if abs >= 1_000_000.0 {
		format!("{sign}${:.1}M", abs / 1_000_000.0)
	} else if abs >= 1_000.0 {
		format!("{sign}${:.0}K", abs / 1_000.0)
	} else {
		format!("{sign}${abs:.0}")
	}
}

#[cfg(test)]
mod tests {
	use serde_json::json;

	use super::*;

	#[test]
	fn reads_run_analysis_response() {
		let r = AnalysisResult::from_value(&json!({
			"iterations": 10000,
			"p50_median_impact": 75000.0,
			"p90_severe_impact": 180000.0,
			"expected_annual_loss": 95000.0,
			"confidence_intervals": {"p10": 1.0, "p90": 9.0},
			"components_analyzed": {"risk_events": 2},
			"risk_score": 18.0
		}));
		assert_eq!(r.iterations, 10000);
		assert_eq!(r.p90_severe_impact, 180000.0);
		assert_eq!(r.confidence_intervals.len(), 2);
		assert_eq!(r.components_analyzed.risk_events, 2);
		assert_eq!(r.risk_band(), "Low");
	}

	#[test]
	fn tolerates_mistyped_fields() {
		let r = AnalysisResult::from_value(&json!({
			"iterations": "many",
			"expected_annual_loss": 12.5,
			"confidence_intervals": {"p10": "x", "p25": 2.0}
		}));
		assert_eq!(r.iterations, 0);
		assert_eq!(r.expected_annual_loss, 12.5);
		assert_eq!(r.confidence_intervals.get("p25"), Some(&2.0));
	}

	#[test]
	fn unwraps_data_envelope() {
		let r = AnalysisResult::from_value(&json!({"data": {"p50_median_impact": 5.0}}));
		assert_eq!(r.p50_median_impact, 5.0);
	}

	#[test]
	fn currency_formatting() {
		assert_eq!(format_currency(1_240_000.0), "$1.2M");
		assert_eq!(format_currency(75_000.0), "$75K");
		assert_eq!(format_currency(950.0), "$950");
		assert_eq!(format_currency(-2_000.0), "-$2K");
	}
}
