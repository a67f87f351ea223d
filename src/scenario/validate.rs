//! Form validation, run before anything is sent to the backend.

use super::types::{Attributes, Component, Scenario};
use crate::error::FieldError;

/// Checks a component against its kind's ranges.
pub fn component(c: &Component) -> Result<(), Vec<FieldError>> {
	let mut errors = Vec::new();
	if c.name.trim().is_empty() {
		errors.push(FieldError::new("name", "Name is required"));
	}
	match &c.attributes {
		Attributes::Event(e) => {
			fraction("likelihood", e.likelihood, &mut errors);
			non_negative("severity", e.severity, &mut errors);
			if !e.duration_hrs.is_finite() || e.duration_hrs <= 0.0 {
				errors.push(FieldError::new("durationHrs", "Duration must be greater than zero"));
			}
		}
		Attributes::Asset(a) => non_negative("valuation", a.valuation, &mut errors),
		Attributes::Defense(d) => {
			fraction("mitigationPct", d.mitigation_pct, &mut errors);
			non_negative("annualCostUsd", d.annual_cost_usd, &mut errors);
		}
	}
	if errors.is_empty() { Ok(()) } else { Err(errors) }
}

pub fn scenario(s: &Scenario) -> Result<(), Vec<FieldError>> {
	let mut errors = Vec::new();
	if s.name.trim().is_empty() {
		errors.push(FieldError::new("name", "Scenario name is required"));
	} else if s.name.chars().count() > 100 {
		errors.push(FieldError::new("name", "Scenario name must be at most 100 characters"));
	}
	if s.description.chars().count() > 500 {
		errors.push(FieldError::new(
			"description",
			"Description must be at most 500 characters",
		));
	}
	if errors.is_empty() { Ok(()) } else { Err(errors) }
}

/// Parses a 0-100 percent form input into a 0-1 fraction.
pub fn parse_percent(field: &'static str, input: &str) -> Result<f64, FieldError> {
	let value = parse_number(field, input)?;
	if !(0.0..=100.0).contains(&value) {
		return Err(FieldError::new(field, "Must be between 0 and 100"));
	}
	Ok(super::convert::to_fraction(value))
}

/// Parses a currency or duration input; thousands separators and `$` are ignored.
pub fn parse_number(field: &'static str, input: &str) -> Result<f64, FieldError> {
	let cleaned: String = input
		.chars()
		.filter(|c| !matches!(c, ',' | '$' | '_' | ' '))
		.collect();
	match cleaned.parse::<f64>() {
		Ok(v) if v.is_finite() => Ok(v),
		_ => Err(FieldError::new(field, "Must be a number")),
	}
}

fn fraction(field: &'static str, value: f64, errors: &mut Vec<FieldError>) {
	if !value.is_finite() || !(0.0..=1.0).contains(&value) {
		errors.push(FieldError::new(field, "Must be between 0 and 100 percent"));
	}
}

fn non_negative(field: &'static str, value: f64, errors: &mut Vec<FieldError>) {
	if !value.is_finite() || value < 0.0 {
		errors.push(FieldError::new(field, "Must be zero or more"));
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::scenario::types::{ComponentKind, EventAttrs};

	#[test]
	fn drafts_are_valid() {
		for kind in ComponentKind::ALL {
			assert!(component(&Component::draft(kind)).is_ok(), "{kind}");
		}
	}

	#[test]
	fn event_ranges_are_enforced() {
		let mut c = Component::draft(ComponentKind::Event);
		c.name = " ".into();
		c.attributes = Attributes::Event(EventAttrs {
			likelihood: 1.5,
			severity: -1.0,
			duration_hrs: 0.0,
			category: String::new(),
		});
		let fields: Vec<_> = component(&c).unwrap_err().into_iter().map(|e| e.field).collect();
		assert_eq!(fields, ["name", "likelihood", "severity", "durationHrs"]);
	}

	#[test]
	fn percent_input_becomes_fraction() {
		assert!((parse_percent("likelihood", "15").unwrap() - 0.15).abs() < 1e-12);
		assert!(parse_percent("likelihood", "101").is_err());
		assert!(parse_percent("likelihood", "abc").is_err());
	}

	#[test]
	fn currency_input_ignores_separators() {
		assert_eq!(parse_number("severity", "$500,000").unwrap(), 500_000.0);
		assert!(parse_number("severity", "NaN").is_err());
	}

	#[test]
	fn scenario_name_required() {
		let s = Scenario::new("");
		assert_eq!(scenario(&s).unwrap_err()[0].field, "name");
		assert!(scenario(&Scenario::new("Q4 Review")).is_ok());
	}
}
