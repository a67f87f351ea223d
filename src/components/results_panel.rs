use leptos::prelude::*;

use crate::scenario::AnalysisResult;
use crate::scenario::results::format_currency;

/// `2025-03-01T10:15:00Z` -> `2025-03-01 10:15`. Unparseable input is shown as is.
pub fn format_timestamp(raw: &str) -> String {
	chrono::DateTime::parse_from_rfc3339(raw)
		.map(|t| t.format("%Y-%m-%d %H:%M").to_string())
		.or_else(|_| {
			chrono::NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
				.map(|t| t.format("%Y-%m-%d %H:%M").to_string())
		})
		.unwrap_or_else(|_| raw.to_string())
}

fn metric(label: &'static str, value: String) -> impl IntoView {
	view! {
		<div class="metric">
			<span class="metric-label">{label}</span>
			<span class="metric-value">{value}</span>
		</div>
	}
}

/// Latest analysis output, or a prompt when there is none yet.
#[component]
pub fn ResultsPanel(
	#[prop(into)] result: Signal<Option<AnalysisResult>>,
	#[prop(into)] history: Signal<Vec<AnalysisResult>>,
) -> impl IntoView {
	let latest = move || {
		result.get().map(|r| {
			let band = r.risk_band();
			let counts = &r.components_analyzed;
			let analyzed = format!(
				"{} events, {} assets, {} defenses",
				counts.risk_events, counts.business_assets, counts.defense_systems
			);
			view! {
				<div class="results-grid">
					<div class=format!("risk-score risk-{}", band.to_ascii_lowercase())>
						<span class="score">{format!("{:.0}", r.risk_score)}</span>
						<span class="band">{band}" risk"</span>
					</div>
					{metric("Expected annual loss", format_currency(r.expected_annual_loss))}
					{metric("Median impact (P50)", format_currency(r.p50_median_impact))}
					{metric("Severe impact (P90)", format_currency(r.p90_severe_impact))}
					{metric("P95 impact", format_currency(r.p95_impact))}
					{metric("Worst case (P99)", format_currency(r.p99_worst_case))}
					{metric("Value at risk (95%)", format_currency(r.value_at_risk_95))}
					{metric("Conditional VaR (95%)", format_currency(r.conditional_var_95))}
					{metric("Security ROI", format!("{:.1}%", r.security_roi))}
					{metric("Defense cost", format_currency(r.total_defense_cost))}
					{metric("Asset value", format_currency(r.total_asset_value))}
					{metric("Iterations", r.iterations.to_string())}
					{metric("Analyzed", analyzed)}
				</div>
			}
		})
	};

	view! {
		<section class="results-panel">
			<h3>"Analysis results"</h3>
			<Show
				when=move || result.with(Option::is_some)
				fallback=|| view! { <p class="hint">"Run an analysis to see loss estimates."</p> }
			>
				{latest}
			</Show>
			<Show when=move || history.with(|h| !h.is_empty())>
				<h4>"Previous runs"</h4>
				<ul class="result-history">
					{move || {
						history
							.get()
							.into_iter()
							.map(|r| {
								let when = r
									.generated_at
									.as_deref()
									.map(format_timestamp)
									.unwrap_or_else(|| "-".into());
								view! {
									<li>
										<span>{when}</span>
										<span>{format_currency(r.expected_annual_loss)}</span>
										<span>{r.risk_band()}</span>
									</li>
								}
							})
							.collect_view()
					}}
				</ul>
			</Show>
		</section>
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn timestamps_are_shortened() {
		assert_eq!(format_timestamp("2025-03-01T10:15:42Z"), "2025-03-01 10:15");
		assert_eq!(format_timestamp("2025-03-01T10:15:42.123456"), "2025-03-01 10:15");
		assert_eq!(format_timestamp("yesterday"), "yesterday");
	}
}
