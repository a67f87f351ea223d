use leptos::prelude::*;

/// 404 Not Found Page
#[component]
pub fn NotFound() -> impl IntoView {
	view! {
		<div class="page page-not-found">
			<span class="not-found-code">"404"</span>
			<h1>"Page Not Found"</h1>
			<p>"The page you're looking for doesn't exist or has been moved."</p>
			<a href="/dashboard" class="btn btn-primary">
				"Back to dashboard"
			</a>
		</div>
	}
}
