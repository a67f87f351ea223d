use leptos::prelude::*;
use leptos_router::components::{A, Redirect};

use crate::config::Catalog;
use crate::session::AuthState;
use crate::state::AppState;

/// Top bar shown on every signed-in page.
#[component]
pub fn NavBar() -> impl IntoView {
	let app = expect_context::<AppState>();
	let auth = app.auth;
	let user_name = move || {
		auth.with(|state| {
			state
				.user()
				.map(|u| u.display_name().to_string())
				.unwrap_or_default()
		})
	};

	view! {
		<nav class="top-nav">
			<span class="brand">"Risk Console"</span>
			<A href="/dashboard">"Dashboard"</A>
			<A href="/scenarios">"Scenarios"</A>
			{Catalog::ALL
				.into_iter()
				.map(|catalog| {
					view! { <A href=format!("/catalog/{}", catalog.key())>{catalog.title()}</A> }
				})
				.collect_view()}
			<span class="nav-spacer"></span>
			<span class="nav-user">{user_name}</span>
			<button type="button" class="btn btn-ghost" on:click=move |_| app.logout()>
				"Sign out"
			</button>
		</nav>
	}
}

/// Renders `children` only for a signed-in user.
///
/// While the stored token is still being checked a placeholder is shown;
/// once the session is known to be missing or expired the user is sent to
/// the login page.
#[component]
pub fn Protected(children: ChildrenFn) -> impl IntoView {
	let auth = expect_context::<AppState>().auth;
	move || match auth.get() {
		AuthState::Unknown => view! { <p class="loading">"Checking session..."</p> }.into_any(),
		AuthState::Unauthenticated => view! { <Redirect path="/login" /> }.into_any(),
		AuthState::Authenticated(_) => view! {
			<NavBar />
			<main class="page-body">{children()}</main>
		}
		.into_any(),
	}
}
