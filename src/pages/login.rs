use leptos::prelude::*;
use leptos::task::spawn_local;
use leptos_router::hooks::use_navigate;

use crate::api::auth::{self, Registration};
use crate::components::{ErrorBanner, FormField};
use crate::error::FieldError;
use crate::session::AuthState;
use crate::state::AppState;

/// Sign-in and account creation.
#[component]
pub fn LoginPage() -> impl IntoView {
	let app = expect_context::<AppState>();
	let navigate = use_navigate();

	let email = RwSignal::new(String::new());
	let password = RwSignal::new(String::new());
	let full_name = RwSignal::new(String::new());
	let company = RwSignal::new(String::new());
	let is_register = RwSignal::new(false);
	let loading = RwSignal::new(false);
	let error = RwSignal::new(Option::<String>::None);
	let field_errors = RwSignal::new(Vec::<FieldError>::new());

	// already signed in, e.g. after restoring a stored token
	let navigate_signed_in = navigate.clone();
	let auth = app.auth;
	Effect::new(move |_| {
		if matches!(auth.get(), AuthState::Authenticated(_)) {
			navigate_signed_in("/dashboard", Default::default());
		}
	});

	let on_submit = move |_: web_sys::MouseEvent| {
		if loading.get_untracked() {
			return;
		}
		let registering = is_register.get_untracked();
		let email_val = email.get_untracked();
		let password_val = password.get_untracked();
		error.set(None);
		field_errors.set(Vec::new());

		let registration = registering.then(|| Registration {
			full_name: full_name.get_untracked().trim().to_string(),
			email: email_val.trim().to_string(),
			password: password_val.clone(),
			company: Some(company.get_untracked().trim().to_string()).filter(|c| !c.is_empty()),
		});
		if let Some(Err(errors)) = registration.as_ref().map(Registration::validate) {
			field_errors.set(errors);
			return;
		}
		if email_val.trim().is_empty() || password_val.is_empty() {
			error.set(Some("Please fill in all fields".into()));
			return;
		}

		loading.set(true);
		let client = app.client.clone();
		let nav = navigate.clone();
		spawn_local(async move {
			let result = match &registration {
				Some(registration) => auth::register(&client, registration).await,
				None => auth::login(&client, &email_val, &password_val).await,
			};
			loading.set(false);
			match result {
				Ok(_) => nav("/dashboard", Default::default()),
				Err(err) => error.set(Some(err.to_string())),
			}
		});
	};

	view! {
		<div class="page page-login">
			<div class="login-card">
				<h1>"Risk Console"</h1>
				<div class="login-tabs">
					<button
						type="button"
						class=move || if is_register.get() { "login-tab" } else { "login-tab active" }
						on:click=move |_| is_register.set(false)
					>
						"Sign In"
					</button>
					<button
						type="button"
						class=move || if is_register.get() { "login-tab active" } else { "login-tab" }
						on:click=move |_| is_register.set(true)
					>
						"Create Account"
					</button>
				</div>

				<form class="login-form" on:submit=|e| e.prevent_default()>
					<ErrorBanner error=error />
					<Show when=move || is_register.get()>
						<FormField label="Full name" value=full_name field="full_name" errors=field_errors />
						<FormField label="Company" value=company placeholder="Optional" />
					</Show>
					<FormField
						label="Email"
						value=email
						field="email"
						errors=field_errors
						input_type="email"
						placeholder="you@example.com"
					/>
					<FormField
						label="Password"
						value=password
						field="password"
						errors=field_errors
						input_type="password"
					/>
					<button
						type="submit"
						class="btn btn-primary"
						disabled=move || loading.get()
						on:click=on_submit
					>
						{move || match (loading.get(), is_register.get()) {
							(true, true) => "Creating Account...",
							(true, false) => "Signing In...",
							(false, true) => "Create Account",
							(false, false) => "Sign In",
						}}
					</button>
				</form>
			</div>
		</div>
	}
}
