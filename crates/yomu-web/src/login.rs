use std::rc::Rc;

use dominator::{clone, html, routing, with_node, Dom, EventOptions};
use futures_signals::map_ref;
use futures_signals::signal::{Mutable, SignalExt};
use web_sys::HtmlInputElement;
use yomu_lib::auth::{auth_error_message, can_submit, LoginMode, AUTH_FAILED_MESSAGE, SIGN_UP_SUCCESS_MESSAGE};

use crate::auth::{auth, provider};
use crate::common::{events, snackbar, Route};
use crate::utils::{server_address, set_server_address, AsyncLoader};

/// Enter submits under the same rule as the submit button
fn enter_submits(is_loading: bool, email: &str, password: &str) -> bool {
    can_submit(is_loading, email, password)
}

pub struct Login {
    mode: Mutable<LoginMode>,
    email: Mutable<String>,
    password: Mutable<String>,
    server_address: Mutable<String>,
    loader: AsyncLoader,
}

impl Login {
    pub fn new() -> Rc<Self> {
        Rc::new(Self {
            mode: Mutable::new(LoginMode::SignIn),
            email: Mutable::new("".to_string()),
            password: Mutable::new("".to_string()),
            server_address: Mutable::new(server_address()),
            loader: AsyncLoader::new(),
        })
    }

    fn submit(login: Rc<Self>) {
        let Some(provider) = provider() else {
            snackbar::show(AUTH_FAILED_MESSAGE.to_string());
            return;
        };

        let mode = login.mode.get();
        let email = login.email.get_cloned();
        let password = login.password.get_cloned();
        login.loader.load(clone!(login => async move {
            match mode {
                LoginMode::SignIn => match auth().sign_in(&provider, &email, &password).await {
                    Ok(_) => {
                        login.password.set("".to_string());
                        routing::go_to_url(&Route::Sources.url());
                    }
                    Err(e) => {
                        error!("sign in failed: {}", e);
                        snackbar::show(auth_error_message(&e));
                    }
                },
                LoginMode::SignUp => match auth().sign_up(&provider, &email, &password).await {
                    Ok(()) => {
                        snackbar::show(SIGN_UP_SUCCESS_MESSAGE.to_string());
                        login.password.set("".to_string());
                        login.mode.set(LoginMode::SignIn);
                    }
                    Err(e) => {
                        error!("sign up failed: {}", e);
                        snackbar::show(auth_error_message(&e));
                    }
                },
            }
        }));
    }

    fn render_input(state: &Mutable<String>, kind: &str, placeholder: &str) -> Dom {
        html!("input" => HtmlInputElement, {
            .attr("type", kind)
            .attr("placeholder", placeholder)
            .prop_signal("value", state.signal_cloned())
            .with_node!(input => {
                .event(clone!(state => move |_: events::Input| {
                    state.set(input.value());
                }))
            })
        })
    }

    fn render_server_address(login: Rc<Self>) -> Dom {
        html!("details", {
            .class("server-address")
            .children(&mut [
                html!("summary", {
                    .text("Server")
                }),
                html!("div", {
                    .class("reader-settings-row")
                    .children(&mut [
                        Self::render_input(&login.server_address, "url", "Server address"),
                        html!("button", {
                            .text("Save")
                            .event_with_options(&EventOptions::preventable(), clone!(login => move |e: events::Click| {
                                e.prevent_default();
                                set_server_address(&login.server_address.get_cloned());
                                login.server_address.set(server_address());
                                snackbar::show(format!("Using server {}", server_address()));
                            }))
                        })
                    ])
                })
            ])
        })
    }

    fn render_form(login: Rc<Self>) -> Dom {
        let is_loading = login.loader.is_loading();
        let submit_enabled = map_ref! {
            let is_loading = login.loader.is_loading(),
            let email = login.email.signal_cloned(),
            let password = login.password.signal_cloned() =>
            can_submit(*is_loading, email, password)
        };
        let submit_label = map_ref! {
            let is_loading = is_loading,
            let mode = login.mode.signal() =>
            mode.submit_label(*is_loading)
        };

        html!("form", {
            .style("display", "flex")
            .style("flex-direction", "column")
            .event_with_options(&EventOptions::preventable(), clone!(login => move |e: events::KeyDown| {
                if e.key() == "Enter" {
                    e.prevent_default();
                    let submits = enter_submits(login.loader.is_loading_now(), &login.email.lock_ref(), &login.password.lock_ref());
                    if submits {
                        Self::submit(login.clone());
                    }
                }
            }))
            .children(&mut [
                html!("h1", {
                    .text_signal(login.mode.signal().map(|mode| mode.title()))
                }),
                Self::render_input(&login.email, "email", "Email"),
                Self::render_input(&login.password, "password", "Password"),
                html!("button", {
                    .attr("type", "submit")
                    .prop_signal("disabled", submit_enabled.map(|enabled| !enabled))
                    .text_signal(submit_label)
                    .event_with_options(&EventOptions::preventable(), clone!(login => move |e: events::Click| {
                        e.prevent_default();
                        Self::submit(login.clone());
                    }))
                }),
                html!("button", {
                    .class("link")
                    .text_signal(login.mode.signal().map(|mode| mode.toggle_label()))
                    .event_with_options(&EventOptions::preventable(), clone!(login => move |e: events::Click| {
                        e.prevent_default();
                        login.mode.replace_with(|mode| mode.toggled());
                    }))
                }),
            ])
        })
    }

    pub fn render(login: Rc<Self>) -> Dom {
        html!("div", {
            .class("main")
            .children(&mut [
                html!("div", {
                    .class("content")
                    .class("login")
                    .children(&mut [
                        html!("img", {
                            .class("logo")
                            .attr("src", "/logo.svg")
                        }),
                        Self::render_form(login.clone()),
                        Self::render_server_address(login),
                    ])
                })
            ])
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_enter_ignored_while_loading() {
        assert!(enter_submits(false, "reader@example.com", "secret"));
        assert!(!enter_submits(true, "reader@example.com", "secret"));
        assert!(!enter_submits(false, "", ""));
    }

    #[test]
    fn test_idle_loader_is_not_loading() {
        let loader = AsyncLoader::new();
        assert!(!loader.is_loading_now());
        loader.cancel();
        assert!(!loader.is_loading_now());
    }
}
