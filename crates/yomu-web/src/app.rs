use std::rc::Rc;

use dominator::routing;
use dominator::{clone, html, Dom};
use futures_signals::map_ref;
use futures_signals::signal::SignalExt;
use yomu_lib::auth::AuthPhase;

use crate::auth::{self, auth};
use crate::common::{bottombar, empty_view, snackbar, Route, Spinner};
use crate::downloads::Downloads;
use crate::library::Library;
use crate::login::Login;
use crate::manga::Manga;
use crate::reader::Reader;
use crate::settings::Settings;
use crate::source_browse::SourceBrowse;
use crate::sources::Sources;
use crate::utils::AsyncLoader;

/// What the guard lets through for the current location
#[derive(Debug, Clone, PartialEq)]
enum Gate {
    Splash,
    Failed(String),
    Login,
    Home,
    Screen(Route),
}

fn gate(required: Option<bool>, phase: &AuthPhase, signed_in: bool, route: Route) -> Gate {
    match required {
        None => Gate::Splash,
        Some(false) => Gate::Screen(route),
        Some(true) => match phase {
            AuthPhase::Error(message) => Gate::Failed(message.clone()),
            phase if !phase.is_settled() => Gate::Splash,
            _ if !signed_in && !route.is_public() => Gate::Login,
            _ if signed_in && matches!(route, Route::Login) => Gate::Home,
            _ => Gate::Screen(route),
        },
    }
}

pub struct App {
    loader: AsyncLoader,
}

impl App {
    pub fn new() -> Rc<Self> {
        Rc::new(App {
            loader: AsyncLoader::new(),
        })
    }

    fn initialize_auth(app: Rc<Self>) {
        app.loader.load(auth::initialize());
    }

    fn render_splash() -> Dom {
        html!("div", {
            .class("splash")
            .children(&mut [
                html!("img", {
                    .attr("src", "/logo.svg")
                    .attr("alt", "yomu")
                }),
                Spinner::render_spinner(false),
            ])
        })
    }

    fn render_screen(route: Route) -> Dom {
        match route {
            Route::Login => Login::render(Login::new()),
            Route::Library => Library::render(Library::new()),
            Route::Sources => Sources::render(Sources::new()),
            Route::SourceBrowse {
                source_id,
                content_type,
                query,
            } => SourceBrowse::render(SourceBrowse::new(source_id, content_type, query)),
            Route::Manga(manga_id) => Manga::render(Manga::new(manga_id)),
            Route::Chapter(chapter_id, page) => Reader::render(Reader::new(chapter_id, page)),
            Route::Downloads => Downloads::render(Downloads::new()),
            Route::Settings(category) => Settings::render(Settings::new(category)),
            Route::NotFound => empty_view::render("Page not found", None),
        }
    }

    pub fn render(app: Rc<Self>) -> Dom {
        Self::initialize_auth(app.clone());

        let auth = auth();
        let current_gate = map_ref! {
            let required = auth.auth_required_signal(),
            let phase = auth.phase_signal(),
            let signed_in = auth.session_signal().map(|session| session.is_some()),
            let route = Route::signal() =>
            gate(*required, phase, *signed_in, route.clone())
        };

        html!("div", {
            .child_signal(current_gate.dedupe_cloned().map(clone!(app => move |gate| {
                debug!("gate: {:?}", gate);
                match gate {
                    Gate::Splash => Some(Self::render_splash()),
                    Gate::Failed(message) => Some(empty_view::render_with_retry(
                        &format!("Could not reach the authentication service: {}", message),
                        clone!(app => move || Self::initialize_auth(app.clone())),
                    )),
                    Gate::Login => {
                        info!("not signed in, go to login");
                        routing::go_to_url(&Route::Login.url());
                        None
                    }
                    Gate::Home => {
                        info!("already signed in, leave login");
                        routing::go_to_url(&Route::Library.url());
                        None
                    }
                    Gate::Screen(route) => Some(Self::render_screen(route)),
                }
            })))
            .child_signal(Route::signal().map(|route| {
                route.has_bottombar().then(|| html!("div", {
                    .children(&mut [
                        html!("div", {
                            .class("bottombar-spacing")
                        }),
                        bottombar::render(),
                    ])
                }))
            }))
            .children(&mut [
                snackbar::render(),
            ])
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_splash_until_guard_mounts_and_settles() {
        assert_eq!(gate(None, &AuthPhase::Ready, true, Route::Sources), Gate::Splash);
        assert_eq!(
            gate(Some(true), &AuthPhase::Authenticating { attempt: 1 }, false, Route::Sources),
            Gate::Splash
        );
        assert_eq!(
            gate(Some(true), &AuthPhase::Unauthenticated, false, Route::Login),
            Gate::Splash
        );
    }

    #[test]
    fn test_signed_out_goes_to_login() {
        assert_eq!(gate(Some(true), &AuthPhase::Ready, false, Route::Library), Gate::Login);
        assert_eq!(
            gate(Some(true), &AuthPhase::Ready, false, Route::Login),
            Gate::Screen(Route::Login)
        );
        assert_eq!(
            gate(Some(true), &AuthPhase::Ready, true, Route::Library),
            Gate::Screen(Route::Library)
        );
    }

    #[test]
    fn test_signed_in_leaves_login() {
        assert_eq!(gate(Some(true), &AuthPhase::Ready, true, Route::Login), Gate::Home);
        assert_eq!(
            gate(Some(true), &AuthPhase::Ready, true, Route::Sources),
            Gate::Screen(Route::Sources)
        );
        assert_eq!(
            gate(Some(false), &AuthPhase::Unauthenticated, false, Route::Login),
            Gate::Screen(Route::Login)
        );
    }

    #[test]
    fn test_failure_and_optional_auth() {
        assert_eq!(
            gate(Some(true), &AuthPhase::Error("timeout".to_string()), false, Route::Sources),
            Gate::Failed("timeout".to_string())
        );
        assert_eq!(
            gate(Some(false), &AuthPhase::Unauthenticated, false, Route::Downloads),
            Gate::Screen(Route::Downloads)
        );
    }
}
