use dominator::{html, link, Dom};
use futures_signals::signal::SignalExt;

use super::{icons, Route, SettingCategory};

fn tab(route: Route, label: &str, icon: Dom, is_active: fn(&Route) -> bool) -> Dom {
    link!(route.url(), {
        .class_signal("active", Route::signal().map(move |current| is_active(&current)))
        .children(&mut [
            icon,
            html!("span", {
                .text(label)
            })
        ])
    })
}

pub fn render() -> Dom {
    html!("div", {
        .class("bottombar")
        .children(&mut [
            tab(Route::Library, "Library", icons::heart(), |route| matches!(route, Route::Library)),
            tab(Route::Sources, "Sources", icons::search(), |route| {
                matches!(route, Route::Sources | Route::SourceBrowse { .. })
            }),
            tab(Route::Downloads, "Downloads", icons::download(), |route| matches!(route, Route::Downloads)),
            tab(Route::Settings(SettingCategory::None), "More", icons::settings(), |route| {
                matches!(route, Route::Settings(_))
            }),
        ])
    })
}
