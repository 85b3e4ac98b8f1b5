use dominator::{html, Dom};

use super::{events, icons};

/// Placeholder shown when a list is empty or its fetch failed
pub fn render(message: &str, extra: Option<&str>) -> Dom {
    html!("div", {
        .class("empty-view")
        .children(&mut [
            html!("span", {
                .class("message")
                .text(message)
            })
        ])
        .apply_if(extra.is_some(), |dom| dom.child(html!("span", {
            .class("extra")
            .text(extra.unwrap_or_default())
        })))
    })
}

/// Failed fetch with a button retrying it
pub fn render_with_retry<F>(message: &str, retry: F) -> Dom
where
    F: Fn() + 'static,
{
    html!("div", {
        .class("empty-view")
        .children(&mut [
            html!("span", {
                .class("message")
                .text(message)
            }),
            html!("button", {
                .event(move |_: events::Click| retry())
                .children(&mut [
                    icons::refresh(),
                    html!("span", {
                        .text("Retry")
                    })
                ])
            })
        ])
    })
}
