use std::rc::Rc;

use dominator::{clone, html, Dom};
use futures_signals::signal::{Mutable, SignalExt};
use gloo_timers::callback::Timeout;

use crate::common::{events, icons};

const DISMISS_AFTER_MS: u32 = 5_000;

thread_local! {
    static SNACKBAR: Rc<Snackbar> = Snackbar::new();
}

/// Transient notification, the last message wins
pub fn show(message: String) {
    SNACKBAR.with(|s| Snackbar::show(s.clone(), message));
}

pub fn render() -> Dom {
    SNACKBAR.with(|s| Snackbar::render(s.clone()))
}

pub struct Snackbar {
    message: Mutable<Option<String>>,
    timeout: Mutable<Option<Timeout>>,
}

impl Snackbar {
    pub fn new() -> Rc<Self> {
        Rc::new(Self {
            message: Mutable::new(None),
            timeout: Mutable::new(None),
        })
    }

    fn show(snackbar: Rc<Self>, message: String) {
        debug!("snackbar: {}", message);
        snackbar.message.set(Some(message));

        let timeout = Timeout::new(DISMISS_AFTER_MS, clone!(snackbar => move || {
            snackbar.message.set(None);
        }));
        // dropping the previous timeout cancels it
        snackbar.timeout.set(Some(timeout));
    }

    fn dismiss(&self) {
        self.message.set(None);
        self.timeout.set(None);
    }

    pub fn render(snackbar: Rc<Self>) -> Dom {
        html!("div", {
            .class("snackbar")
            .visible_signal(snackbar.message.signal_ref(|message| message.is_some()))
            .children(&mut [
                html!("div", {
                    .child_signal(snackbar.message.signal_cloned().map(|message| message.map(|msg| html!("span", {
                            .text(msg.as_str())
                        })
                    )))
                    .children(&mut [
                        html!("button", {
                            .event(clone!(snackbar => move |_: events::Click| snackbar.dismiss()))
                            .children(&mut [
                                icons::x_mark(),
                            ])
                        })
                    ])
                })
            ])
        })
    }
}
