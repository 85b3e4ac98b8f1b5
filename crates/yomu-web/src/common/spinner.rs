use std::rc::Rc;

use dominator::{clone, html, Dom};
use futures_signals::signal::{self, Mutable};

use super::events;

pub struct Spinner {
    pub active: Mutable<bool>,
    fullscreen: bool,
    callback: Option<Box<dyn Fn()>>,
}

impl Spinner {
    pub fn new() -> Rc<Self> {
        Self::new_with_fullscreen(false)
    }

    pub fn new_with_fullscreen(fullscreen: bool) -> Rc<Self> {
        Rc::new(Self {
            active: Mutable::new(false),
            fullscreen,
            callback: None,
        })
    }

    /// Fullscreen spinner with a cancel button running `f`
    pub fn new_with_cancel<F>(f: F) -> Rc<Self>
    where
        F: Fn() + 'static,
    {
        Rc::new(Self {
            active: Mutable::new(false),
            fullscreen: true,
            callback: Some(Box::new(f)),
        })
    }

    pub fn set_active(&self, active: bool) {
        self.active.set_neq(active);
    }

    pub fn render(this: Rc<Self>) -> Dom {
        html!("div", {
            .class("spinner")
            .class_signal("fullscreen", signal::always(this.fullscreen))
            .visible_signal(this.active.signal())
            .children(&mut [
                html!("div", {
                    .class("loader")
                })
            ])
            .apply_if(this.callback.is_some(), |dom| {
                dom.child(html!("button", {
                    .style("margin-top", "0.25rem")
                    .event(clone!(this => move |_: events::Click| {
                        if let Some(callback) = this.callback.as_ref() {
                            callback();
                        }
                        this.set_active(false);
                    }))
                    .text("Cancel")
                }))
            })
        })
    }

    pub fn render_spinner(fullscreen: bool) -> Dom {
        html!("div", {
            .class("spinner")
            .apply_if(fullscreen, |dom| dom.class("fullscreen"))
            .children(&mut [
                html!("div", {
                    .class("loader")
                })
            ])
        })
    }
}
