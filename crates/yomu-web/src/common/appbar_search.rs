use std::rc::Rc;

use dominator::{clone, html, with_node, Dom, EventOptions};
use futures_signals::signal::{Mutable, SignalExt};
use wasm_bindgen::UnwrapThrowExt;
use web_sys::HtmlInputElement;
use yomu_lib::browse::AppbarSearch;

use super::{events, icons};

/// Search field of the app bar, submitting into `on_submit`
pub struct AppbarSearchField {
    state: Mutable<AppbarSearch>,
    on_submit: Box<dyn Fn(Option<String>)>,
}

impl AppbarSearchField {
    pub fn new<F>(closable: bool, query: Option<&str>, on_submit: F) -> Rc<Self>
    where
        F: Fn(Option<String>) + 'static,
    {
        Rc::new(Self {
            state: Mutable::new(AppbarSearch::new(closable, query)),
            on_submit: Box::new(on_submit),
        })
    }

    pub fn reset_to(&self, query: Option<&str>) {
        self.state.lock_mut().reset_to(query);
    }

    fn submit(&self) {
        let query = self.state.lock_mut().submit();
        if query.is_some() {
            (self.on_submit)(query);
        }
    }

    fn cancel(&self) {
        self.state.lock_mut().cancel();
        (self.on_submit)(None);
    }

    pub fn render(this: Rc<Self>) -> Dom {
        html!("div", {
            .class("appbar-search")
            .global_event_with_options(&EventOptions::preventable(), clone!(this => move |e: events::KeyDown| {
                if this.state.lock_mut().handle_key(&e.key(), e.ctrl_key()) {
                    e.prevent_default();
                }
            }))
            .child_signal(this.state.signal_ref(|state| state.is_open(None)).dedupe().map(clone!(this => move |open| {
                if open {
                    let value = this.state.lock_ref().search_string().to_string();
                    Some(html!("input" => HtmlInputElement, {
                        .attr("type", "search")
                        .attr("placeholder", "Search")
                        .prop("value", &value)
                        .focused(true)
                        .with_node!(input => {
                            .event(clone!(this, input => move |_: events::Input| {
                                this.state.lock_mut().input(&input.value());
                            }))
                            .event_with_options(&EventOptions::preventable(), clone!(this => move |e: events::KeyDown| {
                                match e.key().as_str() {
                                    "Enter" => {
                                        e.prevent_default();
                                        this.submit();
                                    }
                                    "Escape" => {
                                        this.cancel();
                                        input.blur().unwrap_throw();
                                    }
                                    _ => {}
                                }
                            }))
                        })
                        .event(clone!(this => move |_: events::Blur| this.state.lock_mut().blur()))
                    }))
                } else {
                    Some(html!("button", {
                        .event(clone!(this => move |_: events::Click| this.state.lock_mut().open()))
                        .children(&mut [
                            icons::search()
                        ])
                    }))
                }
            })))
        })
    }
}
