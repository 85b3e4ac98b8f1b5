use dominator::{html, Dom};
use futures_signals::signal::{Signal, SignalExt};

use super::events;

/// Include, exclude, then back to ignoring the attribute
pub fn cycle(value: Option<bool>) -> Option<bool> {
    match value {
        None => Some(true),
        Some(true) => Some(false),
        Some(false) => None,
    }
}

fn state_class(value: Option<bool>) -> &'static str {
    match value {
        None => "tristate-off",
        Some(true) => "tristate-include",
        Some(false) => "tristate-exclude",
    }
}

/// Chip cycling a three way filter on click
pub fn render<S, F>(label: &str, value: S, on_click: F) -> Dom
where
    S: Signal<Item = Option<bool>> + 'static,
    F: Fn() + 'static,
{
    html!("button", {
        .class("chip")
        .class("tristate")
        .attr_signal("data-state", value.map(state_class))
        .text(label)
        .event(move |_: events::Click| on_click())
    })
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_cycle() {
        assert_eq!(cycle(None), Some(true));
        assert_eq!(cycle(Some(true)), Some(false));
        assert_eq!(cycle(Some(false)), None);
    }
}
