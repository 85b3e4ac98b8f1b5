use std::rc::Rc;

use dominator::{clone, html, with_node, Dom};
use futures_signals::signal::{self, Mutable, Signal, SignalExt};
use web_sys::{HtmlInputElement, HtmlSelectElement};
use yomu_lib::{
    reader::{ReadingDirection, ReadingMode},
    reader_settings::{
        storage_key, Background, BlendMode, CustomFilter, Fit, ReaderSettings, RgbaChannel, Toggle,
    },
};

use super::{events, snackbar};
use crate::utils::{local_storage, save_settings};

/// Reader options editor, modal inside the reader and inline on the settings page
pub struct ReaderSettingsPanel {
    manga_id: Option<i64>,
    autosave: bool,
    pub settings: Mutable<ReaderSettings>,
}

impl ReaderSettingsPanel {
    pub fn new(manga_id: Option<i64>, autosave: bool) -> Rc<Self> {
        Rc::new(Self {
            manga_id,
            autosave,
            settings: Mutable::new(load(manga_id)),
        })
    }

    pub fn signal(&self) -> impl Signal<Item = ReaderSettings> + use<> {
        self.settings.signal()
    }

    fn update<F>(&self, f: F)
    where
        F: FnOnce(&mut ReaderSettings),
    {
        let mut settings = self.settings.get();
        f(&mut settings);
        self.settings.set_neq(settings);
    }

    fn save(&self) {
        save_settings(&storage_key(self.manga_id), &self.settings.get());
    }

    /// Drops the per-manga override and goes back to the global settings
    fn reset(&self) {
        if let Some(manga_id) = self.manga_id {
            if let Err(e) = local_storage().delete(&storage_key(Some(manga_id))) {
                snackbar::show(format!("failed to reset settings: {:?}", e));
                return;
            }
        }
        self.settings.set_neq(load(None));
    }

    fn render_choice<T, G, S>(this: Rc<Self>, label: &str, options: Vec<(T, &str)>, get: G, set: S) -> Dom
    where
        T: Copy + PartialEq + 'static,
        G: Fn(&ReaderSettings) -> T + Copy + 'static,
        S: Fn(&mut ReaderSettings, T) + Copy + 'static,
    {
        let width = format!("{}%", 100.0 / options.len() as f64);
        html!("div", {
            .children(&mut [
                html!("label", {
                    .style("margin", "0.5rem")
                    .text(label)
                }),
                html!("div", {
                    .class("reader-settings-row")
                    .children(options.into_iter().map(|(value, text)| html!("button", {
                        .style("width", &width)
                        .class_signal("active", this.settings.signal_ref(move |settings| get(settings) == value))
                        .text(text)
                        .event(clone!(this => move |_: events::Click| this.update(|settings| set(settings, value))))
                    })))
                })
            ])
        })
    }

    fn render_checkbox<G, S>(this: Rc<Self>, label: &str, get: G, set: S) -> Dom
    where
        G: Fn(&ReaderSettings) -> bool + Copy + 'static,
        S: Fn(&mut ReaderSettings, bool) + Copy + 'static,
    {
        html!("label", {
            .class("reader-settings-check")
            .children(&mut [
                html!("input" => HtmlInputElement, {
                    .attr("type", "checkbox")
                    .with_node!(input => {
                        .future(this.settings.signal_ref(move |settings| get(settings)).for_each(clone!(input => move |checked| {
                            input.set_checked(checked);
                            async {}
                        })))
                        .event(clone!(this => move |_: events::Change| {
                            let checked = input.checked();
                            this.update(|settings| set(settings, checked));
                        }))
                    })
                }),
                html!("span", {
                    .text(label)
                })
            ])
        })
    }

    fn render_slider<G, S>(this: Rc<Self>, label: &str, max: u16, get: G, set: S) -> Dom
    where
        G: Fn(&ReaderSettings) -> u16 + Copy + 'static,
        S: Fn(&mut ReaderSettings, u16) + Copy + 'static,
    {
        html!("div", {
            .class("reader-settings-slider")
            .children(&mut [
                html!("span", {
                    .text(label)
                }),
                html!("input" => HtmlInputElement, {
                    .attr("type", "range")
                    .attr("min", "0")
                    .attr("max", &max.to_string())
                    .prop_signal("value", this.settings.signal_ref(move |settings| get(settings).to_string()))
                    .with_node!(input => {
                        .event(clone!(this => move |_: events::Input| {
                            if let Ok(value) = input.value().parse::<u16>() {
                                this.update(|settings| set(settings, value.min(max)));
                            }
                        }))
                    })
                }),
                html!("span", {
                    .class("value")
                    .text_signal(this.settings.signal_ref(move |settings| get(settings).to_string()))
                })
            ])
        })
    }

    fn render_rgba(this: Rc<Self>) -> Dom {
        html!("div", {
            .children(&mut [
                Self::render_checkbox(
                    this.clone(),
                    "Color filter",
                    |s| s.custom_filter.rgba.enabled,
                    |s, enabled| s.custom_filter.rgba.enabled = enabled,
                ),
                html!("div", {
                    .visible_signal(this.settings.signal_ref(|settings| settings.custom_filter.rgba.enabled))
                    .children(RgbaChannel::ALL.into_iter().map(|channel| {
                        html!("div", {
                            .class("reader-settings-slider")
                            .children(&mut [
                                Self::render_slider(
                                    this.clone(),
                                    channel.label(),
                                    channel.max() as u16,
                                    move |s| s.custom_filter.rgba.value.get(channel) as u16,
                                    move |s, value| s.custom_filter.rgba.value.set(channel, value as u8),
                                ),
                                html!("button", {
                                    .text("Reset")
                                    .event(clone!(this => move |_: events::Click| {
                                        this.update(|s| s.custom_filter.rgba.value.reset(channel));
                                    }))
                                })
                            ])
                        })
                    }))
                    .child(html!("select" => HtmlSelectElement, {
                        .children(BlendMode::ALL.into_iter().map(|mode| html!("option", {
                            .attr("value", mode.css_value())
                            .prop_signal("selected", this.settings.signal_ref(move |s| s.custom_filter.rgba.value.blend_mode == mode))
                            .text(mode.css_value())
                        })))
                        .with_node!(select => {
                            .event(clone!(this => move |_: events::Change| {
                                if let Some(mode) = BlendMode::parse(&select.value()) {
                                    this.update(|s| s.custom_filter.rgba.value.blend_mode = mode);
                                }
                            }))
                        })
                    }))
                })
            ])
        })
    }

    fn render_percentage(this: Rc<Self>, label: &'static str, field: fn(&mut CustomFilter) -> &mut Toggle<u16>) -> Dom {
        let get = move |s: &ReaderSettings| {
            let mut filter = s.custom_filter;
            *field(&mut filter)
        };
        html!("div", {
            .children(&mut [
                Self::render_checkbox(
                    this.clone(),
                    label,
                    move |s| get(s).enabled,
                    move |s, enabled| field(&mut s.custom_filter).enabled = enabled,
                ),
                html!("div", {
                    .visible_signal(this.settings.signal_ref(move |s| get(s).enabled))
                    .children(&mut [
                        Self::render_slider(
                            this.clone(),
                            label,
                            CustomFilter::MAX_PERCENTAGE,
                            move |s| get(s).value,
                            move |s, value| field(&mut s.custom_filter).value = value,
                        )
                    ])
                })
            ])
        })
    }

    fn render_buttons(this: Rc<Self>) -> Dom {
        html!("div", {
            .class("reader-settings-row")
            .visible_signal(signal::always(!this.autosave))
            .children(&mut [
                html!("button", {
                    .text("Default")
                    .event(clone!(this => move |_: events::Click| this.reset()))
                }),
                html!("button", {
                    .text("Save")
                    .event(clone!(this => move |_: events::Click| {
                        this.save();
                        snackbar::show("Reader settings saved".to_string());
                    }))
                })
            ])
        })
    }

    pub fn render(this: Rc<Self>) -> Dom {
        html!("div", {
            .class("reader-settings")
            .apply_if(this.autosave, |dom| dom.future(this.settings.signal().for_each(clone!(this => move |_| {
                this.save();
                async {}
            }))))
            .children(&mut [
                Self::render_choice(
                    this.clone(),
                    "Reading mode",
                    ReadingMode::ALL.into_iter().map(|mode| (mode, mode.label())).collect(),
                    |s| s.reading_mode,
                    |s, mode| s.reading_mode = mode,
                ),
                Self::render_choice(
                    this.clone(),
                    "Direction",
                    vec![(ReadingDirection::Ltr, "Left to Right"), (ReadingDirection::Rtl, "Right to Left")],
                    |s| s.reading_direction,
                    |s, direction| s.reading_direction = direction,
                ),
                Self::render_choice(
                    this.clone(),
                    "Fit",
                    vec![(Fit::Height, "Height"), (Fit::Width, "Width"), (Fit::All, "All")],
                    |s| s.fit,
                    |s, fit| s.fit = fit,
                ),
                Self::render_choice(
                    this.clone(),
                    "Background",
                    vec![(Background::Black, "Black"), (Background::Gray, "Gray"), (Background::White, "White")],
                    |s| s.background,
                    |s, background| s.background = background,
                ),
                Self::render_checkbox(this.clone(), "Padding", |s| s.padding, |s, padding| s.padding = padding),
                Self::render_percentage(this.clone(), "Brightness", |f| &mut f.brightness),
                Self::render_percentage(this.clone(), "Contrast", |f| &mut f.contrast),
                Self::render_checkbox(
                    this.clone(),
                    "Grayscale",
                    |s| s.custom_filter.grayscale,
                    |s, grayscale| s.custom_filter.grayscale = grayscale,
                ),
                Self::render_checkbox(
                    this.clone(),
                    "Invert",
                    |s| s.custom_filter.invert,
                    |s, invert| s.custom_filter.invert = invert,
                ),
                Self::render_rgba(this.clone()),
                Self::render_buttons(this),
            ])
        })
    }
}

/// Per-manga settings, falling back to the global ones
pub fn load(manga_id: Option<i64>) -> ReaderSettings {
    let get = |key: &str| local_storage().get_item(key).ok().flatten();
    let global = get(&storage_key(None));
    let manga = manga_id.and_then(|id| get(&storage_key(Some(id))));
    ReaderSettings::resolve(manga.as_deref(), global.as_deref())
}
