use std::rc::Rc;

use dominator::{clone, html, link, routing, with_node, Dom};
use futures_signals::signal::{Mutable, SignalExt};
use web_sys::HtmlInputElement;
use yomu_lib::appearance::{self, AppearanceSettings, ThemeMode};
use yomu_lib::models::is_update_available;

use crate::auth::auth;
use crate::common::{empty_view, events, icons, snackbar, ReaderSettingsPanel, Route, SettingCategory, Spinner};
use crate::query::{self, About};
use crate::utils::{apply_theme, go_back, load_appearance, prefers_dark, save_settings, server_address, AsyncLoader};

fn category_title(category: SettingCategory) -> &'static str {
    match category {
        SettingCategory::None => "More",
        SettingCategory::Appearance => "Appearance",
        SettingCategory::Reader => "Reader",
        SettingCategory::About => "About",
    }
}

pub struct Settings {
    category: SettingCategory,
    appearance: Mutable<AppearanceSettings>,
    about: Mutable<Option<About>>,
    error: Mutable<Option<String>>,
    loader: AsyncLoader,
    spinner: Rc<Spinner>,
}

impl Settings {
    pub fn new(category: SettingCategory) -> Rc<Self> {
        Rc::new(Self {
            category,
            appearance: Mutable::new(load_appearance()),
            about: Mutable::new(None),
            error: Mutable::new(None),
            loader: AsyncLoader::new(),
            spinner: Spinner::new(),
        })
    }

    fn fetch_about(settings: Rc<Self>) {
        settings.spinner.set_active(true);
        settings.error.set_neq(None);
        settings.loader.load(clone!(settings => async move {
            match query::fetch_about().await {
                Ok(about) => settings.about.set(Some(about)),
                Err(e) => {
                    error!("error fetch about: {}", e);
                    settings.error.set(Some(format!("Could not load server info: {}", e)));
                }
            }
            settings.spinner.set_active(false);
        }));
    }

    fn update_appearance<F>(&self, f: F)
    where
        F: FnOnce(&mut AppearanceSettings),
    {
        let mut appearance = self.appearance.lock_mut();
        f(&mut appearance);
        save_settings(appearance::KEY, &*appearance);
        apply_theme(&appearance);
    }

    fn sign_out() {
        if let Err(e) = auth().clear() {
            error!("error clear session: {}", e);
            snackbar::show(format!("Failed to sign out: {}", e));
            return;
        }
        info!("signed out");
        routing::go_to_url(&Route::Login.url());
    }

    fn render_topbar(settings: &Settings) -> Dom {
        html!("div", {
            .class("topbar")
            .apply_if(settings.category != SettingCategory::None, |dom| dom.child(html!("button", {
                .event(|_: events::Click| go_back())
                .children(&mut [
                    icons::chevron_left(),
                ])
            })))
            .child(html!("span", {
                .class("title")
                .text(category_title(settings.category))
            }))
        })
    }

    fn render_categories() -> Dom {
        let entry = |category: SettingCategory| link!(Route::Settings(category).url(), {
            .class("list-item")
            .children(&mut [
                html!("span", {
                    .text(category_title(category))
                }),
                icons::chevron_right(),
            ])
        });

        html!("div", {
            .children(&mut [
                html!("div", {
                    .class("list")
                    .children(&mut [
                        entry(SettingCategory::Appearance),
                        entry(SettingCategory::Reader),
                        entry(SettingCategory::About),
                    ])
                }),
                html!("div", {
                    .class("list")
                    .child_signal(auth().session_signal().map(|session| {
                        session.map(|session| html!("div", {
                            .class("account")
                            .children(&mut [
                                html!("span", {
                                    .class("subtitle")
                                    .text(if session.role.is_admin() { "Administrator" } else { "Member" })
                                }),
                                html!("button", {
                                    .text("Sign out")
                                    .event(|_: events::Click| Self::sign_out())
                                }),
                            ])
                        }))
                    }))
                }),
            ])
        })
    }

    fn render_appearance(settings: Rc<Self>) -> Dom {
        html!("div", {
            .class("settings-appearance")
            .children(&mut [
                html!("span", {
                    .class("header")
                    .text("Theme")
                }),
                html!("div", {
                    .class("reader-settings-row")
                    .children(ThemeMode::ALL.into_iter().map(|mode| html!("button", {
                        .class_signal("active", settings.appearance.signal_ref(move |a| a.theme_mode == mode))
                        .text(mode.label())
                        .event(clone!(settings => move |_: events::Click| settings.update_appearance(|a| a.theme_mode = mode)))
                    })))
                }),
                html!("label", {
                    .class("reader-settings-check")
                    .visible_signal(settings.appearance.signal_ref(|a| a.can_use_pure_black(prefers_dark())))
                    .children(&mut [
                        html!("input" => HtmlInputElement, {
                            .attr("type", "checkbox")
                            .prop_signal("checked", settings.appearance.signal_ref(|a| a.pure_black))
                            .with_node!(input => {
                                .event(clone!(settings => move |_: events::Change| {
                                    let checked = input.checked();
                                    settings.update_appearance(|a| a.pure_black = checked);
                                }))
                            })
                        }),
                        html!("span", {
                            .text("Pure black dark mode")
                        }),
                    ])
                }),
                html!("div", {
                    .class("reader-settings-slider")
                    .children(&mut [
                        html!("span", {
                            .text("Item width")
                        }),
                        html!("input" => HtmlInputElement, {
                            .attr("type", "range")
                            .attr("min", &AppearanceSettings::MIN_ITEM_WIDTH.to_string())
                            .attr("max", &AppearanceSettings::MAX_ITEM_WIDTH.to_string())
                            .attr("step", &AppearanceSettings::ITEM_WIDTH_STEP.to_string())
                            .prop_signal("value", settings.appearance.signal_ref(|a| a.item_width.to_string()))
                            .with_node!(input => {
                                .event(clone!(settings => move |_: events::Input| {
                                    if let Ok(width) = input.value().parse::<u32>() {
                                        settings.update_appearance(|a| a.set_item_width(width));
                                    }
                                }))
                            })
                        }),
                        html!("span", {
                            .class("value")
                            .text_signal(settings.appearance.signal_ref(|a| format!("{}px", a.item_width)))
                        }),
                        html!("button", {
                            .text("Reset")
                            .event(clone!(settings => move |_: events::Click| {
                                settings.update_appearance(|a| a.set_item_width(AppearanceSettings::DEFAULT_ITEM_WIDTH));
                            }))
                        }),
                    ])
                }),
                Self::render_toggle(settings.clone(), "Thumbnail backdrop", |a| a.thumbnail_backdrop, |a, v| a.thumbnail_backdrop = v),
                Self::render_toggle(settings.clone(), "Dynamic color schemes", |a| a.dynamic_color_schemes, |a, v| a.dynamic_color_schemes = v),
            ])
        })
    }

    fn render_toggle(
        settings: Rc<Self>,
        label: &str,
        get: fn(&AppearanceSettings) -> bool,
        set: fn(&mut AppearanceSettings, bool),
    ) -> Dom {
        html!("label", {
            .class("reader-settings-check")
            .children(&mut [
                html!("input" => HtmlInputElement, {
                    .attr("type", "checkbox")
                    .prop_signal("checked", settings.appearance.signal_ref(get))
                    .with_node!(input => {
                        .event(clone!(settings => move |_: events::Change| {
                            let checked = input.checked();
                            settings.update_appearance(|a| set(a, checked));
                        }))
                    })
                }),
                html!("span", {
                    .text(label)
                }),
            ])
        })
    }

    fn render_about_info(about: &About) -> Dom {
        let update_available = is_update_available(&about.webui_tag, &about.available_tag);
        let row = |label: &str, value: &str| html!("div", {
            .class("list-item")
            .children(&mut [
                html!("span", {
                    .text(label)
                }),
                html!("span", {
                    .class("subtitle")
                    .text(value)
                }),
            ])
        });

        html!("div", {
            .class("list")
            .children(&mut [
                row("Server", &about.server_name),
                row("Server version", &about.server_version),
                row("Server address", &server_address()),
                row("Web UI channel", &about.webui_channel),
                row("Web UI version", &about.webui_tag),
                row("Client version", yomu_lib::LIB_VERSION),
            ])
            .apply_if(update_available, |dom| dom.child(html!("div", {
                .class("update-available")
                .text(&format!("Version {} is available", about.available_tag))
            })))
        })
    }

    fn render_about(settings: Rc<Self>) -> Dom {
        Self::fetch_about(settings.clone());

        html!("div", {
            .child_signal(settings.error.signal_cloned().map(clone!(settings => move |error| {
                error.map(|message| empty_view::render_with_retry(&message, clone!(settings => move || {
                    Self::fetch_about(settings.clone());
                })))
            })))
            .child_signal(settings.about.signal_cloned().map(|about| about.map(|about| Self::render_about_info(&about))))
        })
    }

    pub fn render(settings: Rc<Self>) -> Dom {
        let content = match settings.category {
            SettingCategory::None => Self::render_categories(),
            SettingCategory::Appearance => Self::render_appearance(settings.clone()),
            SettingCategory::Reader => ReaderSettingsPanel::render(ReaderSettingsPanel::new(None, true)),
            SettingCategory::About => Self::render_about(settings.clone()),
        };

        html!("div", {
            .class("main")
            .children(&mut [
                Self::render_topbar(&settings),
                html!("div", {
                    .class("topbar-spacing")
                }),
                html!("div", {
                    .class("content")
                    .child(content)
                }),
                Spinner::render(settings.spinner.clone()),
            ])
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_category_title() {
        assert_eq!(category_title(SettingCategory::None), "More");
        assert_eq!(category_title(SettingCategory::About), "About");
    }
}
