use std::rc::Rc;

use dominator::{clone, html, link, with_node, Dom};
use futures_signals::map_ref;
use futures_signals::signal::{Mutable, SignalExt};
use serde::{Deserialize, Serialize};
use wasm_bindgen::prelude::*;
use yomu_lib::browse::SourceContentType;
use yomu_lib::entitlement::AllowList;
use yomu_lib::models::Source;
use yomu_lib::sources::{languages, visible_sources, SourceFilter, SourceGroup, SourceListView};

use crate::auth::auth;
use crate::common::{empty_view, events, snackbar, Route, Spinner};
use crate::query;
use crate::utils::{load_settings, local_storage, save_settings, AsyncLoader};

const KEY: &str = "settings:sources";
const LAST_USED_KEY: &str = "sources:lastUsed";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
struct SourceListSettings {
    show_nsfw: bool,
    languages: Vec<String>,
}

impl Default for SourceListSettings {
    fn default() -> Self {
        Self {
            show_nsfw: true,
            languages: vec![],
        }
    }
}

impl SourceListSettings {
    fn filter(&self) -> SourceFilter {
        SourceFilter {
            show_nsfw: self.show_nsfw,
            languages: self.languages.clone(),
            ..SourceFilter::default()
        }
    }

    fn toggle_language(&mut self, lang: &str) {
        if let Some(index) = self.languages.iter().position(|l| l == lang) {
            self.languages.remove(index);
        } else {
            self.languages.push(lang.to_string());
        }
    }
}

pub struct Sources {
    sources: Mutable<Option<Vec<Source>>>,
    allow_list: Mutable<AllowList>,
    settings: Mutable<SourceListSettings>,
    last_used: Mutable<Option<String>>,
    error: Mutable<Option<String>>,
    loader: AsyncLoader,
    config_loader: AsyncLoader,
    spinner: Rc<Spinner>,
}

impl Sources {
    pub fn new() -> Rc<Self> {
        Rc::new(Self {
            sources: Mutable::new(None),
            allow_list: Mutable::new(AllowList::pending()),
            settings: Mutable::new(load_settings(KEY)),
            last_used: Mutable::new(local_storage().get(LAST_USED_KEY).unwrap_throw()),
            error: Mutable::new(None),
            loader: AsyncLoader::new(),
            config_loader: AsyncLoader::new(),
            spinner: Spinner::new(),
        })
    }

    fn fetch_sources(sources: Rc<Self>) {
        sources.spinner.set_active(true);
        sources.error.set_neq(None);
        sources.loader.load(clone!(sources => async move {
            match query::fetch_sources().await {
                Ok(result) => {
                    debug!("fetched {} sources", result.len());
                    sources.sources.set(Some(result));
                }
                Err(e) => {
                    error!("error fetch sources: {}", e);
                    sources.error.set(Some(format!("Could not load sources: {}", e)));
                }
            }
            sources.spinner.set_active(false);
        }));
    }

    /// A failed fetch leaves the allow-list pending, members then see nothing
    fn fetch_allow_list(sources: Rc<Self>) {
        sources.config_loader.load(clone!(sources => async move {
            match query::fetch_saas_config().await {
                Ok(config) => {
                    info!("allow-list has {} extensions", config.allowed_extensions.len());
                    sources.allow_list.set(config.into_allow_list());
                }
                Err(e) => {
                    error!("error fetch saas config: {}", e);
                    snackbar::show("Failed to load filtered source list".to_string());
                }
            }
        }));
    }

    fn update_settings<F>(&self, f: F)
    where
        F: FnOnce(&mut SourceListSettings),
    {
        let mut settings = self.settings.lock_mut();
        f(&mut settings);
        save_settings(KEY, &*settings);
    }

    fn set_last_used(&self, source_id: &str) {
        if let Err(e) = local_storage().set(LAST_USED_KEY, source_id) {
            error!("error saving last used source: {:?}", e);
        }
        self.last_used.set(Some(source_id.to_string()));
    }

    fn render_topbar(sources: Rc<Self>) -> Dom {
        html!("div", {
            .class("topbar")
            .children(&mut [
                html!("span", {
                    .class("title")
                    .text("Sources")
                }),
                html!("label", {
                    .class("nsfw-toggle")
                    .children(&mut [
                        html!("input" => web_sys::HtmlInputElement, {
                            .attr("type", "checkbox")
                            .prop("checked", sources.settings.lock_ref().show_nsfw)
                            .with_node!(input => {
                                .event(clone!(sources => move |_: events::Change| {
                                    let checked = input.checked();
                                    sources.update_settings(|settings| settings.show_nsfw = checked);
                                }))
                            })
                        }),
                        html!("span", {
                            .text("NSFW")
                        })
                    ])
                })
            ])
        })
    }

    fn render_languages(sources: Rc<Self>, all: Vec<String>) -> Dom {
        html!("div", {
            .class("chips")
            .children(all.into_iter().map(|lang| html!("button", {
                .class("chip")
                .class_signal("active", sources.settings.signal_ref(clone!(lang => move |settings| settings.languages.contains(&lang))))
                .text(&lang.to_uppercase())
                .event(clone!(sources => move |_: events::Click| {
                    sources.update_settings(|settings| settings.toggle_language(&lang));
                }))
            })))
        })
    }

    fn render_source(sources: Rc<Self>, source: &Source, show_language: bool, show_repo: bool) -> Dom {
        let popular = Route::SourceBrowse {
            source_id: source.id.clone(),
            content_type: SourceContentType::Popular,
            query: None,
        };
        let latest = Route::SourceBrowse {
            source_id: source.id.clone(),
            content_type: SourceContentType::Latest,
            query: None,
        };
        let id = source.id.clone();

        html!("li", {
            .class("list-item")
            .children(&mut [
                link!(popular.url(), {
                    .class("source-item")
                    .event(clone!(sources, id => move |_: events::Click| sources.set_last_used(&id)))
                    .children(&mut [
                        html!("img", {
                            .attr("src", &source.icon_url)
                            .attr("loading", "lazy")
                        }),
                        html!("div", {
                            .class("source-name")
                            .children(&mut [
                                html!("span", {
                                    .text(&source.display_name)
                                }),
                            ])
                            .apply_if(show_language, |dom| dom.child(html!("span", {
                                .class("source-lang")
                                .text(&source.lang.to_uppercase())
                            })))
                            .apply_if(show_repo, |dom| dom.child(html!("span", {
                                .class("source-repo")
                                .text(source.repo().unwrap_or_default())
                            })))
                            .apply_if(source.is_nsfw, |dom| dom.child(html!("span", {
                                .class("nsfw-badge")
                                .text("18+")
                            })))
                        }),
                    ])
                }),
            ])
            .apply_if(source.supports_latest, |dom| dom.child(link!(latest.url(), {
                .class("source-action")
                .event(clone!(sources, id => move |_: events::Click| sources.set_last_used(&id)))
                .text("Latest")
            })))
        })
    }

    fn render_group(sources: Rc<Self>, group: &SourceGroup, show_repo: bool) -> Dom {
        let show_language = group.key.shows_language();
        html!("div", {
            .class("source-group")
            .children(&mut [
                html!("span", {
                    .class("group-label")
                    .text(&group.key.label())
                }),
                html!("ul", {
                    .class("list")
                    .children(group.sources.iter().map(|source| {
                        Self::render_source(sources.clone(), source, show_language, show_repo)
                    }))
                })
            ])
        })
    }

    fn render_view(sources: Rc<Self>, view: SourceListView) -> Dom {
        if view.is_empty() {
            return empty_view::render("No sources found", Some("Install extensions or ask for access"));
        }

        html!("div", {
            .children(view.groups.iter().map(|group| {
                Self::render_group(sources.clone(), group, view.show_source_repo)
            }))
        })
    }

    fn render_main(sources: Rc<Self>) -> Dom {
        let view = map_ref! {
            let all = sources.sources.signal_cloned(),
            let allow_list = sources.allow_list.signal_cloned(),
            let session = auth().session_signal(),
            let settings = sources.settings.signal_cloned(),
            let last_used = sources.last_used.signal_cloned() => {
                all.as_ref().map(|all| {
                    let subject = session.as_ref().map(|s| s.subject()).unwrap_or_else(|| auth().subject());
                    (
                        languages(all),
                        visible_sources(&subject, allow_list, all, &settings.filter(), last_used.as_deref()),
                    )
                })
            }
        };

        html!("div", {
            .class("content")
            .child_signal(sources.error.signal_cloned().map(clone!(sources => move |error| {
                error.map(|message| empty_view::render_with_retry(&message, clone!(sources => move || {
                    Self::fetch_sources(sources.clone());
                })))
            })))
            .child_signal(view.map(clone!(sources => move |view| {
                view.map(|(all_languages, view)| html!("div", {
                    .children(&mut [
                        Self::render_languages(sources.clone(), all_languages),
                        Self::render_view(sources.clone(), view),
                    ])
                }))
            })))
        })
    }

    pub fn render(sources: Rc<Self>) -> Dom {
        Self::fetch_sources(sources.clone());
        Self::fetch_allow_list(sources.clone());

        html!("div", {
            .class("main")
            .children(&mut [
                Self::render_topbar(sources.clone()),
                html!("div", {
                    .class("topbar-spacing")
                }),
                Self::render_main(sources.clone()),
                Spinner::render(sources.spinner.clone()),
            ])
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_toggle_language() {
        let mut settings = SourceListSettings::default();
        settings.toggle_language("en");
        settings.toggle_language("id");
        assert_eq!(settings.languages, vec!["en".to_string(), "id".to_string()]);
        settings.toggle_language("en");
        assert_eq!(settings.languages, vec!["id".to_string()]);
        assert!(settings.filter().keep_local_source);
    }
}
