use std::rc::Rc;

use dominator::{clone, html, with_node, Dom, EventOptions};
use futures_signals::map_ref;
use futures_signals::signal::{Mutable, Signal, SignalExt};
use futures_signals::signal_vec::SignalVecExt;
use serde::{Deserialize, Serialize};
use web_sys::{HtmlInputElement, HtmlSelectElement};
use yomu_lib::browse::{
    current_value, empty_message_extra, filter_changes, merge_pages, set_filter_value, FetchedPage,
    FilterDef, FilterValue, MergedPages, PositionedFilter, SavedSearches, SearchSession, SearchUpdate,
    SortState, SourceContentType, TriState,
};
use yomu_lib::models::MangaSummary;

use crate::common::{
    empty_view, events, icons, snackbar, AppbarSearchField, MangaCard, Modal, Route, Spinner,
};
use crate::query::{self, SourceBrowse as SourceInfo};
use crate::utils::{
    go_back, load_settings, replace_state_with_url, save_settings, scroll_to_top, window,
    AsyncLoader,
};

const KEY: &str = "settings:browse";

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
struct BrowseSettings {
    hide_library_entries: bool,
}

/// Marks the page being fetched, the caller loads page `len + 1`
fn start_page(pages: &mut Vec<FetchedPage>) -> i64 {
    pages.push(FetchedPage {
        mangas: None,
        has_next_page: false,
        is_loading: true,
    });
    pages.len() as i64
}

/// `None` marks a failed fetch, no page after it is offered
fn finish_page(pages: &mut [FetchedPage], result: Option<(Vec<MangaSummary>, bool)>) {
    if let Some(page) = pages.last_mut() {
        page.is_loading = false;
        match result {
            Some((mangas, has_next_page)) => {
                page.mangas = Some(mangas);
                page.has_next_page = has_next_page;
            }
            None => page.mangas = None,
        }
    }
}

fn is_loading(pages: &[FetchedPage]) -> bool {
    pages.last().map(|page| page.is_loading).unwrap_or(false)
}

pub struct SourceBrowse {
    source_id: String,
    source: Mutable<Option<Rc<SourceInfo>>>,
    session: Mutable<SearchSession>,
    pages: Mutable<Vec<FetchedPage>>,
    error: Mutable<Option<String>>,
    settings: Mutable<BrowseSettings>,
    draft_filters: Mutable<Vec<PositionedFilter>>,
    saved_searches: Mutable<SavedSearches>,
    saved_search_name: Mutable<String>,
    filter_modal: Rc<Modal>,
    loader: AsyncLoader,
    meta_loader: AsyncLoader,
    spinner: Rc<Spinner>,
}

impl SourceBrowse {
    pub fn new(source_id: String, content_type: SourceContentType, query: Option<String>) -> Rc<Self> {
        Rc::new(Self {
            source_id,
            source: Mutable::new(None),
            session: Mutable::new(SearchSession::new(content_type, query)),
            pages: Mutable::new(vec![]),
            error: Mutable::new(None),
            settings: Mutable::new(load_settings(KEY)),
            draft_filters: Mutable::new(vec![]),
            saved_searches: Mutable::new(SavedSearches::default()),
            saved_search_name: Mutable::new("".to_string()),
            filter_modal: Modal::new(),
            loader: AsyncLoader::new(),
            meta_loader: AsyncLoader::new(),
            spinner: Spinner::new(),
        })
    }

    fn route(&self) -> Route {
        let session = self.session.lock_ref();
        Route::SourceBrowse {
            source_id: self.source_id.clone(),
            content_type: session.content_type(),
            query: session.query().map(|query| query.to_string()),
        }
    }

    fn fetch_source(browse: Rc<Self>) {
        browse.meta_loader.load(clone!(browse => async move {
            match query::fetch_source_browse(browse.source_id.clone()).await {
                Ok(source) => {
                    browse.saved_searches.set(source.saved_searches.clone());
                    browse.source.set(Some(Rc::new(source)));
                }
                Err(e) => {
                    snackbar::show(format!("error fetch source: {}", e));
                }
            }
        }));
    }

    /// Starting a load aborts the one in flight
    fn fetch_next_page(browse: Rc<Self>) {
        let (generation, content_type, search_query, filters) = {
            let session = browse.session.lock_ref();
            (
                session.generation(),
                session.content_type(),
                session.query().map(|query| query.to_string()),
                filter_changes(session.filters()),
            )
        };
        let page = start_page(&mut browse.pages.lock_mut());
        browse.error.set_neq(None);
        browse.spinner.set_active(true);

        debug!("fetch {:?} page {} of source {}", content_type, page, browse.source_id);
        browse.loader.load(clone!(browse => async move {
            let result = query::fetch_source_mangas(browse.source_id.clone(), content_type, page, search_query, filters).await;
            if !browse.session.lock_ref().is_current(generation) {
                debug!("dropping stale page {} of generation {}", page, generation);
                return;
            }

            match result {
                Ok(result) => finish_page(&mut browse.pages.lock_mut(), Some(result)),
                Err(e) => {
                    error!("error fetch source mangas: {}", e);
                    finish_page(&mut browse.pages.lock_mut(), None);
                    if page == 1 {
                        browse.error.set(Some(format!("{}", e)));
                    } else {
                        snackbar::show(format!("error fetch page {}: {}", page, e));
                    }
                }
            }
            browse.spinner.set_active(false);
        }));
    }

    fn apply(browse: Rc<Self>, update: SearchUpdate) {
        match update {
            SearchUpdate::Unchanged => {}
            SearchUpdate::Reset { generation } => {
                info!("search reset, generation {}", generation);
                browse.loader.cancel();
                scroll_to_top();
                browse.pages.set(vec![]);
                replace_state_with_url(&browse.route().url());
                Self::fetch_next_page(browse);
            }
        }
    }

    fn set_content_type(browse: Rc<Self>, content_type: SourceContentType) {
        let update = browse.session.lock_mut().set_content_type(content_type);
        Self::apply(browse, update);
    }

    fn apply_filters(browse: Rc<Self>) {
        let filters = browse.draft_filters.get_cloned();
        let update = {
            let mut session = browse.session.lock_mut();
            session.set_content_type(SourceContentType::Search);
            session.set_filters(filters)
        };
        browse.filter_modal.hide();
        Self::apply(browse, update);
    }

    fn set_draft_value(&self, defs: &[FilterDef], position: i32, group: Option<i32>, value: FilterValue) {
        set_filter_value(&mut self.draft_filters.lock_mut(), defs, position, group, value);
    }

    fn save_searches(browse: Rc<Self>) {
        let meta = match browse.saved_searches.lock_ref().to_meta() {
            Ok(meta) => meta,
            Err(e) => {
                snackbar::show(format!("error saving searches: {}", e));
                return;
            }
        };
        browse.meta_loader.load(clone!(browse => async move {
            if let Err(e) = query::set_source_meta(browse.source_id.clone(), SavedSearches::META_KEY, meta).await {
                snackbar::show(format!("error saving searches: {}", e));
            }
        }));
    }

    fn create_saved_search(browse: Rc<Self>) {
        let name = browse.saved_search_name.get_cloned();
        if name.trim().is_empty() {
            return;
        }
        let query = browse.session.lock_ref().query().map(|query| query.to_string());
        let filters = browse.draft_filters.get_cloned();
        browse.saved_searches.lock_mut().create(name.trim(), query, filters);
        browse.saved_search_name.set("".to_string());
        Self::save_searches(browse);
    }

    fn delete_saved_search(browse: Rc<Self>, name: &str) {
        if browse.saved_searches.lock_mut().delete(name).is_some() {
            Self::save_searches(browse);
        }
    }

    fn select_saved_search(browse: Rc<Self>, name: &str) {
        let Some(saved) = browse.saved_searches.lock_ref().get(name).cloned() else {
            return;
        };
        browse.draft_filters.set(saved.filters.clone());
        let update = browse.session.lock_mut().select_saved_search(&saved);
        browse.filter_modal.hide();
        Self::apply(browse, update);
    }

    fn merged_signal(&self) -> impl Signal<Item = MergedPages> + use<> {
        map_ref! {
            let pages = self.pages.signal_cloned(),
            let settings = self.settings.signal_cloned() =>
            merge_pages(pages, settings.hide_library_entries)
        }
    }

    fn render_topbar(browse: Rc<Self>) -> Dom {
        let search = AppbarSearchField::new(true, browse.session.lock_ref().query(), clone!(browse => move |query| {
            let update = browse.session.lock_mut().update_query(query);
            Self::apply(browse.clone(), update);
        }));

        html!("div", {
            .class("topbar")
            // saved searches and content type changes rewrite the query behind the field
            .future(browse.session.signal_ref(|session| session.query().map(str::to_string)).dedupe_cloned().for_each(clone!(search => move |query| {
                search.reset_to(query.as_deref());
                async {}
            })))
            .children(&mut [
                html!("button", {
                    .event(|_: events::Click| go_back())
                    .children(&mut [
                        icons::chevron_left(),
                    ])
                }),
                html!("span", {
                    .class("title")
                    .text_signal(browse.source.signal_cloned().map(|source| {
                        source.map(|source| source.display_name.clone()).unwrap_or_default()
                    }))
                }),
                AppbarSearchField::render(search.clone()),
                html!("button", {
                    .attr("title", "Hide library entries")
                    .class_signal("active", browse.settings.signal_ref(|settings| settings.hide_library_entries))
                    .event(clone!(browse => move |_: events::Click| {
                        let mut settings = browse.settings.lock_mut();
                        settings.hide_library_entries = !settings.hide_library_entries;
                        save_settings(KEY, &*settings);
                    }))
                    .children(&mut [
                        icons::heart(),
                    ])
                }),
            ])
        })
    }

    fn render_content_types(browse: Rc<Self>) -> Dom {
        let content_type_button = clone!(browse => move |content_type: SourceContentType| {
            html!("button", {
                .class("chip")
                .class_signal("active", browse.session.signal_ref(move |session| session.content_type() == content_type))
                .text(content_type.label())
                .event(clone!(browse => move |_: events::Click| {
                    if content_type == SourceContentType::Search {
                        browse.draft_filters.set(browse.session.lock_ref().filters().to_vec());
                        browse.filter_modal.toggle_show();
                    } else {
                        Self::set_content_type(browse.clone(), content_type);
                    }
                }))
            })
        });

        html!("div", {
            .class("chips")
            .children(&mut [
                content_type_button(SourceContentType::Popular),
            ])
            .child_signal(browse.source.signal_ref(|source| source.as_ref().map(|source| source.supports_latest)).map(clone!(content_type_button => move |supports_latest| {
                supports_latest.unwrap_or(false).then(|| content_type_button(SourceContentType::Latest))
            })))
            .children(&mut [
                content_type_button(SourceContentType::Search),
            ])
        })
    }

    fn render_value_input(browse: Rc<Self>, defs: Rc<Vec<FilterDef>>, def: &FilterDef, position: i32, group: Option<i32>) -> Dom {
        let value_signal = browse.draft_filters.signal_ref(clone!(defs => move |draft| {
            current_value(draft, &defs, position, group)
        }));

        match def {
            FilterDef::Header(name) => html!("span", {
                .class("filter-header")
                .text(name)
            }),
            FilterDef::Separator => html!("hr", {}),
            FilterDef::CheckBox { name, .. } => html!("label", {
                .class("filter-row")
                .children(&mut [
                    html!("input" => HtmlInputElement, {
                        .attr("type", "checkbox")
                        .prop_signal("checked", value_signal.map(|value| matches!(value, Some(FilterValue::CheckBoxState(true)))))
                        .with_node!(input => {
                            .event(clone!(browse, defs => move |_: events::Change| {
                                browse.set_draft_value(&defs, position, group, FilterValue::CheckBoxState(input.checked()));
                            }))
                        })
                    }),
                    html!("span", {
                        .text(name)
                    })
                ])
            }),
            FilterDef::TriState { name, .. } => html!("button", {
                .class("filter-row")
                .class("tri-state")
                .text(name)
                .class_signal("include", browse.draft_filters.signal_ref(clone!(defs => move |draft| {
                    matches!(current_value(draft, &defs, position, group), Some(FilterValue::TriState(TriState::Include)))
                })))
                .class_signal("exclude", value_signal.map(|value| matches!(value, Some(FilterValue::TriState(TriState::Exclude)))))
                .event(clone!(browse, defs => move |_: events::Click| {
                    let state = match current_value(&browse.draft_filters.lock_ref(), &defs, position, group) {
                        Some(FilterValue::TriState(state)) => state,
                        _ => TriState::Ignore,
                    };
                    browse.set_draft_value(&defs, position, group, FilterValue::TriState(state.cycle()));
                }))
            }),
            FilterDef::Text { name, .. } => html!("input" => HtmlInputElement, {
                .class("filter-row")
                .attr("type", "text")
                .attr("placeholder", name)
                .prop_signal("value", value_signal.map(|value| match value {
                    Some(FilterValue::TextState(text)) => text,
                    _ => "".to_string(),
                }))
                .with_node!(input => {
                    .event(clone!(browse, defs => move |_: events::Input| {
                        browse.set_draft_value(&defs, position, group, FilterValue::TextState(input.value()));
                    }))
                })
            }),
            FilterDef::Select { name, values, .. } => html!("label", {
                .class("filter-row")
                .children(&mut [
                    html!("span", {
                        .text(name)
                    }),
                    html!("select" => HtmlSelectElement, {
                        .children(values.iter().map(|value| html!("option", {
                            .text(value)
                        })))
                        .prop_signal("selectedIndex", value_signal.map(|value| match value {
                            Some(FilterValue::SelectState(index)) => index,
                            _ => 0,
                        }))
                        .with_node!(select => {
                            .event(clone!(browse, defs => move |_: events::Change| {
                                browse.set_draft_value(&defs, position, group, FilterValue::SelectState(select.selected_index()));
                            }))
                        })
                    })
                ])
            }),
            FilterDef::Sort { name, values, .. } => {
                let sort_state = |value: Option<FilterValue>| match value {
                    Some(FilterValue::SortState(state)) => state,
                    _ => SortState { index: 0, ascending: false },
                };
                html!("label", {
                    .class("filter-row")
                    .children(&mut [
                        html!("span", {
                            .text(name)
                        }),
                        html!("select" => HtmlSelectElement, {
                            .children(values.iter().map(|value| html!("option", {
                                .text(value)
                            })))
                            .prop_signal("selectedIndex", value_signal.map(move |value| sort_state(value).index))
                            .with_node!(select => {
                                .event(clone!(browse, defs => move |_: events::Change| {
                                    let current = sort_state(current_value(&browse.draft_filters.lock_ref(), &defs, position, group));
                                    browse.set_draft_value(&defs, position, group, FilterValue::SortState(SortState {
                                        index: select.selected_index(),
                                        ascending: current.ascending,
                                    }));
                                }))
                            })
                        }),
                        html!("button", {
                            .text_signal(browse.draft_filters.signal_ref(clone!(defs => move |draft| {
                                if sort_state(current_value(draft, &defs, position, group)).ascending { "Ascending" } else { "Descending" }
                            })))
                            .event_with_options(&EventOptions::preventable(), clone!(browse, defs => move |e: events::Click| {
                                e.prevent_default();
                                let current = sort_state(current_value(&browse.draft_filters.lock_ref(), &defs, position, group));
                                browse.set_draft_value(&defs, position, group, FilterValue::SortState(SortState {
                                    index: current.index,
                                    ascending: !current.ascending,
                                }));
                            }))
                        })
                    ])
                })
            }
            FilterDef::Group { name, filters } => html!("details", {
                .class("filter-group")
                .children(&mut [
                    html!("summary", {
                        .text(name)
                    })
                ])
                .children(filters.iter().enumerate().map(|(index, filter)| {
                    Self::render_value_input(browse.clone(), defs.clone(), filter, index as i32, Some(position))
                }))
            }),
        }
    }

    fn render_saved_searches(browse: Rc<Self>) -> Dom {
        html!("div", {
            .class("saved-searches")
            .children_signal_vec(browse.saved_searches.signal_ref(|saved| saved.names()).to_signal_vec().map(clone!(browse => move |name| {
                html!("div", {
                    .class("chip")
                    .children(&mut [
                        html!("span", {
                            .text(&name)
                            .event(clone!(browse, name => move |_: events::Click| Self::select_saved_search(browse.clone(), &name)))
                        }),
                        html!("button", {
                            .event(clone!(browse, name => move |_: events::Click| Self::delete_saved_search(browse.clone(), &name)))
                            .children(&mut [
                                icons::x_mark(),
                            ])
                        })
                    ])
                })
            })))
            .children(&mut [
                html!("div", {
                    .class("reader-settings-row")
                    .children(&mut [
                        html!("input" => HtmlInputElement, {
                            .attr("type", "text")
                            .attr("placeholder", "Save current search as")
                            .prop_signal("value", browse.saved_search_name.signal_cloned())
                            .with_node!(input => {
                                .event(clone!(browse => move |_: events::Input| browse.saved_search_name.set(input.value())))
                            })
                        }),
                        html!("button", {
                            .text("Save")
                            .event(clone!(browse => move |_: events::Click| Self::create_saved_search(browse.clone())))
                        })
                    ])
                })
            ])
        })
    }

    fn render_filter_modal(browse: Rc<Self>) -> Dom {
        Modal::render(browse.filter_modal.clone(), "Filters", html!("div", {
            .class("filter-list")
            .child_signal(browse.source.signal_cloned().map(clone!(browse => move |source| {
                source.map(|source| {
                    let defs = Rc::new(source.filters.clone());
                    html!("div", {
                        .children(defs.iter().enumerate().map(|(position, def)| {
                            Self::render_value_input(browse.clone(), defs.clone(), def, position as i32, None)
                        }))
                    })
                })
            })))
            .children(&mut [
                Self::render_saved_searches(browse.clone()),
                html!("div", {
                    .class("reader-settings-row")
                    .children(&mut [
                        html!("button", {
                            .text("Reset")
                            .event(clone!(browse => move |_: events::Click| browse.draft_filters.set(vec![])))
                        }),
                        html!("button", {
                            .text("Filter")
                            .event(clone!(browse => move |_: events::Click| Self::apply_filters(browse.clone())))
                        })
                    ])
                })
            ])
        }))
    }

    fn render_main(browse: Rc<Self>) -> Dom {
        let source_id = browse.source_id.clone();
        let state = map_ref! {
            let merged = browse.merged_signal(),
            let loading = browse.pages.signal_ref(|pages| is_loading(pages)),
            let content_type = browse.session.signal_ref(|session| session.content_type()) =>
            (merged.clone(), *loading, *content_type)
        };

        html!("div", {
            .class("content")
            .future(browse.merged_signal().for_each(clone!(browse => move |merged| {
                // a page of nothing but hidden library entries shows nothing, keep going
                if merged.filtered_out_all_items_of_fetched_page && merged.has_next_page {
                    debug!("fetched page only had library entries, loading the next one");
                    Self::fetch_next_page(browse.clone());
                }
                async {}
            })))
            .child_signal(browse.error.signal_cloned().map(clone!(browse => move |error| {
                error.map(|message| empty_view::render_with_retry(&message, clone!(browse => move || {
                    browse.pages.set(vec![]);
                    Self::fetch_next_page(browse.clone());
                })))
            })))
            .child_signal(state.map(clone!(browse, source_id => move |(merged, loading, content_type)| {
                if merged.mangas.is_empty() {
                    let failed = browse.error.lock_ref().is_some();
                    return (!loading && !failed).then(|| {
                        empty_view::render(content_type.empty_message(), empty_message_extra(&source_id))
                    });
                }

                Some(html!("div", {
                    .children(&mut [
                        html!("div", {
                            .class("manga-grid")
                            .children(merged.mangas.iter().map(|manga| MangaCard::from(manga).render()))
                        }),
                        html!("div", {
                            .class("load-more-btn")
                            .visible(merged.has_next_page && !loading)
                            .children(&mut [
                                html!("button", {
                                    .text("Load More")
                                    .event(clone!(browse => move |_: events::Click| Self::fetch_next_page(browse.clone())))
                                })
                            ])
                        })
                    ])
                }))
            })))
        })
    }

    fn is_near_bottom() -> bool {
        let window = window();
        let scroll_y = window.scroll_y().unwrap_or_default();
        let inner_height = window.inner_height().ok().and_then(|h| h.as_f64()).unwrap_or_default();
        let scroll_height = window
            .document()
            .and_then(|doc| doc.document_element())
            .map(|el| el.scroll_height() as f64)
            .unwrap_or_default();
        scroll_y + inner_height >= scroll_height - 200.0
    }

    pub fn render(browse: Rc<Self>) -> Dom {
        Self::fetch_source(browse.clone());
        Self::fetch_next_page(browse.clone());

        html!("div", {
            .class("main")
            .global_event(clone!(browse => move |_: events::Scroll| {
                let has_next_page = merge_pages(&browse.pages.lock_ref(), browse.settings.lock_ref().hide_library_entries).has_next_page;
                if has_next_page && !is_loading(&browse.pages.lock_ref()) && Self::is_near_bottom() {
                    Self::fetch_next_page(browse.clone());
                }
            }))
            .children(&mut [
                Self::render_topbar(browse.clone()),
                html!("div", {
                    .class("topbar-spacing")
                }),
                Self::render_content_types(browse.clone()),
                Self::render_main(browse.clone()),
                Spinner::render(browse.spinner.clone()),
                Self::render_filter_modal(browse),
            ])
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn manga(id: i64) -> MangaSummary {
        MangaSummary {
            id,
            title: format!("manga {}", id),
            thumbnail_url: None,
            in_library: false,
        }
    }

    #[test]
    fn test_page_lifecycle() {
        let mut pages = vec![];
        assert_eq!(start_page(&mut pages), 1);
        assert!(is_loading(&pages));

        finish_page(&mut pages, Some((vec![manga(1), manga(2)], true)));
        assert!(!is_loading(&pages));
        assert_eq!(start_page(&mut pages), 2);

        finish_page(&mut pages, None);
        let merged = merge_pages(&pages, false);
        assert_eq!(merged.mangas.len(), 2);
        assert!(!merged.has_next_page);
    }
}
