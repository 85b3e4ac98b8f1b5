use std::rc::Rc;

use dominator::{clone, html, with_node, Dom};
use futures_signals::map_ref;
use futures_signals::signal::{Mutable, SignalExt};
use wasm_bindgen_futures::spawn_local;
use web_sys::HtmlSelectElement;
use yomu_lib::chapters::Selection;
use yomu_lib::library::{self, LibraryOptions, LibrarySortBy};
use yomu_lib::models::{Manga, MangaStatus};

use crate::common::{empty_view, events, icons, snackbar, tristate, AppbarSearchField, MangaCard, Modal, Spinner};
use crate::query;
use crate::utils::{load_appearance, load_settings, save_settings, AsyncLoader};

/// Case insensitive title search on top of the library options
fn search(mangas: Vec<Manga>, keyword: Option<&str>) -> Vec<Manga> {
    match keyword.map(str::to_lowercase) {
        Some(keyword) if !keyword.is_empty() => mangas
            .into_iter()
            .filter(|manga| manga.title.to_lowercase().contains(&keyword))
            .collect(),
        _ => mangas,
    }
}

pub struct Library {
    mangas: Mutable<Option<Vec<Manga>>>,
    error: Mutable<Option<String>>,
    options: Mutable<LibraryOptions>,
    keyword: Mutable<Option<String>>,
    selection: Mutable<Selection>,
    search: Rc<AppbarSearchField>,
    options_modal: Rc<Modal>,
    loader: AsyncLoader,
    spinner: Rc<Spinner>,
}

impl Library {
    pub fn new() -> Rc<Self> {
        let keyword = Mutable::new(None);
        Rc::new(Self {
            mangas: Mutable::new(None),
            error: Mutable::new(None),
            options: Mutable::new(load_settings(library::KEY)),
            search: AppbarSearchField::new(true, None, clone!(keyword => move |query| keyword.set(query))),
            keyword,
            selection: Mutable::new(Selection::new()),
            options_modal: Modal::new(),
            loader: AsyncLoader::new(),
            spinner: Spinner::new(),
        })
    }

    fn fetch_library(library: Rc<Self>) {
        library.spinner.set_active(true);
        library.error.set_neq(None);
        library.loader.load(clone!(library => async move {
            match query::fetch_library().await {
                Ok(mangas) => {
                    debug!("library has {} entries", mangas.len());
                    library.selection.lock_mut().clear();
                    library.mangas.set(Some(mangas));
                }
                Err(e) => {
                    error!("error fetch library: {}", e);
                    library.error.set(Some(format!("Could not load library: {}", e)));
                }
            }
            library.spinner.set_active(false);
        }));
    }

    fn visible_ids(&self) -> Vec<i64> {
        let mangas = self.mangas.lock_ref();
        let Some(all) = mangas.as_ref() else {
            return vec![];
        };
        let keyword = self.keyword.lock_ref();
        search(self.options.lock_ref().apply(all), keyword.as_deref())
            .iter()
            .map(|manga| manga.id)
            .collect()
    }

    fn remove_selected(library: Rc<Self>) {
        let ids = library.selection.lock_ref().ids();
        if ids.is_empty() {
            return;
        }
        library.spinner.set_active(true);
        // a refresh must not abort a removal halfway
        spawn_local(clone!(library => async move {
            for id in ids {
                if let Err(e) = query::update_manga_library(id, false).await {
                    error!("error remove manga {} from library: {}", id, e);
                    snackbar::show(format!("Failed to remove from library: {}", e));
                    break;
                }
            }
            Self::fetch_library(library.clone());
        }));
    }

    fn render_selection_bar(library: Rc<Self>) -> Dom {
        html!("div", {
            .class("selection-bar")
            .visible_signal(library.selection.signal_ref(|selection| !selection.is_empty()))
            .children(&mut [
                html!("button", {
                    .attr("title", "Clear selection")
                    .event(clone!(library => move |_: events::Click| library.selection.lock_mut().clear()))
                    .children(&mut [
                        icons::x_mark(),
                    ])
                }),
                html!("span", {
                    .text_signal(library.selection.signal_ref(|selection| format!("{} selected", selection.len())))
                }),
                html!("button", {
                    .attr("title", "Select all")
                    .event(clone!(library => move |_: events::Click| {
                        let ids = library.visible_ids();
                        let mut selection = library.selection.lock_mut();
                        let all = selection.are_all_selected(&ids);
                        selection.select_all(!all, &ids);
                    }))
                    .children(&mut [
                        icons::select_all(),
                    ])
                }),
                html!("button", {
                    .attr("title", "Remove from library")
                    .event(clone!(library => move |_: events::Click| Self::remove_selected(library.clone())))
                    .children(&mut [
                        icons::trash(),
                    ])
                }),
            ])
        })
    }

    fn update_options<F>(&self, f: F)
    where
        F: FnOnce(&mut LibraryOptions),
    {
        let mut options = self.options.lock_mut();
        f(&mut options);
        save_settings(library::KEY, &*options);
    }

    fn render_topbar(library: Rc<Self>) -> Dom {
        html!("div", {
            .class("topbar")
            .children(&mut [
                html!("span", {
                    .class("title")
                    .text("Library")
                }),
                AppbarSearchField::render(library.search.clone()),
                html!("button", {
                    .attr("title", "Refresh")
                    .event(clone!(library => move |_: events::Click| Self::fetch_library(library.clone())))
                    .children(&mut [
                        icons::refresh(),
                    ])
                }),
                html!("button", {
                    .attr("title", "Filter")
                    .class_signal("active", library.options.signal_ref(|options| options.is_filter_active()))
                    .event(clone!(library => move |_: events::Click| library.options_modal.toggle_show()))
                    .children(&mut [
                        icons::filter(),
                    ])
                }),
            ])
        })
    }

    fn render_options(library: Rc<Self>) -> Dom {
        let filter = |label: &str, get: fn(&LibraryOptions) -> Option<bool>, set: fn(&mut LibraryOptions, Option<bool>)| {
            tristate::render(label, library.options.signal_ref(get), clone!(library => move || {
                library.update_options(|options| set(options, tristate::cycle(get(options))));
            }))
        };

        html!("div", {
            .class("library-options")
            .children(&mut [
                html!("span", {
                    .class("header")
                    .text("Filter")
                }),
                html!("div", {
                    .class("chips")
                    .children(&mut [
                        filter("Downloaded", |o| o.has_downloaded_chapters, |o, v| o.has_downloaded_chapters = v),
                        filter("Unread", |o| o.has_unread_chapters, |o, v| o.has_unread_chapters = v),
                        filter("Read", |o| o.has_read_chapters, |o, v| o.has_read_chapters = v),
                        filter("Bookmarked", |o| o.has_bookmarked_chapters, |o, v| o.has_bookmarked_chapters = v),
                        filter("Duplicates", |o| o.has_duplicate_chapters, |o, v| o.has_duplicate_chapters = v),
                    ])
                }),
                html!("span", {
                    .class("header")
                    .text("Status")
                }),
                html!("div", {
                    .class("chips")
                    .children(MangaStatus::ALL.into_iter().map(|status| {
                        tristate::render(
                            status.label(),
                            library.options.signal_ref(move |options| options.has_status.get(&status).copied().flatten()),
                            clone!(library => move || library.update_options(|options| {
                                let next = tristate::cycle(options.has_status.get(&status).copied().flatten());
                                match next {
                                    Some(_) => options.has_status.insert(status, next),
                                    None => options.has_status.remove(&status),
                                };
                            })),
                        )
                    }))
                }),
                html!("span", {
                    .class("header")
                    .text("Sort")
                }),
                html!("select" => HtmlSelectElement, {
                    .children(LibrarySortBy::ALL.into_iter().map(|sort_by| html!("option", {
                        .prop_signal("selected", library.options.signal_ref(move |options| options.sort_by == sort_by))
                        .text(sort_by.label())
                    })))
                    .with_node!(select => {
                        .event(clone!(library => move |_: events::Change| {
                            let index = select.selected_index();
                            if let Some(sort_by) = usize::try_from(index).ok().and_then(|i| LibrarySortBy::ALL.get(i).copied()) {
                                library.update_options(|options| options.sort_by = sort_by);
                            }
                        }))
                    })
                }),
                html!("button", {
                    .class("chip")
                    .class_signal("active", library.options.signal_ref(|options| options.sort_desc))
                    .text_signal(library.options.signal_ref(|options| if options.sort_desc { "Descending" } else { "Ascending" }))
                    .event(clone!(library => move |_: events::Click| library.update_options(|options| options.sort_desc = !options.sort_desc)))
                }),
                html!("button", {
                    .text("Reset")
                    .event(clone!(library => move |_: events::Click| library.update_options(|options| *options = LibraryOptions::default())))
                }),
            ])
        })
    }

    fn render_main(library: Rc<Self>) -> Dom {
        let item_width = load_appearance().item_width;
        let visible = map_ref! {
            let mangas = library.mangas.signal_cloned(),
            let options = library.options.signal_cloned(),
            let keyword = library.keyword.signal_cloned() => {
                mangas.as_ref().map(|all| (all.is_empty(), search(options.apply(all), keyword.as_deref())))
            }
        };

        html!("div", {
            .class("content")
            .child_signal(library.error.signal_cloned().map(clone!(library => move |error| {
                error.map(|message| empty_view::render_with_retry(&message, clone!(library => move || {
                    Self::fetch_library(library.clone());
                })))
            })))
            .child_signal(visible.map(clone!(library => move |visible| {
                visible.map(|(is_empty, mangas)| {
                    if is_empty {
                        empty_view::render("Your library is empty", Some("Add manga from a source"))
                    } else if mangas.is_empty() {
                        empty_view::render("No matching manga", None)
                    } else {
                        html!("div", {
                            .class("manga-grid")
                            .style("grid-template-columns", &format!("repeat(auto-fill, minmax({}px, 1fr))", item_width))
                            .children({
                                let order = Rc::new(mangas.iter().map(|manga| manga.id).collect::<Vec<_>>());
                                mangas.iter().map(|manga| {
                                    MangaCard::from(manga).render_selectable(library.selection.clone(), order.clone())
                                }).collect::<Vec<_>>()
                            })
                        })
                    }
                })
            })))
        })
    }

    pub fn render(library: Rc<Self>) -> Dom {
        Self::fetch_library(library.clone());

        html!("div", {
            .class("main")
            .children(&mut [
                Self::render_topbar(library.clone()),
                html!("div", {
                    .class("topbar-spacing")
                }),
                Self::render_main(library.clone()),
                Self::render_selection_bar(library.clone()),
                Modal::render(library.options_modal.clone(), "Library", Self::render_options(library.clone())),
                Spinner::render(library.spinner.clone()),
            ])
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn manga(id: i64, title: &str) -> Manga {
        Manga {
            id,
            title: title.to_string(),
            author: None,
            artist: None,
            description: None,
            genre: vec![],
            status: MangaStatus::Ongoing,
            thumbnail_url: None,
            in_library: true,
            source_id: "1".to_string(),
            unread_count: 0,
            download_count: 0,
            chapter_count: 0,
        }
    }

    #[test]
    fn test_search() {
        let mangas = vec![manga(1, "One Piece"), manga(2, "Berserk")];
        assert_eq!(search(mangas.clone(), Some("piece")).len(), 1);
        assert_eq!(search(mangas.clone(), Some("")).len(), 2);
        assert_eq!(search(mangas, None).len(), 2);
    }
}
