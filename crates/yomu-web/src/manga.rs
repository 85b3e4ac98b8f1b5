use std::error::Error;
use std::future::Future;
use std::rc::Rc;

use dominator::{clone, html, link, routing, with_node, Dom, EventOptions};
use futures_signals::map_ref;
use futures_signals::signal::{Mutable, SignalExt};
use wasm_bindgen::UnwrapThrowExt;
use web_sys::HtmlSelectElement;
use yomu_lib::chapters::{
    self, filter_and_sort, first_unread, non_read, ChapterOptions, ListState, Selection, SortBy,
};
use yomu_lib::models::{self, Chapter};

use crate::common::{empty_view, events, icons, snackbar, tristate, MangaCard, Modal, Route, Spinner};
use crate::query;
use crate::utils::{format_date, go_back, load_settings, local_storage, save_settings, AsyncLoader};

/// Per-manga options win over the global ones
fn load_options(manga_id: i64) -> ChapterOptions {
    let key = chapters::storage_key(manga_id);
    if local_storage().get(&key).unwrap_throw().is_some() {
        load_settings(&key)
    } else {
        load_settings(chapters::KEY)
    }
}

fn chapter_title(chapter: &Chapter, show_chapter_number: bool) -> String {
    if show_chapter_number && chapter.chapter_number >= 0.0 {
        format!("Chapter {}", chapter.chapter_number)
    } else {
        chapter.name.clone()
    }
}

fn resume_label(chapter: &Chapter) -> &'static str {
    if chapter.last_page_read > 0 {
        "Resume"
    } else {
        "Start reading"
    }
}

pub struct Manga {
    manga_id: i64,
    manga: Mutable<Option<models::Manga>>,
    source_name: Mutable<Option<String>>,
    chapters: Mutable<Option<Vec<Chapter>>>,
    error: Mutable<Option<String>>,
    options: Mutable<ChapterOptions>,
    selection: Mutable<Selection>,
    options_modal: Rc<Modal>,
    loader: AsyncLoader,
    chapter_loader: AsyncLoader,
    action_loader: AsyncLoader,
    spinner: Rc<Spinner>,
}

impl Manga {
    pub fn new(manga_id: i64) -> Rc<Self> {
        Rc::new(Self {
            manga_id,
            manga: Mutable::new(None),
            source_name: Mutable::new(None),
            chapters: Mutable::new(None),
            error: Mutable::new(None),
            options: Mutable::new(load_options(manga_id)),
            selection: Mutable::new(Selection::new()),
            options_modal: Modal::new(),
            loader: AsyncLoader::new(),
            chapter_loader: AsyncLoader::new(),
            action_loader: AsyncLoader::new(),
            spinner: Spinner::new(),
        })
    }

    fn fetch_detail(manga: Rc<Self>) {
        manga.spinner.set_active(true);
        manga.error.set_neq(None);
        manga.loader.load(clone!(manga => async move {
            match query::fetch_manga(manga.manga_id).await {
                Ok((result, source_name)) => {
                    manga.manga.set(Some(result));
                    manga.source_name.set(source_name);
                }
                Err(e) => {
                    error!("error fetch manga {}: {}", manga.manga_id, e);
                    manga.error.set(Some(format!("Could not load manga: {}", e)));
                }
            }
            manga.spinner.set_active(false);
        }));
        Self::fetch_chapters(manga);
    }

    fn fetch_chapters(manga: Rc<Self>) {
        manga.chapter_loader.load(clone!(manga => async move {
            match query::fetch_chapters(manga.manga_id).await {
                Ok(result) => {
                    debug!("fetched {} chapters", result.len());
                    manga.chapters.set(Some(result));
                }
                Err(e) => {
                    error!("error fetch chapters: {}", e);
                    snackbar::show(format!("Could not load chapters: {}", e));
                }
            }
        }));
    }

    /// Runs a mutation then reloads whatever it touched
    fn run_action<F>(manga: Rc<Self>, description: &'static str, fut: F)
    where
        F: Future<Output = Result<(), Box<dyn Error>>> + 'static,
    {
        manga.spinner.set_active(true);
        manga.action_loader.load(clone!(manga => async move {
            match fut.await {
                Ok(()) => {
                    manga.selection.lock_mut().clear();
                    Self::fetch_detail(manga.clone());
                }
                Err(e) => {
                    error!("error {}: {}", description, e);
                    snackbar::show(format!("Failed to {}: {}", description, e));
                    manga.spinner.set_active(false);
                }
            }
        }));
    }

    fn toggle_library(manga: Rc<Self>) {
        let Some(in_library) = manga.manga.lock_ref().as_ref().map(|m| m.in_library) else {
            return;
        };
        let id = manga.manga_id;
        Self::run_action(manga, "update library", async move {
            query::update_manga_library(id, !in_library).await
        });
    }

    fn set_read(manga: Rc<Self>, ids: Vec<i64>, is_read: bool) {
        if ids.is_empty() {
            return;
        }
        Self::run_action(manga, "update read state", query::set_chapters_read(ids, is_read));
    }

    fn mark_all_read(manga: Rc<Self>) {
        let ids = manga
            .chapters
            .lock_ref()
            .as_deref()
            .map(non_read)
            .unwrap_or_default();
        Self::set_read(manga, ids, true);
    }

    fn download_all(manga: Rc<Self>) {
        let ids: Vec<i64> = manga
            .chapters
            .lock_ref()
            .iter()
            .flatten()
            .filter(|chapter| !chapter.is_downloaded)
            .map(|chapter| chapter.id)
            .collect();
        if ids.is_empty() {
            return;
        }
        Self::run_action(manga, "queue downloads", query::enqueue_chapter_downloads(ids));
    }

    fn download_selected(manga: Rc<Self>) {
        let ids = manga.selection.lock_ref().ids();
        Self::run_action(manga, "queue downloads", query::enqueue_chapter_downloads(ids));
    }

    fn delete_selected(manga: Rc<Self>) {
        let ids = manga.selection.lock_ref().ids();
        Self::run_action(manga, "delete downloads", query::delete_downloaded_chapters(ids));
    }

    fn update_options<F>(&self, f: F)
    where
        F: FnOnce(&mut ChapterOptions),
    {
        let mut options = self.options.lock_mut();
        f(&mut options);
        save_settings(&chapters::storage_key(self.manga_id), &*options);
    }

    fn reset_options(&self) {
        if let Err(e) = local_storage().delete(&chapters::storage_key(self.manga_id)) {
            error!("error reset chapter options: {:?}", e);
        }
        self.options.set(load_settings(chapters::KEY));
    }

    fn visible_ids(&self) -> Vec<i64> {
        self.chapters
            .lock_ref()
            .as_deref()
            .map(|all| {
                filter_and_sort(all, &self.options.lock_ref())
                    .iter()
                    .map(|chapter| chapter.id)
                    .collect()
            })
            .unwrap_or_default()
    }

    fn render_topbar(manga: Rc<Self>) -> Dom {
        html!("div", {
            .class("topbar")
            .children(&mut [
                html!("button", {
                    .event(|_: events::Click| go_back())
                    .children(&mut [
                        icons::chevron_left(),
                    ])
                }),
                html!("span", {
                    .class("title")
                    .text_signal(manga.manga.signal_ref(|m| m.as_ref().map(|m| m.title.clone()).unwrap_or_default()))
                }),
                html!("button", {
                    .attr("title", "Refresh")
                    .event(clone!(manga => move |_: events::Click| Self::fetch_detail(manga.clone())))
                    .children(&mut [
                        icons::refresh(),
                    ])
                }),
                html!("button", {
                    .attr("title", "Chapter options")
                    .class_signal("active", manga.options.signal_ref(|options| options.is_filter_active()))
                    .event(clone!(manga => move |_: events::Click| manga.options_modal.toggle_show()))
                    .children(&mut [
                        icons::filter(),
                    ])
                }),
            ])
        })
    }

    fn render_header(manga: Rc<Self>, detail: &models::Manga) -> Dom {
        let card = MangaCard::from(detail);
        html!("div", {
            .class("manga-detail")
            .children(&mut [
                html!("img", {
                    .class("manga-detail-cover")
                    .attr("src", &card.cover_url())
                }),
                html!("div", {
                    .class("manga-detail-info")
                    .children(&mut [
                        html!("span", {
                            .class("title")
                            .text(&detail.title)
                        }),
                        html!("span", {
                            .class("author")
                            .text(&[detail.author.as_deref(), detail.artist.as_deref()]
                                .into_iter()
                                .flatten()
                                .collect::<Vec<_>>()
                                .join(", "))
                        }),
                        html!("span", {
                            .class("status")
                            .text(detail.status.label())
                        }),
                        html!("span", {
                            .class("source")
                            .text_signal(manga.source_name.signal_cloned().map(|name| name.unwrap_or_default()))
                        }),
                    ])
                }),
            ])
        })
    }

    fn render_actions(manga: Rc<Self>, detail: &models::Manga) -> Dom {
        let in_library = detail.in_library;
        let fully_read = detail.is_fully_read();
        let fully_downloaded = detail.is_fully_downloaded();
        html!("div", {
            .class("manga-actions")
            .children(&mut [
                html!("button", {
                    .class_signal("active", manga.manga.signal_ref(|m| m.as_ref().map(|m| m.in_library).unwrap_or(false)))
                    .event(clone!(manga => move |_: events::Click| Self::toggle_library(manga.clone())))
                    .children(&mut [
                        icons::heart(),
                        html!("span", {
                            .text(if in_library { "In library" } else { "Add to library" })
                        }),
                    ])
                }),
                html!("button", {
                    .prop("disabled", fully_read)
                    .event(clone!(manga => move |_: events::Click| Self::mark_all_read(manga.clone())))
                    .children(&mut [
                        icons::checkmark(),
                        html!("span", {
                            .text("Mark all read")
                        }),
                    ])
                }),
                html!("button", {
                    .prop("disabled", fully_downloaded)
                    .event(clone!(manga => move |_: events::Click| Self::download_all(manga.clone())))
                    .children(&mut [
                        icons::download(),
                        html!("span", {
                            .text("Download all")
                        }),
                    ])
                }),
            ])
            .child_signal(manga.chapters.signal_ref(|chapters| {
                chapters.as_deref().and_then(first_unread).map(|chapter| {
                    let route = Route::Chapter(chapter.id, chapter.last_page_read.max(0) as usize);
                    link!(route.url(), {
                        .class("button")
                        .class("resume")
                        .children(&mut [
                            icons::play(),
                            html!("span", {
                                .text(resume_label(chapter))
                            }),
                        ])
                    })
                })
            }))
        })
    }

    fn render_description(detail: &models::Manga) -> Dom {
        html!("div", {
            .class("manga-description")
            .children(&mut [
                html!("p", {
                    .text(detail.description.as_deref().unwrap_or_default())
                }),
                html!("div", {
                    .class("chips")
                    .children(detail.genre.iter().map(|genre| html!("span", {
                        .class("chip")
                        .text(genre)
                    })))
                }),
            ])
        })
    }

    fn render_selection_bar(manga: Rc<Self>) -> Dom {
        html!("div", {
            .class("selection-bar")
            .visible_signal(manga.selection.signal_ref(|selection| !selection.is_empty()))
            .children(&mut [
                html!("button", {
                    .attr("title", "Clear selection")
                    .event(clone!(manga => move |_: events::Click| manga.selection.lock_mut().clear()))
                    .children(&mut [
                        icons::x_mark(),
                    ])
                }),
                html!("span", {
                    .text_signal(manga.selection.signal_ref(|selection| format!("{} selected", selection.len())))
                }),
                html!("button", {
                    .attr("title", "Select all")
                    .event(clone!(manga => move |_: events::Click| {
                        let ids = manga.visible_ids();
                        let mut selection = manga.selection.lock_mut();
                        let all = selection.are_all_selected(&ids);
                        selection.select_all(!all, &ids);
                    }))
                    .children(&mut [
                        icons::select_all(),
                    ])
                }),
                html!("button", {
                    .attr("title", "Mark as read")
                    .event(clone!(manga => move |_: events::Click| {
                        let ids = manga.selection.lock_ref().ids();
                        Self::set_read(manga.clone(), ids, true);
                    }))
                    .children(&mut [
                        icons::checkmark(),
                    ])
                }),
                html!("button", {
                    .attr("title", "Mark as unread")
                    .text("Unread")
                    .event(clone!(manga => move |_: events::Click| {
                        let ids = manga.selection.lock_ref().ids();
                        Self::set_read(manga.clone(), ids, false);
                    }))
                }),
                html!("button", {
                    .attr("title", "Download")
                    .event(clone!(manga => move |_: events::Click| Self::download_selected(manga.clone())))
                    .children(&mut [
                        icons::download(),
                    ])
                }),
                html!("button", {
                    .attr("title", "Delete downloads")
                    .event(clone!(manga => move |_: events::Click| Self::delete_selected(manga.clone())))
                    .children(&mut [
                        icons::trash(),
                    ])
                }),
            ])
        })
    }

    fn render_chapter(manga: Rc<Self>, chapter: &Chapter, show_chapter_number: bool, order: Rc<Vec<i64>>) -> Dom {
        let id = chapter.id;
        let url = Route::Chapter(id, if chapter.is_read { 0 } else { chapter.last_page_read.max(0) as usize }).url();
        let mut details = vec![format_date(chapter.upload_date)];
        if let Some(scanlator) = chapter.scanlator.as_ref().filter(|s| !s.is_empty()) {
            details.push(scanlator.clone());
        }
        if !chapter.is_read && chapter.last_page_read > 0 {
            details.push(format!("Page {}", chapter.last_page_read + 1));
        }

        html!("li", {
            .class("list-item")
            .class("chapter-item")
            .apply_if(chapter.is_read, |dom| dom.class("read"))
            .class_signal("selected", manga.selection.signal_ref(move |selection| selection.is_selected(id)))
            .children(&mut [
                html!("button", {
                    .class("chapter-select")
                    .event(clone!(manga, order => move |e: events::Click| {
                        let mut selection = manga.selection.lock_mut();
                        let selected = !selection.is_selected(id);
                        selection.toggle(id, selected, e.shift_key(), &order);
                    }))
                    .child_signal(manga.selection.signal_ref(move |selection| {
                        selection.is_selected(id).then(icons::checkmark)
                    }))
                }),
                html!("a", {
                    .class("chapter-link")
                    .attr("href", &url)
                    // while selecting, a click extends the selection instead of opening the reader
                    .event_with_options(&EventOptions::preventable(), clone!(manga, order => move |e: events::Click| {
                        e.prevent_default();
                        let mut selection = manga.selection.lock_mut();
                        if selection.is_empty() {
                            routing::go_to_url(&url);
                        } else {
                            let selected = !selection.is_selected(id);
                            selection.toggle(id, selected, e.shift_key(), &order);
                        }
                    }))
                    .children(&mut [
                        html!("span", {
                            .class("chapter-title")
                            .text(&chapter_title(chapter, show_chapter_number))
                        }),
                        html!("span", {
                            .class("chapter-details")
                            .text(&details.join(" • "))
                        }),
                    ])
                }),
            ])
            .apply_if(chapter.is_bookmarked, |dom| dom.child(html!("span", {
                .class("bookmark-badge")
                .text("Bookmarked")
            })))
            .apply_if(chapter.is_downloaded, |dom| dom.child(html!("span", {
                .class("downloaded-badge")
                .children(&mut [
                    icons::download(),
                ])
            })))
        })
    }

    fn render_chapters(manga: Rc<Self>) -> Dom {
        let visible = map_ref! {
            let chapters = manga.chapters.signal_cloned(),
            let options = manga.options.signal_cloned() => {
                chapters.as_ref().map(|all| (all.len(), filter_and_sort(all, options), options.show_chapter_number))
            }
        };

        html!("div", {
            .class("chapter-list")
            .children(&mut [
                html!("div", {
                    .class("chapter-list-header")
                    .children(&mut [
                        html!("span", {
                            .class("header")
                            .text_signal(manga.chapters.signal_ref(|chapters| match chapters {
                                Some(chapters) => format!("{} chapters", chapters.len()),
                                None => "Chapters".to_string(),
                            }))
                        }),
                    ])
                }),
                Self::render_selection_bar(manga.clone()),
            ])
            .child_signal(visible.map(clone!(manga => move |visible| {
                visible.map(|(total, visible, show_chapter_number)| {
                    match ListState::of(total, visible.len()).message() {
                        Some(message) => empty_view::render(message, None),
                        None => {
                            let order = Rc::new(visible.iter().map(|chapter| chapter.id).collect::<Vec<_>>());
                            html!("ul", {
                                .class("list")
                                .children(visible.iter().map(|chapter| {
                                    Self::render_chapter(manga.clone(), chapter, show_chapter_number, order.clone())
                                }))
                            })
                        }
                    }
                })
            })))
        })
    }

    fn render_options(manga: Rc<Self>) -> Dom {
        let filter = |label: &str, get: fn(&ChapterOptions) -> Option<bool>, set: fn(&mut ChapterOptions, Option<bool>)| {
            tristate::render(label, manga.options.signal_ref(get), clone!(manga => move || {
                manga.update_options(|options| set(options, tristate::cycle(get(options))));
            }))
        };

        html!("div", {
            .class("chapter-options")
            .children(&mut [
                html!("span", {
                    .class("header")
                    .text("Filter")
                }),
                html!("div", {
                    .class("chips")
                    .children(&mut [
                        filter("Unread", |o| o.unread, |o, v| o.unread = v),
                        filter("Downloaded", |o| o.downloaded, |o, v| o.downloaded = v),
                        filter("Bookmarked", |o| o.bookmarked, |o, v| o.bookmarked = v),
                    ])
                }),
                html!("span", {
                    .class("header")
                    .text("Sort")
                }),
                html!("select" => HtmlSelectElement, {
                    .children(SortBy::ALL.into_iter().map(|sort_by| html!("option", {
                        .attr("value", &format!("{:?}", sort_by))
                        .prop_signal("selected", manga.options.signal_ref(move |options| options.sort_by == sort_by))
                        .text(sort_by.label())
                    })))
                    .with_node!(select => {
                        .event(clone!(manga => move |_: events::Change| {
                            let index = select.selected_index();
                            if let Some(sort_by) = usize::try_from(index).ok().and_then(|i| SortBy::ALL.get(i).copied()) {
                                manga.update_options(|options| options.sort_by = sort_by);
                            }
                        }))
                    })
                }),
                html!("button", {
                    .class("chip")
                    .class_signal("active", manga.options.signal_ref(|options| options.reverse))
                    .text_signal(manga.options.signal_ref(|options| if options.reverse { "Descending" } else { "Ascending" }))
                    .event(clone!(manga => move |_: events::Click| manga.update_options(|options| options.reverse = !options.reverse)))
                }),
                html!("span", {
                    .class("header")
                    .text("Display")
                }),
                html!("button", {
                    .class("chip")
                    .class_signal("active", manga.options.signal_ref(|options| options.show_chapter_number))
                    .text("Show chapter number")
                    .event(clone!(manga => move |_: events::Click| {
                        manga.update_options(|options| options.show_chapter_number = !options.show_chapter_number)
                    }))
                }),
                html!("button", {
                    .text("Reset")
                    .event(clone!(manga => move |_: events::Click| manga.reset_options()))
                }),
            ])
        })
    }

    fn render_main(manga: Rc<Self>) -> Dom {
        html!("div", {
            .class("content")
            .child_signal(manga.error.signal_cloned().map(clone!(manga => move |error| {
                error.map(|message| empty_view::render_with_retry(&message, clone!(manga => move || {
                    Self::fetch_detail(manga.clone());
                })))
            })))
            .child_signal(manga.manga.signal_cloned().map(clone!(manga => move |detail| {
                detail.map(|detail| html!("div", {
                    .children(&mut [
                        Self::render_header(manga.clone(), &detail),
                        Self::render_actions(manga.clone(), &detail),
                        Self::render_description(&detail),
                    ])
                }))
            })))
            .child(Self::render_chapters(manga.clone()))
        })
    }

    pub fn render(manga: Rc<Self>) -> Dom {
        Self::fetch_detail(manga.clone());

        html!("div", {
            .class("main")
            .global_event(clone!(manga => move |e: events::KeyDown| {
                if e.key() == "Escape" {
                    manga.selection.lock_mut().clear();
                }
            }))
            .children(&mut [
                Self::render_topbar(manga.clone()),
                html!("div", {
                    .class("topbar-spacing")
                }),
                Self::render_main(manga.clone()),
                Modal::render(manga.options_modal.clone(), "Chapters", Self::render_options(manga.clone())),
                Spinner::render(manga.spinner.clone()),
            ])
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn chapter(last_page_read: i64) -> Chapter {
        Chapter {
            id: 1,
            name: "Vol.1 Ch.3".to_string(),
            chapter_number: 3.0,
            last_page_read,
            ..Default::default()
        }
    }

    #[test]
    fn test_chapter_title() {
        let chapter = chapter(0);
        assert_eq!(chapter_title(&chapter, false), "Vol.1 Ch.3");
        assert_eq!(chapter_title(&chapter, true), "Chapter 3");
    }

    #[test]
    fn test_resume_label() {
        assert_eq!(resume_label(&chapter(0)), "Start reading");
        assert_eq!(resume_label(&chapter(4)), "Resume");
    }
}
