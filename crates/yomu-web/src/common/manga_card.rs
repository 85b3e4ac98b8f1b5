use std::rc::Rc;

use dominator::{clone, html, link, routing, with_node, Dom, DomBuilder, EventOptions};
use futures_signals::signal::{Mutable, SignalExt};
use web_sys::{HtmlAnchorElement, HtmlImageElement};
use yomu_lib::chapters::Selection;
use yomu_lib::models::{Manga, MangaSummary};

use super::{events, icons, Route};
use crate::utils::server_url;

const PLACEHOLDER: &str = "/placeholder.svg";

/// Applies a click on card `id` to `selection`, returns true when the click
/// should open the manga instead. `select_key` starts a selection.
fn handle_card_click(selection: &mut Selection, id: i64, select_key: bool, range: bool, order: &[i64]) -> bool {
    if selection.is_empty() && !select_key {
        return true;
    }
    let selected = !selection.is_selected(id);
    selection.toggle(id, selected, range, order);
    false
}

/// Cover tile of the library and source grids
#[derive(Debug, Clone)]
pub struct MangaCard {
    pub id: i64,
    pub title: String,
    pub thumbnail_url: Option<String>,
    pub in_library: bool,
    pub unread_count: i64,
    pub download_count: i64,
}

impl From<&MangaSummary> for MangaCard {
    fn from(manga: &MangaSummary) -> Self {
        Self {
            id: manga.id,
            title: manga.title.clone(),
            thumbnail_url: manga.thumbnail_url.clone(),
            in_library: manga.in_library,
            unread_count: 0,
            download_count: 0,
        }
    }
}

impl From<&Manga> for MangaCard {
    fn from(manga: &Manga) -> Self {
        Self {
            id: manga.id,
            title: manga.title.clone(),
            thumbnail_url: manga.thumbnail_url.clone(),
            // library badges are noise on the library screen itself
            in_library: false,
            unread_count: manga.unread_count,
            download_count: manga.download_count,
        }
    }
}

impl MangaCard {
    pub fn cover_url(&self) -> String {
        match self.thumbnail_url.as_deref() {
            // thumbnails are served relative to the server
            Some(url) if url.starts_with('/') => server_url(url),
            Some(url) => url.to_string(),
            None => PLACEHOLDER.to_string(),
        }
    }

    fn badge(class: &str, count: i64) -> Option<Dom> {
        (count > 0).then(|| html!("span", {
            .class(class)
            .text(&count.to_string())
        }))
    }

    fn apply_content<A: AsRef<web_sys::Element> + AsRef<web_sys::Node>>(&self, dom: DomBuilder<A>) -> DomBuilder<A> {
        let failed = Mutable::new(false);
        dom.class("manga-cover")
            .class("animate__animated")
            .class("animate__faster")
            .class("animate__fadeIn")
            .apply_if(self.in_library, |dom| dom.class("in-library"))
            .children(&mut [
                html!("img" => HtmlImageElement, {
                    .attr("src", &self.cover_url())
                    .attr("loading", "lazy")
                    .attr("alt", &self.title)
                    .with_node!(img => {
                        .event(clone!(failed => move |_: events::Error| {
                            // swap once, the placeholder itself may fail
                            if !failed.replace(true) {
                                img.set_src(PLACEHOLDER);
                            }
                        }))
                    })
                }),
                html!("div", {
                    .class("badges")
                    .children(
                        [
                            Self::badge("unread-badge", self.unread_count),
                            Self::badge("download-badge", self.download_count),
                            self.in_library.then(|| html!("span", {
                                .class("library-badge")
                                .text("In library")
                            })),
                        ]
                        .into_iter()
                        .flatten()
                    )
                }),
                html!("div", {
                    .class("title")
                    .children(&mut [
                        html!("span", {
                            .text(&self.title)
                        })
                    ])
                })
            ])
    }

    pub fn render(&self) -> Dom {
        link!(Route::Manga(self.id).url(), {
            .apply(|dom| self.apply_content(dom))
        })
    }

    /// Ctrl click or a long press starts a selection, while one is active
    /// a click toggles the card instead of opening the manga
    pub fn render_selectable(&self, selection: Mutable<Selection>, order: Rc<Vec<i64>>) -> Dom {
        let id = self.id;
        let url = Route::Manga(id).url();
        html!("a" => HtmlAnchorElement, {
            .attr("href", &url)
            .apply(|dom| self.apply_content(dom))
            .class_signal("selected", selection.signal_ref(move |selection| selection.is_selected(id)))
            .child_signal(selection.signal_ref(move |selection| selection.is_selected(id)).dedupe().map(|selected| {
                selected.then(|| html!("div", {
                    .class("selected-mark")
                    .children(&mut [
                        icons::checkmark(),
                    ])
                }))
            }))
            .event_with_options(&EventOptions::preventable(), clone!(selection, order => move |e: events::Click| {
                e.prevent_default();
                let open = handle_card_click(&mut selection.lock_mut(), id, e.ctrl_key(), e.shift_key(), &order);
                if open {
                    routing::go_to_url(&url);
                }
            }))
            .event_with_options(&EventOptions::preventable(), clone!(selection, order => move |e: events::ContextMenu| {
                e.prevent_default();
                handle_card_click(&mut selection.lock_mut(), id, true, false, &order);
            }))
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_card_click_opens_without_selection() {
        let order = vec![1, 2, 3];
        let mut selection = Selection::new();
        assert!(handle_card_click(&mut selection, 2, false, false, &order));
        assert!(selection.is_empty());
    }

    #[test]
    fn test_card_click_toggles_while_selecting() {
        let order = vec![1, 2, 3];
        let mut selection = Selection::new();

        assert!(!handle_card_click(&mut selection, 1, true, false, &order));
        assert!(selection.is_selected(1));
        assert!(!selection.is_selected(2));

        // a plain click now selects, and a second one unselects
        assert!(!handle_card_click(&mut selection, 2, false, false, &order));
        assert!(selection.is_selected(2));
        assert!(!handle_card_click(&mut selection, 2, false, false, &order));
        assert!(!selection.is_selected(2));

        assert!(!handle_card_click(&mut selection, 3, false, true, &order));
        assert_eq!(selection.ids(), vec![1, 2, 3]);

        selection.clear();
        assert!(handle_card_click(&mut selection, 3, false, false, &order));
    }
}
