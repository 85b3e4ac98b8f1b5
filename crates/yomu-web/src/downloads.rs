use std::cell::Cell;
use std::error::Error;
use std::rc::Rc;

use async_trait::async_trait;

use dominator::{clone, html, link, Dom};
use futures_signals::signal::{Mutable, SignalExt};
use gloo_timers::callback::Interval;
use wasm_bindgen_futures::spawn_local;
use yomu_lib::downloads::{retry_allowed, DeletePlan, DownloadQueue, DownloaderAction, DownloaderActions, NO_DOWNLOADS_MESSAGE};
use yomu_lib::models::{DownloadQueueItem, DownloadState};

use crate::common::{empty_view, events, icons, snackbar, Route, Spinner};
use crate::query;
use crate::utils::AsyncLoader;

const POLL_INTERVAL_MS: u32 = 1_000;

/// Downloader mutations backed by the server
struct ServerDownloader;

#[async_trait(?Send)]
impl DownloaderActions for ServerDownloader {
    type Error = Box<dyn Error>;

    async fn stop(&self) -> Result<(), Self::Error> {
        query::stop_downloader().await
    }

    async fn start(&self) -> Result<(), Self::Error> {
        query::start_downloader().await
    }

    async fn dequeue(&self, chapter_id: i64) -> Result<(), Self::Error> {
        query::dequeue_chapter_download(chapter_id).await
    }

    async fn delete_downloaded(&self, chapter_id: i64) -> Result<(), Self::Error> {
        query::delete_downloaded_chapters(vec![chapter_id]).await
    }
}

async fn delete(plan: DeletePlan) -> Result<(), Box<dyn Error>> {
    plan.run(&ServerDownloader).await
}

async fn retry(chapter_id: i64) -> Result<(), Box<dyn Error>> {
    query::enqueue_chapter_downloads(vec![chapter_id]).await
}

fn state_label(item: &DownloadQueueItem) -> String {
    match item.state {
        DownloadState::Queued => "Queued".to_string(),
        DownloadState::Downloading => format!("{:.0}%", item.progress * 100.0),
        DownloadState::Finished => "Finished".to_string(),
        DownloadState::Error if item.tries > 0 => format!("Error after {} tries", item.tries),
        DownloadState::Error => "Error".to_string(),
    }
}

pub struct Downloads {
    queue: Mutable<Option<DownloadQueue>>,
    error: Mutable<Option<String>>,
    interval: Mutable<Option<Interval>>,
    loader: AsyncLoader,
    pending_actions: Cell<usize>,
    spinner: Rc<Spinner>,
}

impl Downloads {
    pub fn new() -> Rc<Self> {
        Rc::new(Self {
            queue: Mutable::new(None),
            error: Mutable::new(None),
            interval: Mutable::new(None),
            loader: AsyncLoader::new(),
            pending_actions: Cell::new(0),
            spinner: Spinner::new(),
        })
    }

    fn fetch_queue(downloads: Rc<Self>) {
        downloads.loader.load(clone!(downloads => async move {
            match query::fetch_download_status().await {
                Ok(queue) => {
                    downloads.error.set_neq(None);
                    downloads.queue.set_neq(Some(queue));
                }
                Err(e) => {
                    error!("error fetch download status: {}", e);
                    // a failing poll keeps showing the last known queue
                    if downloads.queue.lock_ref().is_none() {
                        downloads.error.set_neq(Some(format!("Could not load downloads: {}", e)));
                    }
                }
            }
        }));
    }

    fn run_action<F>(downloads: Rc<Self>, description: &'static str, fut: F)
    where
        F: std::future::Future<Output = Result<(), Box<dyn Error>>> + 'static,
    {
        // mutations are never cancelled by a later one, each runs to completion
        downloads.pending_actions.set(downloads.pending_actions.get() + 1);
        downloads.spinner.set_active(true);
        spawn_local(clone!(downloads => async move {
            if let Err(e) = fut.await {
                error!("error {}: {}", description, e);
                snackbar::show(format!("Failed to {}: {}", description, e));
            }
            let pending = downloads.pending_actions.get().saturating_sub(1);
            downloads.pending_actions.set(pending);
            downloads.spinner.set_active(pending > 0);
            Self::fetch_queue(downloads.clone());
        }));
    }

    fn toggle_downloader(downloads: Rc<Self>) {
        let Some(action) = downloads.queue.lock_ref().as_ref().map(|queue| queue.toggle_action()) else {
            return;
        };
        match action {
            DownloaderAction::Start => Self::run_action(downloads, "start downloader", query::start_downloader()),
            DownloaderAction::Stop => Self::run_action(downloads, "stop downloader", query::stop_downloader()),
        }
    }

    fn move_item(downloads: Rc<Self>, from: usize, to: usize) {
        let request = {
            let mut queue = downloads.queue.lock_mut();
            let Some(queue) = queue.as_mut() else {
                return;
            };
            let Some(request) = queue.reorder(from, to) else {
                return;
            };
            // reflected right away, the next poll corrects it if the server disagrees
            queue.apply_reorder(&request);
            request
        };

        Self::run_action(
            downloads,
            "reorder download",
            query::reorder_chapter_download(request.chapter_id, request.to),
        );
    }

    fn delete_item(downloads: Rc<Self>, chapter_id: i64) {
        let Some(plan) = downloads.queue.lock_ref().as_ref().map(|queue| queue.delete_plan(chapter_id)) else {
            return;
        };
        Self::run_action(downloads, "delete download", delete(plan));
    }

    fn render_topbar(downloads: Rc<Self>) -> Dom {
        html!("div", {
            .class("topbar")
            .children(&mut [
                html!("span", {
                    .class("title")
                    .text("Downloads")
                }),
                html!("button", {
                    .attr("title", "Clear")
                    .prop_signal("disabled", downloads.queue.signal_ref(|q| q.as_ref().map(|q| q.is_empty()).unwrap_or(true)))
                    .event(clone!(downloads => move |_: events::Click| {
                        Self::run_action(downloads.clone(), "clear downloads", query::clear_downloader());
                    }))
                    .children(&mut [
                        icons::trash(),
                    ])
                }),
                html!("button", {
                    .prop_signal("disabled", downloads.queue.signal_ref(|q| !q.as_ref().map(|q| q.can_toggle()).unwrap_or(false)))
                    .event(clone!(downloads => move |_: events::Click| Self::toggle_downloader(downloads.clone())))
                    .child_signal(downloads.queue.signal_ref(|q| {
                        let action = q.as_ref().map(|q| q.toggle_action()).unwrap_or(DownloaderAction::Start);
                        Some(match action {
                            DownloaderAction::Start => icons::play(),
                            DownloaderAction::Stop => icons::pause(),
                        })
                    }))
                    .child(html!("span", {
                        .text_signal(downloads.queue.signal_ref(|q| {
                            q.as_ref().map(|q| q.toggle_action()).unwrap_or(DownloaderAction::Start).label()
                        }))
                    }))
                }),
            ])
        })
    }

    fn render_item(downloads: Rc<Self>, item: &DownloadQueueItem, index: usize, len: usize) -> Dom {
        let chapter_id = item.chapter_id;
        html!("li", {
            .class("list-item")
            .class("download-item")
            .apply_if(item.state == DownloadState::Error, |dom| dom.class("error"))
            .children(&mut [
                link!(Route::Manga(item.manga_id).url(), {
                    .class("download-info")
                    .children(&mut [
                        html!("span", {
                            .class("title")
                            .text(&item.manga_title)
                        }),
                        html!("span", {
                            .class("subtitle")
                            .text(&item.chapter_name)
                        }),
                        html!("span", {
                            .class("state")
                            .text(&state_label(item))
                        }),
                    ])
                }),
                html!("progress", {
                    .attr("max", "1")
                    .attr("value", &item.progress.to_string())
                }),
                html!("button", {
                    .attr("title", "Move up")
                    .prop("disabled", index == 0)
                    .event(clone!(downloads => move |_: events::Click| {
                        Self::move_item(downloads.clone(), index, index.saturating_sub(1));
                    }))
                    .children(&mut [
                        icons::arrow_up(),
                    ])
                }),
                html!("button", {
                    .attr("title", "Move down")
                    .prop("disabled", index + 1 >= len)
                    .event(clone!(downloads => move |_: events::Click| {
                        Self::move_item(downloads.clone(), index, index + 1);
                    }))
                    .children(&mut [
                        icons::arrow_down(),
                    ])
                }),
            ])
            .apply_if(retry_allowed(item), |dom| dom.child(html!("button", {
                .attr("title", "Retry")
                .event(clone!(downloads => move |_: events::Click| {
                    Self::run_action(downloads.clone(), "retry download", retry(chapter_id));
                }))
                .children(&mut [
                    icons::refresh(),
                ])
            })))
            .child(html!("button", {
                .attr("title", "Delete")
                .event(clone!(downloads => move |_: events::Click| Self::delete_item(downloads.clone(), chapter_id)))
                .children(&mut [
                    icons::trash(),
                ])
            }))
        })
    }

    fn render_main(downloads: Rc<Self>) -> Dom {
        html!("div", {
            .class("content")
            .child_signal(downloads.error.signal_cloned().map(clone!(downloads => move |error| {
                error.map(|message| empty_view::render_with_retry(&message, clone!(downloads => move || {
                    Self::fetch_queue(downloads.clone());
                })))
            })))
            .child_signal(downloads.queue.signal_cloned().map(clone!(downloads => move |queue| {
                queue.map(|queue| {
                    if queue.is_empty() {
                        return empty_view::render(NO_DOWNLOADS_MESSAGE, None);
                    }
                    let len = queue.items.len();
                    html!("ul", {
                        .class("list")
                        .children(queue.items.iter().enumerate().map(|(index, item)| {
                            Self::render_item(downloads.clone(), item, index, len)
                        }))
                    })
                })
            })))
        })
    }

    pub fn render(downloads: Rc<Self>) -> Dom {
        Self::fetch_queue(downloads.clone());

        html!("div", {
            .class("main")
            .after_inserted(clone!(downloads => move |_| {
                downloads.interval.set(Some(Interval::new(POLL_INTERVAL_MS, clone!(downloads => move || {
                    Self::fetch_queue(downloads.clone());
                }))));
            }))
            .after_removed(clone!(downloads => move |_| {
                if let Some(interval) = downloads.interval.replace(None) {
                    interval.cancel();
                }
            }))
            .children(&mut [
                Self::render_topbar(downloads.clone()),
                html!("div", {
                    .class("topbar-spacing")
                }),
                Self::render_main(downloads.clone()),
                Spinner::render(downloads.spinner.clone()),
            ])
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_state_label() {
        let mut item = DownloadQueueItem {
            chapter_id: 1,
            chapter_name: "Chapter 1".to_string(),
            manga_id: 1,
            manga_title: "Manga".to_string(),
            progress: 0.42,
            state: DownloadState::Downloading,
            tries: 0,
        };
        assert_eq!(state_label(&item), "42%");

        item.state = DownloadState::Error;
        assert_eq!(state_label(&item), "Error");
        item.tries = 3;
        assert_eq!(state_label(&item), "Error after 3 tries");
    }
}
