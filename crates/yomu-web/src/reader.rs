use std::cell::{Cell, RefCell};
use std::error::Error;
use std::rc::Rc;

use dominator::{clone, html, link, Dom};
use futures_signals::map_ref;
use futures_signals::signal::{Mutable, SignalExt};
use futures_signals::signal_vec::{MutableVec, SignalVecExt};
use gloo_timers::callback::Timeout;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::spawn_local;
use web_sys::{HtmlImageElement, IntersectionObserver, IntersectionObserverEntry, IntersectionObserverInit};
use yomu_lib::reader::{
    decide, next_page, prev_page, starting_page, AdvanceLatch, ChapterAdvance, Nav, Observation, PageType,
    ReadingDirection, ReadingMode, Rect, Viewport, OPEN_CHAPTER_INTERSECTION_RATIO,
};
use yomu_lib::reader_settings::{Fit, ReaderSettings};

use crate::common::{events, icons, reader_settings, snackbar, Modal, ReaderSettingsPanel, Route, Spinner};
use crate::query::{self, ChapterNavigation};
use crate::utils::{document, go_back, replace_state_with_url, server_url, window, AsyncLoader};

/// Delay before the read progress is sent, skipped pages never reach the server
const PAGE_READ_DELAY_MS: u32 = 500;

struct LoadedChapter {
    navigation: ChapterNavigation,
    pages: Vec<String>,
}

impl LoadedChapter {
    fn id(&self) -> i64 {
        self.navigation.chapter.id
    }
}

async fn fetch_loaded_chapter(chapter_id: i64) -> Result<LoadedChapter, Box<dyn Error>> {
    let (navigation, pages) = futures::future::try_join(
        query::fetch_chapter_navigation(chapter_id),
        query::fetch_chapter_pages(chapter_id),
    )
    .await?;

    Ok(LoadedChapter { navigation, pages })
}

fn page_element_id(chapter_id: i64, index: usize) -> String {
    format!("page-{}-{}", chapter_id, index)
}

fn viewport() -> Viewport {
    let window = window();
    let inner_width = window.inner_width().ok().and_then(|v| v.as_f64()).unwrap_or_default();
    let inner_height = window.inner_height().ok().and_then(|v| v.as_f64()).unwrap_or_default();
    let (client_width, client_height) = document()
        .document_element()
        .map(|root| (root.client_width() as f64, root.client_height() as f64))
        .unwrap_or((inner_width, inner_height));

    Viewport {
        inner_width,
        inner_height,
        scrollbar_x: (inner_height - client_height).max(0.0),
        scrollbar_y: (inner_width - client_width).max(0.0),
    }
}

fn element_rect(element: &web_sys::Element) -> Rect {
    let rect = element.get_bounding_client_rect();
    Rect {
        top: rect.top(),
        right: rect.right(),
        bottom: rect.bottom(),
        left: rect.left(),
    }
}

/// Last on screen page whose leading edge passed the middle of the viewport,
/// `None` while no page of the chapter is on screen
fn page_in_view(mode: ReadingMode, direction: ReadingDirection, rects: &[Rect], viewport: &Viewport) -> Option<usize> {
    let vertical = mode.is_continuous_vertical();
    let (width, height) = (viewport.width(), viewport.height());
    let on_screen: Vec<(usize, &Rect)> = rects
        .iter()
        .enumerate()
        .filter(|(_, rect)| {
            if vertical {
                rect.bottom > 0.0 && rect.top < height
            } else {
                rect.right > 0.0 && rect.left < width
            }
        })
        .collect();

    on_screen
        .iter()
        .rev()
        .find(|(_, rect)| {
            if vertical {
                rect.top <= height / 2.0
            } else {
                match direction {
                    ReadingDirection::Ltr => rect.left <= width / 2.0,
                    ReadingDirection::Rtl => rect.right >= width / 2.0,
                }
            }
        })
        .or(on_screen.first())
        .map(|(index, _)| *index)
}

/// Pages shown side by side in paged modes, in screen order
fn visible_pages(mode: ReadingMode, direction: ReadingDirection, current_page: usize, pages: &[String]) -> Vec<(usize, String)> {
    let count = if mode == ReadingMode::DoublePage { 2 } else { 1 };
    let mut visible: Vec<(usize, String)> = pages
        .iter()
        .enumerate()
        .skip(current_page)
        .take(count)
        .map(|(index, page)| (index, page.clone()))
        .collect();
    if direction == ReadingDirection::Rtl {
        visible.reverse();
    }
    visible
}

fn fit_class(fit: Fit) -> &'static str {
    match fit {
        Fit::Height => "fit-height",
        Fit::Width => "fit-width",
        Fit::All => "fit-all",
    }
}

/// Intersection observer on a first or last page, disconnected on drop
struct PageObserver {
    observer: IntersectionObserver,
    _callback: Closure<dyn FnMut(js_sys::Array, IntersectionObserver)>,
}

impl Drop for PageObserver {
    fn drop(&mut self) {
        self.observer.disconnect();
    }
}

pub struct Reader {
    chapter_id: Mutable<i64>,
    navigation: Mutable<Option<ChapterNavigation>>,
    chapters: MutableVec<Rc<LoadedChapter>>,
    current_page: Mutable<usize>,
    settings: Mutable<ReaderSettings>,
    settings_panel: Mutable<Option<Rc<ReaderSettingsPanel>>>,
    settings_modal: Rc<Modal>,
    is_bar_visible: Mutable<bool>,
    scroll_target: Cell<Option<(i64, usize)>>,
    loader: AsyncLoader,
    adjacent_loader: AsyncLoader,
    spinner: Rc<Spinner>,
    timeout: Mutable<Option<Timeout>>,
}

impl Reader {
    pub fn new(chapter_id: i64, page: usize) -> Rc<Self> {
        Rc::new(Self {
            chapter_id: Mutable::new(chapter_id),
            navigation: Mutable::new(None),
            chapters: MutableVec::new(),
            current_page: Mutable::new(page),
            settings: Mutable::new(reader_settings::load(None)),
            settings_panel: Mutable::new(None),
            settings_modal: Modal::new(),
            is_bar_visible: Mutable::new(true),
            scroll_target: Cell::new(None),
            loader: AsyncLoader::new(),
            adjacent_loader: AsyncLoader::new(),
            spinner: Spinner::new_with_cancel(go_back),
            timeout: Mutable::new(None),
        })
    }

    fn is_loaded(&self, chapter_id: i64) -> bool {
        self.chapters.lock_ref().iter().any(|chapter| chapter.id() == chapter_id)
    }

    fn active_chapter(&self) -> Option<Rc<LoadedChapter>> {
        let chapter_id = self.chapter_id.get();
        self.chapters.lock_ref().iter().find(|chapter| chapter.id() == chapter_id).cloned()
    }

    fn page_count(&self) -> usize {
        self.active_chapter().map(|chapter| chapter.pages.len()).unwrap_or_default()
    }

    fn update_url(&self) {
        replace_state_with_url(&Route::Chapter(self.chapter_id.get(), self.current_page.get()).url());
    }

    /// Replaces everything loaded with `chapter_id`
    fn open_chapter(reader: Rc<Self>, chapter_id: i64, nav: Nav) {
        let current_page = reader.current_page.get();
        reader.spinner.set_active(true);
        reader.adjacent_loader.cancel();
        reader.loader.load(clone!(reader => async move {
            match fetch_loaded_chapter(chapter_id).await {
                Ok(chapter) => {
                    if reader.settings_panel.lock_ref().is_none() {
                        let panel = ReaderSettingsPanel::new(Some(chapter.navigation.manga_id), true);
                        reader.settings.set_neq(panel.settings.get());
                        reader.settings_panel.set(Some(panel));
                    }

                    let mode = reader.settings.get().reading_mode;
                    let page = starting_page(nav, mode, current_page, chapter.pages.len());
                    info!("open chapter {} on page {} nav: {:?}", chapter_id, page, nav);

                    reader.scroll_target.set(Some((chapter_id, page)));
                    reader.navigation.set(Some(chapter.navigation.clone()));
                    reader.chapters.lock_mut().replace_cloned(vec![Rc::new(chapter)]);
                    reader.chapter_id.set_neq(chapter_id);
                    reader.current_page.set(page);
                    reader.update_url();
                }
                Err(e) => {
                    error!("error fetch chapter {}: {}", chapter_id, e);
                    snackbar::show(format!("Could not load chapter: {}", e));
                }
            }
            reader.spinner.set_active(false);
        }));
    }

    /// Loads the neighbour of a continuous chapter and switches to it
    fn load_adjacent(reader: Rc<Self>, chapter_id: i64, page_type: PageType) {
        if reader.is_loaded(chapter_id) {
            reader.activate(chapter_id);
            return;
        }

        reader.adjacent_loader.load(clone!(reader => async move {
            match fetch_loaded_chapter(chapter_id).await {
                Ok(chapter) => {
                    if !reader.is_loaded(chapter_id) {
                        let mut chapters = reader.chapters.lock_mut();
                        match page_type {
                            PageType::First => chapters.insert_cloned(0, Rc::new(chapter)),
                            PageType::Last => chapters.push_cloned(Rc::new(chapter)),
                        }
                    }
                    reader.activate(chapter_id);
                }
                Err(e) => {
                    error!("error fetch chapter {}: {}", chapter_id, e);
                    snackbar::show(format!("Could not load chapter: {}", e));
                }
            }
        }));
    }

    /// Makes an already loaded chapter the current one without reloading
    fn activate(&self, chapter_id: i64) {
        let Some(chapter) = self
            .chapters
            .lock_ref()
            .iter()
            .find(|chapter| chapter.id() == chapter_id)
            .cloned()
        else {
            return;
        };

        debug!("activate chapter {}", chapter_id);
        self.navigation.set(Some(chapter.navigation.clone()));
        self.chapter_id.set_neq(chapter_id);
        self.current_page.set_neq(0);
        self.track_page();
        self.update_url();
    }

    fn apply_advance(reader: Rc<Self>, advance: ChapterAdvance, page_type: PageType) {
        match advance {
            ChapterAdvance::None => {}
            ChapterAdvance::OpenChapterToOpen { chapter_id, load: true } => {
                Self::load_adjacent(reader, chapter_id, page_type)
            }
            ChapterAdvance::OpenChapterToOpen { chapter_id, load: false } | ChapterAdvance::OpenCurrent { chapter_id } => {
                reader.activate(chapter_id)
            }
        }
    }

    fn observation(&self, chapter: &LoadedChapter, page_type: PageType, entry: &IntersectionObserverEntry) -> Observation {
        let navigation = &chapter.navigation;
        let chapter_to_open_id = match page_type {
            PageType::First => navigation.prev.as_ref().map(|c| c.id),
            PageType::Last => navigation.next.as_ref().map(|c| c.id),
        };
        let settings = self.settings.get();

        Observation {
            page_type,
            chapter_id: chapter.id(),
            chapter_to_open_id,
            is_current_chapter: self.chapter_id.get() == chapter.id(),
            is_chapter_to_open_visible: chapter_to_open_id.map(|id| self.is_loaded(id)).unwrap_or(false),
            reading_mode: settings.reading_mode,
            reading_direction: settings.reading_direction,
            rect: element_rect(&entry.target()),
            viewport: viewport(),
            intersection_ratio: entry.intersection_ratio(),
        }
    }

    fn observe(
        reader: Rc<Self>,
        chapter: Rc<LoadedChapter>,
        page_type: PageType,
        element: &HtmlImageElement,
    ) -> Result<PageObserver, JsValue> {
        let mut latch = AdvanceLatch::new();
        let callback = Closure::wrap(Box::new(move |entries: js_sys::Array, _: IntersectionObserver| {
            let Some(entry) = entries
                .iter()
                .last()
                .and_then(|entry| entry.dyn_into::<IntersectionObserverEntry>().ok())
            else {
                return;
            };

            let observation = reader.observation(&chapter, page_type, &entry);
            let advance = latch.apply(decide(&observation));
            if advance != ChapterAdvance::None {
                debug!("{:?} page of chapter {}: {:?}", page_type, chapter.id(), advance);
            }
            Self::apply_advance(reader.clone(), advance, page_type);
        }) as Box<dyn FnMut(js_sys::Array, IntersectionObserver)>);

        let options = IntersectionObserverInit::new();
        options.set_root_margin(page_type.root_margin());
        options.set_threshold(&JsValue::from_f64(OPEN_CHAPTER_INTERSECTION_RATIO));

        let observer = IntersectionObserver::new_with_options(callback.as_ref().unchecked_ref(), &options)?;
        observer.observe(element);

        Ok(PageObserver {
            observer,
            _callback: callback,
        })
    }

    /// Follows the scroll position in continuous modes
    fn track_page(&self) {
        let settings = self.settings.get();
        if !settings.reading_mode.is_continuous() {
            return;
        }
        let Some(chapter) = self.active_chapter() else {
            return;
        };

        let document = document();
        let rects: Vec<Rect> = (0..chapter.pages.len())
            .map_while(|index| document.get_element_by_id(&page_element_id(chapter.id(), index)))
            .map(|element| element_rect(&element))
            .collect();

        if let Some(page) = page_in_view(settings.reading_mode, settings.reading_direction, &rects, &viewport()) {
            self.current_page.set_neq(page);
        }
    }

    /// Progress is sent once the page stays open for a moment
    fn schedule_page_read(reader: Rc<Self>, page: usize) {
        let Some(chapter) = reader.active_chapter() else {
            return;
        };
        reader.update_url();

        // just opening a chapter isn't reading it
        if page == 0 && chapter.pages.len() > 1 {
            return;
        }

        let mode = reader.settings.get().reading_mode;
        let is_complete = next_page(mode, page, chapter.pages.len()).is_none();
        let chapter_id = chapter.id();
        let timeout = Timeout::new(PAGE_READ_DELAY_MS, move || {
            spawn_local(async move {
                if let Err(e) = query::update_page_read(chapter_id, page as i64, is_complete).await {
                    error!("error update page read: {}", e);
                    snackbar::show(format!("Could not save progress: {}", e));
                }
            });
        });

        reader.timeout.set(Some(timeout));
    }

    fn go_to_next_page(reader: Rc<Self>) {
        let mode = reader.settings.get().reading_mode;
        match next_page(mode, reader.current_page.get(), reader.page_count()) {
            Some(page) => reader.current_page.set_neq(page),
            None => Self::go_to_next_chapter(reader),
        }
    }

    fn go_to_prev_page(reader: Rc<Self>) {
        let mode = reader.settings.get().reading_mode;
        match prev_page(mode, reader.current_page.get()) {
            Some(page) => reader.current_page.set_neq(page),
            None => Self::go_to_prev_chapter(reader),
        }
    }

    fn go_to_next_chapter(reader: Rc<Self>) {
        let next = reader.navigation.lock_ref().as_ref().and_then(|n| n.next.as_ref().map(|c| c.id));
        match next {
            Some(chapter_id) => Self::open_chapter(reader, chapter_id, Nav::Next),
            None => snackbar::show("There is no next chapter".to_string()),
        }
    }

    fn go_to_prev_chapter(reader: Rc<Self>) {
        let prev = reader.navigation.lock_ref().as_ref().and_then(|n| n.prev.as_ref().map(|c| c.id));
        match prev {
            Some(chapter_id) => Self::open_chapter(reader, chapter_id, Nav::Prev),
            None => snackbar::show("There is no previous chapter".to_string()),
        }
    }

    fn toggle_bar(&self) {
        self.is_bar_visible.replace_with(|visible| !*visible);
    }

    fn render_topbar(reader: Rc<Self>) -> Dom {
        html!("div", {
            .class("topbar")
            .class("reader-topbar")
            .visible_signal(reader.is_bar_visible.signal())
            .child_signal(reader.navigation.signal_ref(|navigation| {
                navigation.as_ref().map(|navigation| link!(Route::Manga(navigation.manga_id).url(), {
                    .children(&mut [
                        icons::chevron_left(),
                    ])
                }))
            }))
            .children(&mut [
                html!("div", {
                    .class("reader-title")
                    .children(&mut [
                        html!("span", {
                            .class("title")
                            .text_signal(reader.navigation.signal_ref(|n| n.as_ref().map(|n| n.manga_title.clone()).unwrap_or_default()))
                        }),
                        html!("span", {
                            .class("subtitle")
                            .text_signal(reader.navigation.signal_ref(|n| n.as_ref().map(|n| n.chapter.name.clone()).unwrap_or_default()))
                        }),
                    ])
                }),
                html!("button", {
                    .attr("title", "Reader settings")
                    .event(clone!(reader => move |_: events::Click| reader.settings_modal.toggle_show()))
                    .children(&mut [
                        icons::settings(),
                    ])
                }),
            ])
        })
    }

    fn render_bottombar(reader: Rc<Self>) -> Dom {
        let active = reader.clone();
        let indicator = map_ref! {
            let page = reader.current_page.signal(),
            let _chapter_id = reader.chapter_id.signal(),
            let _len = reader.chapters.signal_vec_cloned().len() => {
                format!("{} / {}", page + 1, active.page_count())
            }
        };

        html!("div", {
            .class("reader-bottombar")
            .visible_signal(reader.is_bar_visible.signal())
            .children(&mut [
                html!("button", {
                    .attr("title", "Previous chapter")
                    .prop_signal("disabled", reader.navigation.signal_ref(|n| n.as_ref().map(|n| n.prev.is_none()).unwrap_or(true)))
                    .event(clone!(reader => move |_: events::Click| Self::go_to_prev_chapter(reader.clone())))
                    .children(&mut [
                        icons::chevron_left(),
                    ])
                }),
                html!("span", {
                    .class("page-indicator")
                    .text_signal(indicator)
                }),
                html!("button", {
                    .attr("title", "Next chapter")
                    .prop_signal("disabled", reader.navigation.signal_ref(|n| n.as_ref().map(|n| n.next.is_none()).unwrap_or(true)))
                    .event(clone!(reader => move |_: events::Click| Self::go_to_next_chapter(reader.clone())))
                    .children(&mut [
                        icons::chevron_right(),
                    ])
                }),
            ])
        })
    }

    fn render_page_image(url: &str, fit: Fit) -> Dom {
        html!("img", {
            .class("reader-page")
            .class(fit_class(fit))
            .attr("src", &server_url(url))
        })
    }

    /// Tap zones and arrow keys, mirrored for right to left
    fn render_navigation(reader: Rc<Self>) -> Dom {
        html!("div", {
            .class("reader-navigation")
            .style_signal("flex-direction", reader.settings.signal_ref(|s| s.reading_direction.pick("row", "row-reverse")))
            .children(&mut [
                html!("div", {
                    .class("nav-zone")
                    .event(clone!(reader => move |_: events::Click| Self::go_to_prev_page(reader.clone())))
                }),
                html!("div", {
                    .class("nav-zone")
                    .event(clone!(reader => move |_: events::Click| reader.toggle_bar()))
                }),
                html!("div", {
                    .class("nav-zone")
                    .event(clone!(reader => move |_: events::Click| Self::go_to_next_page(reader.clone())))
                }),
            ])
        })
    }

    fn render_paged(reader: Rc<Self>) -> Dom {
        let active = reader.clone();
        let visible = map_ref! {
            let settings = reader.settings.signal(),
            let page = reader.current_page.signal(),
            let _chapter_id = reader.chapter_id.signal(),
            let _len = reader.chapters.signal_vec_cloned().len() => {
                let pages = active.active_chapter().map(|chapter| chapter.pages.clone()).unwrap_or_default();
                (settings.fit, visible_pages(settings.reading_mode, settings.reading_direction, *page, &pages))
            }
        };

        html!("div", {
            .class("reader-paged")
            .global_event(clone!(reader => move |e: events::KeyDown| {
                let direction = reader.settings.get().reading_direction;
                let back: fn(Rc<Self>) = Self::go_to_prev_page;
                let forward: fn(Rc<Self>) = Self::go_to_next_page;
                let (left, right) = direction.pick((back, forward), (forward, back));
                match e.key().as_str() {
                    "ArrowLeft" => left(reader.clone()),
                    "ArrowRight" => right(reader.clone()),
                    _ => {}
                }
            }))
            .children(&mut [
                Self::render_navigation(reader.clone()),
            ])
            .child_signal(visible.map(|(fit, pages)| Some(html!("div", {
                .class("reader-spread")
                .children(pages.iter().map(|(_, url)| Self::render_page_image(url, fit)))
            }))))
        })
    }

    fn render_continuous_page(reader: Rc<Self>, chapter: Rc<LoadedChapter>, index: usize, fit: Fit) -> Dom {
        let mut page_types = vec![];
        if index == 0 {
            page_types.push(PageType::First);
        }
        if index + 1 == chapter.pages.len() {
            page_types.push(PageType::Last);
        }
        let observers: Rc<RefCell<Vec<PageObserver>>> = Rc::new(RefCell::new(vec![]));
        let chapter_id = chapter.id();

        html!("img" => HtmlImageElement, {
            .class("reader-page")
            .class(fit_class(fit))
            .attr("id", &page_element_id(chapter_id, index))
            .attr("src", &server_url(&chapter.pages[index]))
            .after_inserted(clone!(reader, observers => move |img| {
                let mut observers = observers.borrow_mut();
                for page_type in page_types {
                    match Self::observe(reader.clone(), chapter.clone(), page_type, &img) {
                        Ok(observer) => observers.push(observer),
                        Err(e) => error!("error observe page: {:?}", e),
                    }
                }

                if reader.scroll_target.get() == Some((chapter_id, index)) {
                    reader.scroll_target.set(None);
                    if index > 0 {
                        img.scroll_into_view();
                    }
                }
            }))
            .after_removed(move |_| observers.borrow_mut().clear())
        })
    }

    fn render_continuous(reader: Rc<Self>) -> Dom {
        let settings = reader.settings.get();
        let vertical = settings.reading_mode.is_continuous_vertical();
        let fit = settings.fit;

        html!("div", {
            .class(if vertical { "reader-continuous-vertical" } else { "reader-continuous-horizontal" })
            .apply_if(settings.reading_mode != ReadingMode::Webtoon && settings.padding, |dom| dom.class("page-gap"))
            .apply_if(!vertical, |dom| dom.style("flex-direction", settings.reading_direction.pick("row", "row-reverse")))
            .global_event(clone!(reader => move |_: events::Scroll| reader.track_page()))
            .event(clone!(reader => move |_: events::Scroll| reader.track_page()))
            .event(clone!(reader => move |_: events::Click| reader.toggle_bar()))
            .children_signal_vec(reader.chapters.signal_vec_cloned().map(clone!(reader => move |chapter| {
                html!("div", {
                    .class("reader-chapter")
                    .children((0..chapter.pages.len()).map(|index| {
                        Self::render_continuous_page(reader.clone(), chapter.clone(), index, fit)
                    }))
                })
            })))
        })
    }

    fn render_overlay(reader: Rc<Self>) -> Dom {
        let overlay = reader.settings.signal_ref(|s| s.custom_filter.overlay());
        html!("div", {
            .class("reader-overlay")
            .child_signal(overlay.map(|overlay| overlay.map(|(color, blend_mode)| html!("div", {
                .style("background-color", &color)
                .style("mix-blend-mode", blend_mode)
            }))))
        })
    }

    fn render_settings(reader: Rc<Self>) -> Dom {
        html!("div", {
            .child_signal(reader.settings_panel.signal_cloned().map(clone!(reader => move |panel| {
                panel.map(|panel| html!("div", {
                    .future(panel.signal().for_each(clone!(reader => move |settings| {
                        reader.settings.set_neq(settings);
                        async {}
                    })))
                    .child(Modal::render(reader.settings_modal.clone(), "Reader settings", ReaderSettingsPanel::render(panel)))
                }))
            })))
        })
    }

    pub fn render(reader: Rc<Self>) -> Dom {
        Self::open_chapter(reader.clone(), reader.chapter_id.get(), Nav::None);

        let layout = reader.settings.signal_ref(|s| (s.reading_mode, s.reading_direction, s.fit, s.padding)).dedupe();

        html!("div", {
            .attr("id", "reader")
            .future(reader.current_page.signal().for_each(clone!(reader => move |page| {
                Self::schedule_page_read(reader.clone(), page);
                async {}
            })))
            .future(reader.settings.signal_ref(|s| s.background.css_color()).dedupe().for_each(|color| {
                if let Some(body) = document().body() {
                    if let Err(e) = body.style().set_property("background-color", color) {
                        error!("error set background: {:?}", e);
                    }
                }
                async {}
            }))
            .global_event(clone!(reader => move |e: events::KeyDown| {
                if e.key() == " " && !reader.settings.get().reading_mode.is_continuous() {
                    reader.toggle_bar();
                }
            }))
            .children(&mut [
                Self::render_topbar(reader.clone()),
            ])
            .child_signal(layout.map(clone!(reader => move |(mode, _, _, _)| {
                if mode.is_continuous() {
                    Some(html!("div", {
                        .class("reader-content")
                        .style_signal("filter", reader.settings.signal_ref(|s| s.custom_filter.css_filter()))
                        .child(Self::render_continuous(reader.clone()))
                    }))
                } else {
                    Some(html!("div", {
                        .class("reader-content")
                        .style_signal("filter", reader.settings.signal_ref(|s| s.custom_filter.css_filter()))
                        .child(Self::render_paged(reader.clone()))
                    }))
                }
            })))
            .children(&mut [
                Self::render_overlay(reader.clone()),
                Self::render_bottombar(reader.clone()),
                Self::render_settings(reader.clone()),
                Spinner::render(reader.spinner.clone()),
            ])
        })
    }
}

impl Drop for Reader {
    fn drop(&mut self) {
        if let Some(body) = document().body() {
            let _ = body.style().set_property("background-color", "var(--background-color)");
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    const VIEWPORT: Viewport = Viewport {
        inner_width: 1000.0,
        inner_height: 800.0,
        scrollbar_x: 0.0,
        scrollbar_y: 0.0,
    };

    fn pages(count: usize) -> Vec<String> {
        (0..count).map(|i| format!("/page/{}", i)).collect()
    }

    #[test]
    fn test_visible_pages() {
        let pages = pages(5);
        let single = visible_pages(ReadingMode::SinglePage, ReadingDirection::Ltr, 2, &pages);
        assert_eq!(single, vec![(2, "/page/2".to_string())]);

        let double = visible_pages(ReadingMode::DoublePage, ReadingDirection::Rtl, 2, &pages);
        assert_eq!(double.iter().map(|(i, _)| *i).collect::<Vec<_>>(), vec![3, 2]);

        let last = visible_pages(ReadingMode::DoublePage, ReadingDirection::Ltr, 4, &pages);
        assert_eq!(last.len(), 1);
    }

    #[test]
    fn test_page_in_view_vertical() {
        let rects = vec![
            Rect { top: -900.0, bottom: -100.0, ..Default::default() },
            Rect { top: -100.0, bottom: 700.0, ..Default::default() },
            Rect { top: 700.0, bottom: 1500.0, ..Default::default() },
        ];
        assert_eq!(page_in_view(ReadingMode::Webtoon, ReadingDirection::Ltr, &rects, &VIEWPORT), Some(1));
        assert_eq!(page_in_view(ReadingMode::Webtoon, ReadingDirection::Ltr, &[], &VIEWPORT), None);
    }

    #[test]
    fn test_page_in_view_chapter_off_screen() {
        // a previous chapter inserted above the viewport has no page in view
        let above = vec![
            Rect { top: -3000.0, bottom: -2000.0, ..Default::default() },
            Rect { top: -2000.0, bottom: -1000.0, ..Default::default() },
            Rect { top: -1000.0, bottom: -20.0, ..Default::default() },
        ];
        assert_eq!(page_in_view(ReadingMode::ContinuousVertical, ReadingDirection::Ltr, &above, &VIEWPORT), None);

        // only the top of the first page is showing, below the middle
        let below = vec![
            Rect { top: 600.0, bottom: 1400.0, ..Default::default() },
            Rect { top: 1400.0, bottom: 2200.0, ..Default::default() },
        ];
        assert_eq!(page_in_view(ReadingMode::Webtoon, ReadingDirection::Ltr, &below, &VIEWPORT), Some(0));

        let left_of_screen = vec![Rect { left: -1800.0, right: -1000.0, ..Default::default() }];
        assert_eq!(
            page_in_view(ReadingMode::ContinuousHorizontal, ReadingDirection::Ltr, &left_of_screen, &VIEWPORT),
            None
        );
    }

    #[test]
    fn test_page_in_view_horizontal_rtl() {
        // right to left pages start at the right edge and grow to the left
        let rects = vec![
            Rect { left: 600.0, right: 1400.0, ..Default::default() },
            Rect { left: -200.0, right: 600.0, ..Default::default() },
            Rect { left: -1000.0, right: -200.0, ..Default::default() },
        ];
        assert_eq!(
            page_in_view(ReadingMode::ContinuousHorizontal, ReadingDirection::Rtl, &rects, &VIEWPORT),
            Some(1)
        );
    }
}
