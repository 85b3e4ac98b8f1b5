//! Page navigation and the continuous-reader chapter switching.
//!
//! In continuous modes the first and last page of every loaded chapter are
//! watched by an intersection observer. Each callback is turned into an
//! [`Observation`] and [`decide`] tells whether the chapter to open (the
//! previous or next one, depending on the observed page) or the chapter of
//! the observed page becomes the current chapter.

use serde::{Deserialize, Serialize};

/// Threshold of the observer, a page at or below it left the viewport
pub const OPEN_CHAPTER_INTERSECTION_RATIO: f64 = 0.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
pub enum ReadingMode {
    #[default]
    SinglePage,
    DoublePage,
    Webtoon,
    ContinuousVertical,
    ContinuousHorizontal,
}

impl ReadingMode {
    pub const ALL: [ReadingMode; 5] = [
        ReadingMode::SinglePage,
        ReadingMode::DoublePage,
        ReadingMode::Webtoon,
        ReadingMode::ContinuousVertical,
        ReadingMode::ContinuousHorizontal,
    ];

    pub fn is_continuous(&self) -> bool {
        matches!(
            self,
            ReadingMode::Webtoon | ReadingMode::ContinuousVertical | ReadingMode::ContinuousHorizontal
        )
    }

    pub fn is_continuous_vertical(&self) -> bool {
        matches!(self, ReadingMode::Webtoon | ReadingMode::ContinuousVertical)
    }

    pub fn label(&self) -> &'static str {
        match self {
            ReadingMode::SinglePage => "Single page",
            ReadingMode::DoublePage => "Double page",
            ReadingMode::Webtoon => "Webtoon",
            ReadingMode::ContinuousVertical => "Continuous vertical",
            ReadingMode::ContinuousHorizontal => "Continuous horizontal",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
pub enum ReadingDirection {
    #[default]
    Ltr,
    Rtl,
}

impl ReadingDirection {
    /// Picks the value matching the direction, `ltr` first
    pub fn pick<T>(&self, ltr: T, rtl: T) -> T {
        match self {
            ReadingDirection::Ltr => ltr,
            ReadingDirection::Rtl => rtl,
        }
    }
}

/// Bounding client rect of an element
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
    pub left: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Viewport {
    pub inner_width: f64,
    pub inner_height: f64,
    /// Height of the horizontal scrollbar
    pub scrollbar_x: f64,
    /// Width of the vertical scrollbar
    pub scrollbar_y: f64,
}

impl Viewport {
    pub fn width(&self) -> f64 {
        self.inner_width - self.scrollbar_y
    }

    pub fn height(&self) -> f64 {
        self.inner_height - self.scrollbar_x
    }
}

/// Whether the leading (`start`) or trailing (`end`) edge of a page crossed
/// the viewport boundary, relative to the reading direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ElementIntersection {
    pub start: bool,
    pub end: bool,
}

impl ElementIntersection {
    pub fn any(&self) -> bool {
        self.start || self.end
    }
}

pub fn vertical_intersection(rect: &Rect, viewport: &Viewport) -> ElementIntersection {
    ElementIntersection {
        start: rect.bottom >= viewport.height(),
        end: rect.top < 0.0,
    }
}

pub fn horizontal_intersection(direction: ReadingDirection, rect: &Rect, viewport: &Viewport) -> ElementIntersection {
    let width = viewport.width();

    let start_of_viewport = direction.pick(0.0, width);
    let end_of_viewport = direction.pick(width, 0.0);
    let start_of_element = direction.pick(rect.left, rect.right);
    let end_of_element = direction.pick(rect.right, rect.left);

    // in rtl the coordinates grow against the reading direction
    match direction {
        ReadingDirection::Ltr => ElementIntersection {
            start: end_of_element >= end_of_viewport,
            end: start_of_element < start_of_viewport,
        },
        ReadingDirection::Rtl => ElementIntersection {
            start: end_of_element <= end_of_viewport,
            end: start_of_element > start_of_viewport,
        },
    }
}

pub fn intersection_info(
    mode: ReadingMode,
    direction: ReadingDirection,
    rect: &Rect,
    viewport: &Viewport,
) -> ElementIntersection {
    if mode.is_continuous_vertical() {
        vertical_intersection(rect, viewport)
    } else {
        horizontal_intersection(direction, rect, viewport)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageType {
    First,
    Last,
}

impl PageType {
    /// Root margin of the observer watching this page
    pub fn root_margin(&self) -> &'static str {
        match self {
            PageType::First => "0px 0px -10px 0px",
            PageType::Last => "-10px 0px 0px 0px",
        }
    }
}

/// One intersection callback of a first or last page
#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    pub page_type: PageType,
    /// Chapter the observed page belongs to
    pub chapter_id: i64,
    /// Previous chapter for the first page, next chapter for the last page
    pub chapter_to_open_id: Option<i64>,
    pub is_current_chapter: bool,
    pub is_chapter_to_open_visible: bool,
    pub reading_mode: ReadingMode,
    pub reading_direction: ReadingDirection,
    pub rect: Rect,
    pub viewport: Viewport,
    pub intersection_ratio: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChapterAdvance {
    None,
    /// Switch to the chapter to open, `load` it when it's not rendered yet
    OpenChapterToOpen { chapter_id: i64, load: bool },
    /// Switch back to the chapter of the observed page
    OpenCurrent { chapter_id: i64 },
}

impl ChapterAdvance {
    pub fn chapter_id(&self) -> Option<i64> {
        match self {
            ChapterAdvance::None => None,
            ChapterAdvance::OpenChapterToOpen { chapter_id, .. } | ChapterAdvance::OpenCurrent { chapter_id } => {
                Some(*chapter_id)
            }
        }
    }
}

/// The first page only opens the previous chapter while that one isn't
/// loaded yet, afterwards the last pages take over switching chapters.
pub fn decide(observation: &Observation) -> ChapterAdvance {
    if !observation.reading_mode.is_continuous() {
        return ChapterAdvance::None;
    }

    let Some(chapter_to_open_id) = observation.chapter_to_open_id else {
        return ChapterAdvance::None;
    };

    let intersection = intersection_info(
        observation.reading_mode,
        observation.reading_direction,
        &observation.rect,
        &observation.viewport,
    );
    if !intersection.any() {
        return ChapterAdvance::None;
    }

    let scrolled_out_of_view = observation.intersection_ratio <= OPEN_CHAPTER_INTERSECTION_RATIO;
    let is_first = observation.page_type == PageType::First;
    let is_last = observation.page_type == PageType::Last;

    let initial_open_previous = is_first && intersection.start && !observation.is_chapter_to_open_visible;
    let open_previous = is_last && !observation.is_current_chapter && intersection.end;
    let open_next = is_last && intersection.end && scrolled_out_of_view;

    if initial_open_previous || open_next {
        return ChapterAdvance::OpenChapterToOpen {
            chapter_id: chapter_to_open_id,
            load: !observation.is_chapter_to_open_visible,
        };
    }

    if open_previous {
        return ChapterAdvance::OpenCurrent {
            chapter_id: observation.chapter_id,
        };
    }

    ChapterAdvance::None
}

/// Lets a decision through once until the observed page produces a
/// different outcome, so one crossing switches chapters once
#[derive(Debug, Clone, Default)]
pub struct AdvanceLatch {
    fired: Option<ChapterAdvance>,
    initial_observe_skipped: bool,
}

impl AdvanceLatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn apply(&mut self, advance: ChapterAdvance) -> ChapterAdvance {
        // observers report once right after observing, that's not a scroll
        if !self.initial_observe_skipped {
            self.initial_observe_skipped = true;
            return ChapterAdvance::None;
        }

        match advance {
            ChapterAdvance::None => {
                self.fired = None;
                ChapterAdvance::None
            }
            advance if self.fired == Some(advance) => ChapterAdvance::None,
            advance => {
                self.fired = Some(advance);
                advance
            }
        }
    }
}

/// How the reader got to a chapter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Nav {
    None,
    Prev,
    Next,
}

/// Page to show after a chapter finished loading.
///
/// Coming back from the next chapter lands on the last page, in double page
/// mode on the first page of the last spread.
pub fn starting_page(nav: Nav, mode: ReadingMode, current_page: usize, len: usize) -> usize {
    let double = mode == ReadingMode::DoublePage;
    match nav {
        Nav::None if double => current_page - current_page % 2,
        Nav::None => current_page.min(len.saturating_sub(1)),
        Nav::Prev if double && len % 2 == 0 => len.saturating_sub(2),
        Nav::Prev => len.saturating_sub(1),
        Nav::Next => 0,
    }
}

/// Pages one step away in paged modes, `None` means leave the chapter
pub fn next_page(mode: ReadingMode, current_page: usize, len: usize) -> Option<usize> {
    let step = if mode == ReadingMode::DoublePage { 2 } else { 1 };
    let next = current_page + step;
    (next < len).then_some(next)
}

pub fn prev_page(mode: ReadingMode, current_page: usize) -> Option<usize> {
    let step = if mode == ReadingMode::DoublePage { 2 } else { 1 };
    current_page.checked_sub(step)
}

#[cfg(test)]
mod test {
    use super::*;

    const VIEWPORT: Viewport = Viewport {
        inner_width: 800.0,
        inner_height: 1000.0,
        scrollbar_x: 0.0,
        scrollbar_y: 10.0,
    };

    fn observation(page_type: PageType, rect: Rect, ratio: f64) -> Observation {
        Observation {
            page_type,
            chapter_id: 10,
            chapter_to_open_id: Some(match page_type {
                PageType::First => 9,
                PageType::Last => 11,
            }),
            is_current_chapter: true,
            is_chapter_to_open_visible: false,
            reading_mode: ReadingMode::ContinuousVertical,
            reading_direction: ReadingDirection::Ltr,
            rect,
            viewport: VIEWPORT,
            intersection_ratio: ratio,
        }
    }

    fn scrolled_past_top() -> Rect {
        Rect {
            top: -1200.0,
            right: 790.0,
            bottom: -10.0,
            left: 0.0,
        }
    }

    #[test]
    fn test_vertical_intersection() {
        let below = Rect {
            top: 900.0,
            right: 790.0,
            bottom: 2100.0,
            left: 0.0,
        };
        assert_eq!(
            vertical_intersection(&below, &VIEWPORT),
            ElementIntersection { start: true, end: false }
        );
        assert_eq!(
            vertical_intersection(&scrolled_past_top(), &VIEWPORT),
            ElementIntersection { start: false, end: true }
        );
    }

    #[test]
    fn test_horizontal_intersection_directions() {
        // page hanging off the right edge
        let right = Rect {
            top: 0.0,
            right: 1200.0,
            bottom: 1000.0,
            left: 700.0,
        };
        assert_eq!(
            horizontal_intersection(ReadingDirection::Ltr, &right, &VIEWPORT),
            ElementIntersection { start: true, end: false }
        );
        assert_eq!(
            horizontal_intersection(ReadingDirection::Rtl, &right, &VIEWPORT),
            ElementIntersection { start: false, end: true }
        );

        // page hanging off the left edge
        let left = Rect {
            top: 0.0,
            right: 100.0,
            bottom: 1000.0,
            left: -400.0,
        };
        assert_eq!(
            horizontal_intersection(ReadingDirection::Ltr, &left, &VIEWPORT),
            ElementIntersection { start: false, end: true }
        );
        assert_eq!(
            horizontal_intersection(ReadingDirection::Rtl, &left, &VIEWPORT),
            ElementIntersection { start: true, end: false }
        );
    }

    #[test]
    fn test_next_chapter_after_last_page_scrolled_out() {
        let advance = decide(&observation(PageType::Last, scrolled_past_top(), 0.0));
        assert_eq!(
            advance,
            ChapterAdvance::OpenChapterToOpen {
                chapter_id: 11,
                load: true
            }
        );
    }

    #[test]
    fn test_last_page_still_visible_does_nothing() {
        let rect = Rect {
            top: -100.0,
            right: 790.0,
            bottom: 500.0,
            left: 0.0,
        };
        assert_eq!(decide(&observation(PageType::Last, rect, 0.5)), ChapterAdvance::None);
    }

    #[test]
    fn test_back_into_previous_chapter() {
        let rect = Rect {
            top: -100.0,
            right: 790.0,
            bottom: 500.0,
            left: 0.0,
        };
        let mut obs = observation(PageType::Last, rect, 0.5);
        obs.is_current_chapter = false;
        obs.is_chapter_to_open_visible = true;
        assert_eq!(decide(&obs), ChapterAdvance::OpenCurrent { chapter_id: 10 });
    }

    #[test]
    fn test_first_page_opens_previous_once_loaded() {
        let rect = Rect {
            top: 200.0,
            right: 790.0,
            bottom: 1400.0,
            left: 0.0,
        };
        let obs = observation(PageType::First, rect, 0.5);
        assert_eq!(
            decide(&obs),
            ChapterAdvance::OpenChapterToOpen {
                chapter_id: 9,
                load: true
            }
        );

        let mut loaded = obs.clone();
        loaded.is_chapter_to_open_visible = true;
        assert_eq!(decide(&loaded), ChapterAdvance::None);
    }

    #[test]
    fn test_paged_mode_and_missing_chapter_ignored() {
        let mut obs = observation(PageType::Last, scrolled_past_top(), 0.0);
        obs.reading_mode = ReadingMode::SinglePage;
        assert_eq!(decide(&obs), ChapterAdvance::None);

        let mut obs = observation(PageType::Last, scrolled_past_top(), 0.0);
        obs.chapter_to_open_id = None;
        assert_eq!(decide(&obs), ChapterAdvance::None);
    }

    #[test]
    fn test_latch_fires_once_per_crossing() {
        let mut latch = AdvanceLatch::new();
        let obs = observation(PageType::Last, scrolled_past_top(), 0.0);

        // initial observe
        assert_eq!(latch.apply(decide(&obs)), ChapterAdvance::None);

        let fired = latch.apply(decide(&obs));
        assert_eq!(fired.chapter_id(), Some(11));
        assert_eq!(latch.apply(decide(&obs)), ChapterAdvance::None);

        // page came back into view, the next crossing fires again
        let inside = Rect {
            top: 10.0,
            right: 790.0,
            bottom: 900.0,
            left: 0.0,
        };
        assert_eq!(latch.apply(decide(&observation(PageType::Last, inside, 1.0))), ChapterAdvance::None);
        assert_eq!(latch.apply(decide(&obs)).chapter_id(), Some(11));
    }

    #[test]
    fn test_paged_navigation() {
        assert_eq!(starting_page(Nav::None, ReadingMode::DoublePage, 5, 10), 4);
        assert_eq!(starting_page(Nav::Prev, ReadingMode::DoublePage, 0, 10), 8);
        assert_eq!(starting_page(Nav::Prev, ReadingMode::DoublePage, 0, 9), 8);
        assert_eq!(starting_page(Nav::Prev, ReadingMode::SinglePage, 0, 9), 8);
        assert_eq!(starting_page(Nav::Next, ReadingMode::SinglePage, 3, 9), 0);

        assert_eq!(next_page(ReadingMode::SinglePage, 7, 9), Some(8));
        assert_eq!(next_page(ReadingMode::SinglePage, 8, 9), None);
        assert_eq!(next_page(ReadingMode::DoublePage, 6, 9), Some(8));
        assert_eq!(prev_page(ReadingMode::DoublePage, 1), None);
        assert_eq!(prev_page(ReadingMode::SinglePage, 1), Some(0));
    }

    #[test]
    fn test_root_margins() {
        assert_eq!(PageType::First.root_margin(), "0px 0px -10px 0px");
        assert_eq!(PageType::Last.root_margin(), "-10px 0px 0px 0px");
    }
}
