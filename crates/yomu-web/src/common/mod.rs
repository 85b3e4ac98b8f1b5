pub mod bottombar;

mod route;
pub use route::{Route, SettingCategory};

mod manga_card;
pub use manga_card::MangaCard;

mod spinner;
pub use spinner::Spinner;

pub mod reader_settings;
pub use reader_settings::ReaderSettingsPanel;

mod appbar_search;
pub use appbar_search::AppbarSearchField;

pub mod empty_view;

pub mod events;

pub mod icons;

pub mod snackbar;

mod modal;
pub use modal::Modal;

pub mod tristate;
