#[macro_use]
extern crate log;

mod app;
mod auth;
mod common;
mod downloads;
mod library;
mod login;
mod manga;
mod query;
mod reader;
mod settings;
mod source_browse;
mod sources;
mod utils;

use utils::window;
use wasm_bindgen::{prelude::*, JsCast};

use app::App;
use web_sys::MediaQueryListEvent;

#[wasm_bindgen(start)]
pub async fn main_js() -> Result<(), JsValue> {
    #[cfg(debug_assertions)]
    console_error_panic_hook::set_once();
    wasm_logger::init(wasm_logger::Config::default());

    utils::initialize_urls();
    utils::apply_theme(&utils::load_appearance());

    // system theme changes only matter while following the system
    let closure = Closure::wrap(Box::new(|_: MediaQueryListEvent| {
        utils::apply_theme(&utils::load_appearance());
    }) as Box<dyn FnMut(_)>);

    if let Ok(Some(media_query_list)) = window().match_media("(prefers-color-scheme: dark)") {
        media_query_list.set_onchange(Some(closure.as_ref().unchecked_ref()))
    }

    closure.forget();

    dominator::append_dom(&dominator::body(), App::render(App::new()));

    Ok(())
}
