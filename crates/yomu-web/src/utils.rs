use std::sync::atomic::{AtomicUsize, Ordering};

use anyhow::anyhow;
use futures::{
    future::{abortable, AbortHandle},
    Future,
};
use futures_signals::signal::{Mutable, Signal};
use serde::{de::DeserializeOwned, Serialize};
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::spawn_local;
use web_sys::{Document, History, HtmlElement, Storage, Window};
use yomu_lib::appearance::{self, AppearanceSettings};

/// Local storage entry overriding the server the client talks to
pub const SERVER_ADDRESS_KEY: &str = "server_address";

thread_local! {
    static WINDOW: Window = web_sys::window().unwrap_throw();
    static DOCUMENT: Document = WINDOW.with(|w| w.document().unwrap_throw());
    static BODY: HtmlElement = DOCUMENT.with(|d| d.body().unwrap_throw());
    static LOCAL_STORAGE: Storage = WINDOW.with(|w| w.local_storage().unwrap_throw().unwrap_throw());
    static HISTORY: History = WINDOW.with(|w| w.history().unwrap_throw());
    static SERVER_HOST: std::cell::RefCell<String> = std::cell::RefCell::new("".to_string());
    static GRAPHQL_HOST: std::cell::RefCell<String> = std::cell::RefCell::new("/api/graphql".to_string());
    static SAAS_CONFIG_URL: std::cell::RefCell<String> = std::cell::RefCell::new("/api/saas/config".to_string());
    static AUTH_URL: std::cell::RefCell<Option<String>> = const { std::cell::RefCell::new(None) };
    static AUTH_KEY: std::cell::RefCell<String> = std::cell::RefCell::new("".to_string());
}

pub struct AsyncState {
    id: usize,
    handle: AbortHandle,
}

impl AsyncState {
    fn new(handle: AbortHandle) -> Self {
        static ID: AtomicUsize = AtomicUsize::new(0);
        let id = ID.fetch_add(1, Ordering::SeqCst);

        Self { id, handle }
    }
}

/// Runs one future at a time, starting a new load aborts the running one
pub struct AsyncLoader {
    loading: Mutable<Option<AsyncState>>,
}

impl Default for AsyncLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl AsyncLoader {
    pub fn new() -> Self {
        Self {
            loading: Mutable::new(None),
        }
    }

    pub fn cancel(&self) {
        self.replace(None)
    }

    fn replace(&self, value: Option<AsyncState>) {
        let mut loading = self.loading.lock_mut();
        if let Some(state) = loading.as_mut() {
            debug!("aborting load {}", state.id);
            state.handle.abort();
        }
        *loading = value;
    }

    pub fn load<F>(&self, fut: F)
    where
        F: Future<Output = ()> + 'static,
    {
        let (fut, handle) = abortable(fut);

        let state = AsyncState::new(handle);
        let id = state.id;

        self.replace(Some(state));

        let loading = self.loading.clone();

        spawn_local(async move {
            match fut.await {
                Ok(()) => {
                    let mut loading = loading.lock_mut();

                    if let Some(current_id) = loading.as_ref().map(|x| x.id) {
                        if current_id == id {
                            *loading = None;
                        }
                    }
                }
                Err(_) => {
                    debug!("load {} aborted", id);
                }
            }
        });
    }

    pub fn is_loading_now(&self) -> bool {
        self.loading.lock_ref().is_some()
    }

    pub fn is_loading(&self) -> impl Signal<Item = bool> + use<> {
        self.loading.signal_ref(|x| x.is_some())
    }
}

fn eval_string(expr: &str) -> Option<String> {
    match js_sys::eval(expr) {
        Ok(val) if !val.is_undefined() && !val.is_null() => val.as_string(),
        _ => None,
    }
}

/// Server address without trailing slash, the page origin unless overridden
pub fn server_address() -> String {
    local_storage()
        .get(SERVER_ADDRESS_KEY)
        .unwrap_throw()
        .filter(|address| !address.trim().is_empty())
        .map(|address| address.trim().trim_end_matches('/').to_string())
        .unwrap_or_else(origin)
}

/// Empty address goes back to the page origin
pub fn set_server_address(address: &str) {
    let storage = local_storage();
    let result = if address.trim().is_empty() {
        storage.delete(SERVER_ADDRESS_KEY)
    } else {
        storage.set(SERVER_ADDRESS_KEY, address.trim())
    };
    if let Err(e) = result {
        error!("error saving server address: {:?}", e);
    }
    initialize_urls();
}

fn origin() -> String {
    window().location().origin().unwrap_throw()
}

pub fn initialize_urls() {
    let server = server_address();
    info!("using server {}", server);

    GRAPHQL_HOST.with(|s| *s.borrow_mut() = format!("{}/api/graphql", server));
    SERVER_HOST.with(|s| *s.borrow_mut() = server);
    // served by the hosting page, not the manga server
    SAAS_CONFIG_URL.with(|s| *s.borrow_mut() = format!("{}/api/saas/config", origin()));

    let auth_url = eval_string("window.__YOMU_AUTH_URL__").map(|url| url.trim_end_matches('/').to_string());
    if auth_url.is_none() {
        warn!("no auth backend configured, authentication is disabled");
    }
    AUTH_URL.with(|s| *s.borrow_mut() = auth_url);
    AUTH_KEY.with(|s| *s.borrow_mut() = eval_string("window.__YOMU_AUTH_KEY__").unwrap_or_default());
}

pub fn graphql_host() -> String {
    GRAPHQL_HOST.with(|v| v.borrow().clone())
}

pub fn saas_config_url() -> String {
    SAAS_CONFIG_URL.with(|v| v.borrow().clone())
}

pub fn auth_url() -> Option<String> {
    AUTH_URL.with(|v| v.borrow().clone())
}

pub fn auth_key() -> String {
    AUTH_KEY.with(|v| v.borrow().clone())
}

/// Thumbnails and pages come as paths relative to the server
pub fn server_url(path: &str) -> String {
    if path.starts_with("http://") || path.starts_with("https://") {
        path.to_string()
    } else {
        format!("{}{}", SERVER_HOST.with(|v| v.borrow().clone()), path)
    }
}

pub fn load_settings<T>(key: &str) -> T
where
    T: DeserializeOwned + Default,
{
    local_storage()
        .get(key)
        .unwrap_throw()
        .and_then(|value| match serde_json::from_str(&value) {
            Ok(settings) => Some(settings),
            Err(e) => {
                warn!("invalid {}: {}", key, e);
                None
            }
        })
        .unwrap_or_default()
}

pub fn save_settings<T: Serialize>(key: &str, settings: &T) {
    match serde_json::to_string(settings) {
        Ok(value) => {
            if let Err(e) = local_storage().set(key, &value) {
                error!("error saving {}: {:?}", key, e);
            }
        }
        Err(e) => error!("error serializing {}: {}", key, e),
    }
}

pub fn replace_state_with_url(url: &str) {
    if let Err(e) = history().replace_state_with_url(&JsValue::null(), "", Some(url)) {
        let message = if let Some(msg) = e.as_string() {
            msg
        } else {
            "unknown reason".to_string()
        };

        error!("error replace_state_with_url: {}", message);
    }
}

pub fn go_back() {
    if history().length().unwrap_or_default() > 1 {
        let _ = history().back();
    } else {
        dominator::routing::go_to_url("/");
    }
}

pub fn scroll_to_top() {
    window().scroll_to_with_x_and_y(0.0_f64, 0.0_f64);
}

pub fn format_date(timestamp_ms: i64) -> String {
    chrono::DateTime::from_timestamp_millis(timestamp_ms)
        .map(|date| date.format("%Y-%m-%d").to_string())
        .unwrap_or_default()
}

pub fn prefers_dark() -> bool {
    window()
        .match_media("(prefers-color-scheme: dark)")
        .ok()
        .flatten()
        .map(|m| m.matches())
        .unwrap_or(false)
}

pub fn load_appearance() -> AppearanceSettings {
    AppearanceSettings::from_stored(local_storage().get(appearance::KEY).unwrap_throw().as_deref())
}

pub fn apply_theme(settings: &AppearanceSettings) {
    let theme = settings.data_theme(prefers_dark());
    if let Some(root) = document().document_element() {
        if let Err(e) = root.set_attribute("data-theme", theme) {
            error!("error set data-theme: {:?}", e);
        }
    }

    let status_bar_color = match theme {
        "black" => "#000000",
        "dark" => "#090909",
        _ => "#5b749b",
    };

    if let Err(e) = apply_theme_color(status_bar_color) {
        debug!("{}", e);
    }
}

pub fn apply_theme_color(status_bar_color: &str) -> Result<(), anyhow::Error> {
    if window()
        .match_media("(display-mode: standalone)")
        .map_err(|e| anyhow!("error match media: {:?}", e))?
        .ok_or_else(|| anyhow!("no display-mode query"))?
        .matches()
    {
        document()
            .query_selector("meta[name=\"theme-color\"]")
            .map_err(|e| anyhow!("error query meta: {:?}", e))?
            .ok_or_else(|| anyhow!("no theme-color meta"))?
            .set_attribute("content", status_bar_color)
            .map_err(|e| anyhow!("error set content: {:?}", e))?;
    }

    Ok(())
}

pub fn window() -> Window {
    WINDOW.with(|s| s.clone())
}

pub fn local_storage() -> Storage {
    LOCAL_STORAGE.with(|s| s.clone())
}

pub fn history() -> History {
    HISTORY.with(|h| h.clone())
}

pub fn document() -> Document {
    DOCUMENT.with(|d| d.clone())
}

pub fn body() -> HtmlElement {
    BODY.with(|d| d.clone())
}
