use dominator::routing;
use futures_signals::signal::{Signal, SignalExt};
use wasm_bindgen::prelude::*;
use web_sys::Url;
use yomu_lib::browse::SourceContentType;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingCategory {
    None,
    Appearance,
    Reader,
    About,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Login,
    Library,
    Sources,
    SourceBrowse {
        source_id: String,
        content_type: SourceContentType,
        query: Option<String>,
    },
    Manga(i64),
    /// Chapter id and zero based page
    Chapter(i64, usize),
    Downloads,
    Settings(SettingCategory),
    NotFound,
}

impl Route {
    pub fn signal() -> impl Signal<Item = Self> {
        routing::url()
            .signal_ref(|url| Url::new(url).unwrap_throw())
            .map(|url| {
                let query = url.search_params().get("query");
                Self::parse(&url.pathname(), query, &url.hash())
            })
    }

    pub fn parse(pathname: &str, query: Option<String>, hash: &str) -> Self {
        let mut paths = pathname.split('/').collect::<Vec<_>>();
        paths.retain(|path| !path.is_empty());

        match paths.as_slice() {
            [] | ["library"] => Route::Library,
            ["login"] => Route::Login,
            ["sources"] => Route::Sources,
            ["sources", id] => Route::SourceBrowse {
                source_id: id.to_string(),
                content_type: SourceContentType::Popular,
                query: None,
            },
            ["sources", id, kind] => {
                let content_type = match *kind {
                    "popular" => SourceContentType::Popular,
                    "latest" => SourceContentType::Latest,
                    "search" => SourceContentType::Search,
                    _ => return Route::NotFound,
                };
                Route::SourceBrowse {
                    source_id: id.to_string(),
                    content_type,
                    query: query.filter(|query| !query.is_empty()),
                }
            }
            ["manga", id] => match id.parse() {
                Ok(id) => Route::Manga(id),
                Err(_) => Route::NotFound,
            },
            ["chapter", id] => match id.parse() {
                Ok(id) => {
                    let page = hash
                        .strip_prefix('#')
                        .and_then(|h| h.parse::<usize>().ok())
                        .unwrap_or(1);
                    Route::Chapter(id, page.saturating_sub(1))
                }
                Err(_) => Route::NotFound,
            },
            ["downloads"] => Route::Downloads,
            ["settings"] => Route::Settings(SettingCategory::None),
            ["settings", cat] => match *cat {
                "appearance" => Route::Settings(SettingCategory::Appearance),
                "reader" => Route::Settings(SettingCategory::Reader),
                "about" => Route::Settings(SettingCategory::About),
                _ => Route::NotFound,
            },
            _ => Route::NotFound,
        }
    }

    pub fn url(&self) -> String {
        match self {
            Route::Login => "/login".to_string(),
            Route::Library => "/".to_string(),
            Route::Sources => "/sources".to_string(),
            Route::SourceBrowse {
                source_id,
                content_type,
                query,
            } => {
                let kind = match content_type {
                    SourceContentType::Popular => "popular",
                    SourceContentType::Latest => "latest",
                    SourceContentType::Search => "search",
                };
                match query {
                    Some(query) if !query.is_empty() => format!(
                        "/sources/{}/{}?query={}",
                        source_id,
                        kind,
                        String::from(js_sys::encode_uri_component(query))
                    ),
                    _ => format!("/sources/{}/{}", source_id, kind),
                }
            }
            Route::Manga(manga_id) => format!("/manga/{}", manga_id),
            Route::Chapter(chapter_id, page) => format!("/chapter/{}#{}", chapter_id, page + 1),
            Route::Downloads => "/downloads".to_string(),
            Route::Settings(SettingCategory::None) => "/settings".to_string(),
            Route::Settings(SettingCategory::Appearance) => "/settings/appearance".to_string(),
            Route::Settings(SettingCategory::Reader) => "/settings/reader".to_string(),
            Route::Settings(SettingCategory::About) => "/settings/about".to_string(),
            Route::NotFound => "/notfound".to_string(),
        }
    }

    /// Screens with the bottom navigation
    pub fn has_bottombar(&self) -> bool {
        matches!(
            self,
            Route::Library | Route::Sources | Route::Downloads | Route::Settings(SettingCategory::None)
        )
    }

    /// Screens reachable while signed out
    pub fn is_public(&self) -> bool {
        matches!(self, Route::Login)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_parse() {
        assert_eq!(Route::parse("/", None, ""), Route::Library);
        assert_eq!(Route::parse("/sources/", None, ""), Route::Sources);
        assert_eq!(
            Route::parse("/sources/12345/search", Some("one piece".to_string()), ""),
            Route::SourceBrowse {
                source_id: "12345".to_string(),
                content_type: SourceContentType::Search,
                query: Some("one piece".to_string()),
            }
        );
        assert_eq!(
            Route::parse("/sources/0/latest", Some("".to_string()), ""),
            Route::SourceBrowse {
                source_id: "0".to_string(),
                content_type: SourceContentType::Latest,
                query: None,
            }
        );
        assert_eq!(Route::parse("/sources/1/newest", None, ""), Route::NotFound);
        assert_eq!(Route::parse("/chapter/7", None, "#3"), Route::Chapter(7, 2));
        assert_eq!(Route::parse("/chapter/7", None, ""), Route::Chapter(7, 0));
        assert_eq!(Route::parse("/manga/abc", None, ""), Route::NotFound);
        assert_eq!(
            Route::parse("/settings/reader", None, ""),
            Route::Settings(SettingCategory::Reader)
        );
    }

    #[test]
    fn test_url_round_trip() {
        for route in [
            Route::Library,
            Route::Sources,
            Route::Manga(3),
            Route::Chapter(9, 4),
            Route::Downloads,
            Route::Settings(SettingCategory::About),
        ] {
            let url = route.url();
            let (path, hash) = match url.split_once('#') {
                Some((path, hash)) => (path.to_string(), format!("#{}", hash)),
                None => (url.clone(), "".to_string()),
            };
            assert_eq!(Route::parse(&path, None, &hash), route);
        }
    }
}
