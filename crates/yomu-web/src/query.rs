use std::error::Error;

use graphql_client::GraphQLQuery;
use yomu_lib::browse::{FilterChange, FilterDef, SavedSearches, SortState, SourceContentType};
use yomu_lib::downloads::DownloadQueue;
use yomu_lib::entitlement::SaasConfig;
use yomu_lib::models::{Chapter, DownloadQueueItem, ExtensionRef, Manga, MangaSummary, Source};

use crate::auth::auth;
use crate::utils::{graphql_host, saas_config_url};

use yomu_schema::*;

/// Posts an operation once auth initialization settled, with the session's
/// bearer token when there is one
async fn post_graphql<Q>(var: Q::Variables) -> Result<Q::ResponseData, Box<dyn Error>>
where
    Q: GraphQLQuery,
{
    let auth = auth();
    auth.wait_until_settled().await;

    let url = graphql_host();
    let request_body = Q::build_query(var);

    let client = reqwest::Client::new();

    let mut req = client.post(url);
    if let Some(bearer) = auth.authorization_header() {
        req = req.header("Authorization", bearer);
    }
    let res = req.json(&request_body).send().await?;
    let response_body: graphql_client::Response<Q::ResponseData> = res.json().await?;
    match (response_body.data, response_body.errors) {
        (Some(data), _) => Ok(data) as Result<_, _>,
        (_, Some(errors)) => {
            return Err(errors
                .iter()
                .map(|e| format!("{}", e))
                .collect::<Vec<String>>()
                .join(", ")
                .into());
        }
        _ => Err("no data".into()),
    }
}

pub async fn fetch_saas_config() -> Result<SaasConfig, Box<dyn Error>> {
    auth().wait_until_settled().await;

    let res = reqwest::Client::new()
        .get(saas_config_url())
        .send()
        .await?
        .error_for_status()?;
    let body = res.text().await?;
    Ok(SaasConfig::from_json(&body)?)
}

pub async fn fetch_sources() -> Result<Vec<Source>, Box<dyn Error>> {
    let var = get_source_list::Variables {};
    let data = post_graphql::<GetSourceList>(var).await?;

    Ok(data
        .sources
        .nodes
        .into_iter()
        .map(|source| Source {
            id: source.id,
            name: source.name,
            display_name: source.display_name,
            lang: source.lang,
            icon_url: source.icon_url,
            is_nsfw: source.is_nsfw,
            is_configurable: source.is_configurable,
            supports_latest: source.supports_latest,
            extension: source.extension.map(|extension| ExtensionRef {
                pkg_name: Some(extension.pkg_name),
                repo: extension.repo,
            }),
        })
        .collect())
}

macro_rules! map_filter {
    ($filter:expr, $ty:ident, { $($rest:tt)* }) => {
        match $filter {
            $ty::CheckBoxFilter(f) => FilterDef::CheckBox {
                name: f.name,
                default: f.check_box_default,
            },
            $ty::TriStateFilter(f) => FilterDef::TriState {
                name: f.name,
                default: f.tri_state_default,
            },
            $ty::TextFilter(f) => FilterDef::Text {
                name: f.name,
                default: f.text_default,
            },
            $ty::SelectFilter(f) => FilterDef::Select {
                name: f.name,
                values: f.values,
                default: f.select_default as i32,
            },
            $ty::SortFilter(f) => FilterDef::Sort {
                name: f.name,
                values: f.values,
                default: f.sort_default.map(|sort| SortState {
                    index: sort.index as i32,
                    ascending: sort.ascending,
                }),
            },
            $ty::HeaderFilter(f) => FilterDef::Header(f.name),
            $ty::SeparatorFilter => FilterDef::Separator,
            $($rest)*
        }
    };
}

/// What the browse screen needs to know about a source
#[derive(Debug, Clone, Default)]
pub struct SourceBrowse {
    pub id: String,
    pub display_name: String,
    pub is_configurable: bool,
    pub supports_latest: bool,
    pub filters: Vec<FilterDef>,
    pub saved_searches: SavedSearches,
}

pub async fn fetch_source_browse(source_id: String) -> Result<SourceBrowse, Box<dyn Error>> {
    use get_source_browse::{GetSourceBrowseSourceFilters, GetSourceBrowseSourceFiltersOnGroupFilterFilters};

    let var = get_source_browse::Variables { id: source_id };
    let source = post_graphql::<GetSourceBrowse>(var).await?.source;

    let filters = source
        .filters
        .into_iter()
        .map(|filter| {
            map_filter!(filter, GetSourceBrowseSourceFilters, {
                GetSourceBrowseSourceFilters::GroupFilter(group) => FilterDef::Group {
                    name: group.name,
                    filters: group
                        .filters
                        .into_iter()
                        .map(|filter| {
                            map_filter!(filter, GetSourceBrowseSourceFiltersOnGroupFilterFilters, {
                                // groups don't nest
                                GetSourceBrowseSourceFiltersOnGroupFilterFilters::GroupFilter => FilterDef::Separator,
                            })
                        })
                        .collect(),
                },
            })
        })
        .collect();

    let saved_searches = source
        .meta
        .iter()
        .find(|meta| meta.key == SavedSearches::META_KEY)
        .map(|meta| SavedSearches::from_meta(Some(&meta.value)))
        .transpose()
        .unwrap_or_else(|e| {
            warn!("invalid saved searches: {}", e);
            None
        })
        .unwrap_or_default();

    Ok(SourceBrowse {
        id: source.id,
        display_name: source.display_name,
        is_configurable: source.is_configurable,
        supports_latest: source.supports_latest,
        filters,
        saved_searches,
    })
}

pub async fn fetch_source_mangas(
    source_id: String,
    content_type: SourceContentType,
    page: i64,
    query: Option<String>,
    filters: Vec<FilterChange>,
) -> Result<(Vec<MangaSummary>, bool), Box<dyn Error>> {
    let var = fetch_source_mangas::Variables {
        source: source_id,
        content_type: content_type.fetch_type().to_string(),
        page,
        query,
        filters: (content_type == SourceContentType::Search && !filters.is_empty()).then_some(filters),
    };
    let data = post_graphql::<FetchSourceMangas>(var)
        .await?
        .fetch_source_manga
        .ok_or("no data")?;

    let mangas = data
        .mangas
        .into_iter()
        .map(|manga| MangaSummary {
            id: manga.id,
            title: manga.title,
            thumbnail_url: manga.thumbnail_url,
            in_library: manga.in_library,
        })
        .collect();

    Ok((mangas, data.has_next_page))
}

macro_rules! map_manga {
    ($manga:ident) => {
        Manga {
            id: $manga.id,
            title: $manga.title,
            author: $manga.author,
            artist: $manga.artist,
            description: $manga.description,
            genre: $manga.genre,
            status: $manga.status,
            thumbnail_url: $manga.thumbnail_url,
            in_library: $manga.in_library,
            source_id: $manga.source_id,
            unread_count: $manga.unread_count,
            download_count: $manga.download_count,
            chapter_count: $manga.chapters.total_count,
        }
    };
}

/// Manga with the display name of its source
pub async fn fetch_manga(id: i64) -> Result<(Manga, Option<String>), Box<dyn Error>> {
    let var = get_manga::Variables { id };
    let manga = post_graphql::<GetManga>(var).await?.manga;
    let source_name = manga.source.as_ref().map(|source| source.display_name.clone());

    Ok((map_manga!(manga), source_name))
}

pub async fn fetch_library() -> Result<Vec<Manga>, Box<dyn Error>> {
    let var = get_library::Variables {};
    let data = post_graphql::<GetLibrary>(var).await?;

    Ok(data.mangas.nodes.into_iter().map(|manga| map_manga!(manga)).collect())
}

pub async fn fetch_chapters(manga_id: i64) -> Result<Vec<Chapter>, Box<dyn Error>> {
    let var = get_manga_chapters::Variables { manga_id };
    let data = post_graphql::<GetMangaChapters>(var)
        .await?
        .fetch_chapters
        .ok_or("no data")?;

    Ok(data
        .chapters
        .into_iter()
        .map(|chapter| Chapter {
            id: chapter.id,
            manga_id: chapter.manga_id,
            name: chapter.name,
            chapter_number: chapter.chapter_number,
            source_order: chapter.source_order,
            scanlator: chapter.scanlator,
            upload_date: chapter.upload_date.parse().unwrap_or_default(),
            fetched_at: chapter.fetched_at.parse().unwrap_or_default(),
            last_read_at: chapter.last_read_at.parse().unwrap_or_default(),
            last_page_read: chapter.last_page_read,
            page_count: chapter.page_count,
            is_read: chapter.is_read,
            is_downloaded: chapter.is_downloaded,
            is_bookmarked: chapter.is_bookmarked,
        })
        .collect())
}

pub async fn update_manga_library(id: i64, in_library: bool) -> Result<(), Box<dyn Error>> {
    let var = update_manga_library::Variables { id, in_library };
    let _ = post_graphql::<UpdateMangaLibrary>(var).await?;

    Ok(())
}

pub async fn set_chapters_read(ids: Vec<i64>, is_read: bool) -> Result<(), Box<dyn Error>> {
    let var = set_chapter_read::Variables {
        ids,
        is_read: Some(is_read),
        last_page_read: None,
    };
    let _ = post_graphql::<SetChapterRead>(var).await?;

    Ok(())
}

/// Progress of the reader, a chapter counts as read on its last page
pub async fn update_page_read(chapter_id: i64, page: i64, is_complete: bool) -> Result<(), Box<dyn Error>> {
    let var = set_chapter_read::Variables {
        ids: vec![chapter_id],
        is_read: is_complete.then_some(true),
        last_page_read: Some(page),
    };
    let _ = post_graphql::<SetChapterRead>(var).await?;

    Ok(())
}

pub async fn enqueue_chapter_downloads(ids: Vec<i64>) -> Result<(), Box<dyn Error>> {
    let var = enqueue_chapter_downloads::Variables { ids };
    let _ = post_graphql::<EnqueueChapterDownloads>(var).await?;

    Ok(())
}

pub async fn dequeue_chapter_download(id: i64) -> Result<(), Box<dyn Error>> {
    let var = dequeue_chapter_download::Variables { id };
    let _ = post_graphql::<DequeueChapterDownload>(var).await?;

    Ok(())
}

pub async fn delete_downloaded_chapters(ids: Vec<i64>) -> Result<(), Box<dyn Error>> {
    let var = delete_downloaded_chapters::Variables { ids };
    let _ = post_graphql::<DeleteDownloadedChapters>(var).await?;

    Ok(())
}

pub async fn reorder_chapter_download(chapter_id: i64, to: usize) -> Result<(), Box<dyn Error>> {
    let var = reorder_chapter_download::Variables {
        chapter_id,
        to: to as i64,
    };
    let _ = post_graphql::<ReorderChapterDownload>(var).await?;

    Ok(())
}

pub async fn fetch_download_status() -> Result<DownloadQueue, Box<dyn Error>> {
    let var = get_download_status::Variables {};
    let status = post_graphql::<GetDownloadStatus>(var).await?.download_status;

    let items = status
        .queue
        .into_iter()
        .map(|item| DownloadQueueItem {
            chapter_id: item.chapter.id,
            chapter_name: item.chapter.name,
            manga_id: item.manga.id,
            manga_title: item.manga.title,
            progress: item.progress,
            state: item.state,
            tries: item.tries,
        })
        .collect();

    Ok(DownloadQueue::new(status.state, items))
}

pub async fn start_downloader() -> Result<(), Box<dyn Error>> {
    let var = start_downloader::Variables {};
    let _ = post_graphql::<StartDownloader>(var).await?;

    Ok(())
}

pub async fn stop_downloader() -> Result<(), Box<dyn Error>> {
    let var = stop_downloader::Variables {};
    let _ = post_graphql::<StopDownloader>(var).await?;

    Ok(())
}

pub async fn clear_downloader() -> Result<(), Box<dyn Error>> {
    let var = clear_downloader::Variables {};
    let _ = post_graphql::<ClearDownloader>(var).await?;

    Ok(())
}

pub async fn fetch_chapter_pages(chapter_id: i64) -> Result<Vec<String>, Box<dyn Error>> {
    let var = get_chapter_pages::Variables { chapter_id };
    let data = post_graphql::<GetChapterPages>(var)
        .await?
        .fetch_chapter_pages
        .ok_or("no data")?;

    Ok(data.pages)
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChapterRef {
    pub id: i64,
    pub name: String,
    pub source_order: i64,
}

/// A chapter with its neighbours in source order
#[derive(Debug, Clone, PartialEq)]
pub struct ChapterNavigation {
    pub chapter: ChapterRef,
    pub last_page_read: i64,
    pub manga_id: i64,
    pub manga_title: String,
    pub prev: Option<ChapterRef>,
    pub next: Option<ChapterRef>,
}

impl ChapterNavigation {
    fn new(chapter: ChapterRef, last_page_read: i64, manga_id: i64, manga_title: String, mut chapters: Vec<ChapterRef>) -> Self {
        chapters.sort_by_key(|c| c.source_order);
        let position = chapters.iter().position(|c| c.id == chapter.id);
        let prev = position
            .and_then(|index| index.checked_sub(1))
            .and_then(|index| chapters.get(index))
            .cloned();
        let next = position.and_then(|index| chapters.get(index + 1)).cloned();

        Self {
            chapter,
            last_page_read,
            manga_id,
            manga_title,
            prev,
            next,
        }
    }
}

pub async fn fetch_chapter_navigation(chapter_id: i64) -> Result<ChapterNavigation, Box<dyn Error>> {
    let var = get_chapter_navigation::Variables { id: chapter_id };
    let chapter = post_graphql::<GetChapterNavigation>(var).await?.chapter;

    let chapters = chapter
        .manga
        .chapters
        .nodes
        .into_iter()
        .map(|c| ChapterRef {
            id: c.id,
            name: c.name,
            source_order: c.source_order,
        })
        .collect::<Vec<_>>();
    let current = chapters
        .iter()
        .find(|c| c.id == chapter.id)
        .cloned()
        .unwrap_or(ChapterRef {
            id: chapter.id,
            name: chapter.name,
            source_order: 0,
        });

    Ok(ChapterNavigation::new(
        current,
        chapter.last_page_read,
        chapter.manga.id,
        chapter.manga.title,
        chapters,
    ))
}

pub async fn set_source_meta(source_id: String, key: &str, value: String) -> Result<(), Box<dyn Error>> {
    let var = set_source_meta::Variables {
        source_id,
        key: key.to_string(),
        value,
    };
    let _ = post_graphql::<SetSourceMeta>(var).await?;

    Ok(())
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct About {
    pub server_name: String,
    pub server_version: String,
    pub webui_channel: String,
    pub webui_tag: String,
    /// Latest tag on the channel the web UI follows
    pub available_tag: String,
}

pub async fn fetch_about() -> Result<About, Box<dyn Error>> {
    let var = get_about_webui::Variables {};
    let data = post_graphql::<GetAboutWebui>(var).await?;

    Ok(About {
        server_name: data.about_server.name,
        server_version: data.about_server.version,
        webui_channel: data.about_web_ui.channel,
        webui_tag: data.about_web_ui.tag,
        available_tag: data.check_for_web_ui_update.tag,
    })
}

#[cfg(test)]
mod test {
    use super::*;

    fn chapter(id: i64, source_order: i64) -> ChapterRef {
        ChapterRef {
            id,
            name: format!("Chapter {}", source_order),
            source_order,
        }
    }

    #[test]
    fn test_chapter_navigation_neighbours() {
        let chapters = vec![chapter(30, 3), chapter(10, 1), chapter(20, 2)];

        let nav = ChapterNavigation::new(chapter(20, 2), 0, 1, "Manga".to_string(), chapters.clone());
        assert_eq!(nav.prev.map(|c| c.id), Some(10));
        assert_eq!(nav.next.map(|c| c.id), Some(30));

        let nav = ChapterNavigation::new(chapter(10, 1), 0, 1, "Manga".to_string(), chapters.clone());
        assert_eq!(nav.prev, None);
        assert_eq!(nav.next.map(|c| c.id), Some(20));

        let nav = ChapterNavigation::new(chapter(30, 3), 0, 1, "Manga".to_string(), chapters);
        assert_eq!(nav.next, None);
    }
}
