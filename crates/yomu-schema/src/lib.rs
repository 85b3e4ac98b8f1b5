use graphql_client::GraphQLQuery;

type LongString = String;
type FetchSourceMangaType = String;
type MangaStatus = yomu_lib::models::MangaStatus;
type DownloadState = yomu_lib::models::DownloadState;
type DownloaderState = yomu_lib::models::DownloaderState;
type TriState = yomu_lib::browse::TriState;
type FilterChangeInput = yomu_lib::browse::FilterChange;

#[derive(GraphQLQuery)]
#[graphql(
    schema_path = "graphql/schema.graphql",
    query_path = "graphql/get_source_list.graphql",
    response_derives = "Debug, Clone"
)]
pub struct GetSourceList;

#[derive(GraphQLQuery)]
#[graphql(
    schema_path = "graphql/schema.graphql",
    query_path = "graphql/get_source_browse.graphql",
    response_derives = "Debug, Clone"
)]
pub struct GetSourceBrowse;

#[derive(GraphQLQuery)]
#[graphql(
    schema_path = "graphql/schema.graphql",
    query_path = "graphql/fetch_source_mangas.graphql",
    response_derives = "Debug, Clone"
)]
pub struct FetchSourceMangas;

#[derive(GraphQLQuery)]
#[graphql(
    schema_path = "graphql/schema.graphql",
    query_path = "graphql/get_manga.graphql",
    response_derives = "Debug, Clone"
)]
pub struct GetManga;

#[derive(GraphQLQuery)]
#[graphql(
    schema_path = "graphql/schema.graphql",
    query_path = "graphql/get_manga_chapters.graphql",
    response_derives = "Debug, Clone"
)]
pub struct GetMangaChapters;

#[derive(GraphQLQuery)]
#[graphql(
    schema_path = "graphql/schema.graphql",
    query_path = "graphql/get_library.graphql",
    response_derives = "Debug, Clone"
)]
pub struct GetLibrary;

#[derive(GraphQLQuery)]
#[graphql(
    schema_path = "graphql/schema.graphql",
    query_path = "graphql/set_chapter_read.graphql",
    response_derives = "Debug"
)]
pub struct SetChapterRead;

#[derive(GraphQLQuery)]
#[graphql(
    schema_path = "graphql/schema.graphql",
    query_path = "graphql/enqueue_chapter_downloads.graphql",
    response_derives = "Debug"
)]
pub struct EnqueueChapterDownloads;

#[derive(GraphQLQuery)]
#[graphql(
    schema_path = "graphql/schema.graphql",
    query_path = "graphql/dequeue_chapter_download.graphql",
    response_derives = "Debug"
)]
pub struct DequeueChapterDownload;

#[derive(GraphQLQuery)]
#[graphql(
    schema_path = "graphql/schema.graphql",
    query_path = "graphql/delete_downloaded_chapters.graphql",
    response_derives = "Debug"
)]
pub struct DeleteDownloadedChapters;

#[derive(GraphQLQuery)]
#[graphql(
    schema_path = "graphql/schema.graphql",
    query_path = "graphql/reorder_chapter_download.graphql",
    response_derives = "Debug"
)]
pub struct ReorderChapterDownload;

#[derive(GraphQLQuery)]
#[graphql(
    schema_path = "graphql/schema.graphql",
    query_path = "graphql/get_download_status.graphql",
    response_derives = "Debug, Clone"
)]
pub struct GetDownloadStatus;

#[derive(GraphQLQuery)]
#[graphql(
    schema_path = "graphql/schema.graphql",
    query_path = "graphql/start_downloader.graphql",
    response_derives = "Debug"
)]
pub struct StartDownloader;

#[derive(GraphQLQuery)]
#[graphql(
    schema_path = "graphql/schema.graphql",
    query_path = "graphql/stop_downloader.graphql",
    response_derives = "Debug"
)]
pub struct StopDownloader;

#[derive(GraphQLQuery)]
#[graphql(
    schema_path = "graphql/schema.graphql",
    query_path = "graphql/clear_downloader.graphql",
    response_derives = "Debug"
)]
pub struct ClearDownloader;

#[derive(GraphQLQuery)]
#[graphql(
    schema_path = "graphql/schema.graphql",
    query_path = "graphql/get_chapter_pages.graphql",
    response_derives = "Debug"
)]
pub struct GetChapterPages;

#[derive(GraphQLQuery)]
#[graphql(
    schema_path = "graphql/schema.graphql",
    query_path = "graphql/get_chapter_navigation.graphql",
    response_derives = "Debug, Clone"
)]
pub struct GetChapterNavigation;

#[derive(GraphQLQuery)]
#[graphql(
    schema_path = "graphql/schema.graphql",
    query_path = "graphql/update_manga_library.graphql",
    response_derives = "Debug"
)]
pub struct UpdateMangaLibrary;

#[derive(GraphQLQuery)]
#[graphql(
    schema_path = "graphql/schema.graphql",
    query_path = "graphql/set_source_meta.graphql",
    response_derives = "Debug"
)]
pub struct SetSourceMeta;

#[derive(GraphQLQuery)]
#[graphql(
    schema_path = "graphql/schema.graphql",
    query_path = "graphql/get_about_webui.graphql",
    response_derives = "Debug"
)]
pub struct GetAboutWebui;
