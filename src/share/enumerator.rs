//! Depth-first enumeration of a shared folder tree.
//!
//! The walk uses an explicit stack of folder frames instead of recursion, so
//! tree depth is bounded only by memory. Each frame holds the undrained items
//! of its current page and a cursor to the next page. A subfolder's frame is
//! pushed at the subfolder's position, which splices its files into the
//! output exactly where the provider listed the folder.

use std::collections::VecDeque;

use reqwest::StatusCode;
use tracing::{debug, info, instrument, warn};

use super::headers::HeaderSet;
use super::listing::{LISTING_CONTENT_TYPE, ListingItem, ListingPage, multipart_body};
use super::{ProviderEndpoints, ShareError, ShareResolver, ShareSession, TokenExchange};
use crate::cache::{CacheWriter, EnumerationResult, FileEntry, LinkCache};
use crate::cancel::CancelFlag;
use crate::http::{HttpSession, RequestSpec};

/// Upper bound on continuation pages followed for a single folder.
pub const MAX_PAGES_PER_FOLDER: usize = 1_000;

/// A folder waiting to be listed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FolderNode {
    /// Item path relative to the drive, without a trailing slash.
    pub relative_path: String,
    pub depth: usize,
}

impl FolderNode {
    fn child(&self, name: &str) -> Self {
        Self {
            relative_path: format!("{}/{name}", self.relative_path),
            depth: self.depth + 1,
        }
    }
}

enum PageCursor {
    First,
    Next(String),
    Exhausted,
}

struct Frame {
    node: FolderNode,
    pending: VecDeque<ListingItem>,
    cursor: PageCursor,
    pages: usize,
}

impl Frame {
    fn new(node: FolderNode) -> Self {
        Self {
            node,
            pending: VecDeque::new(),
            cursor: PageCursor::First,
            pages: 0,
        }
    }
}

/// Lists a share and flattens it into an [`EnumerationResult`].
#[derive(Debug, Clone)]
pub struct FolderEnumerator {
    http: HttpSession,
    endpoints: ProviderEndpoints,
}

impl FolderEnumerator {
    /// Enumerator against the production provider endpoints.
    #[must_use]
    pub fn new(http: HttpSession) -> Self {
        Self::with_endpoints(http, ProviderEndpoints::default())
    }

    #[must_use]
    pub fn with_endpoints(http: HttpSession, endpoints: ProviderEndpoints) -> Self {
        Self { http, endpoints }
    }

    #[must_use]
    pub fn endpoints(&self) -> &ProviderEndpoints {
        &self.endpoints
    }

    /// Resolves the share link, issues a token, and redeems the share.
    ///
    /// # Errors
    ///
    /// Propagates [`ShareError::Resolution`], [`ShareError::Auth`], and
    /// [`ShareError::Transport`] from the individual steps.
    pub async fn establish(&self, share_url: &str) -> Result<ShareSession, ShareError> {
        let resolved = ShareResolver::new(self.http.clone(), self.endpoints.clone())
            .resolve(share_url)
            .await?;
        let exchange = TokenExchange::new(self.http.clone(), self.endpoints.clone());
        let bearer = exchange.issue().await?;
        let session = ShareSession::new(resolved, bearer);
        exchange.redeem(&session).await?;
        Ok(session)
    }

    /// Full run: establishes a session, walks the whole share, and writes
    /// the result to `cache`.
    ///
    /// The cache lock is taken before any network traffic, so a concurrent
    /// run against the same directory fails immediately.
    ///
    /// # Errors
    ///
    /// Any [`ShareError`]; the cache is left untouched on failure.
    pub async fn enumerate_share(
        &self,
        share_url: &str,
        cache: &LinkCache,
        cancel: &CancelFlag,
    ) -> Result<EnumerationResult, ShareError> {
        let writer = cache.lock()?;
        let session = self.establish(share_url).await?;
        self.walk_and_persist(&session, &writer, cancel).await
    }

    /// Walks an established session from its root and writes the result.
    ///
    /// # Errors
    ///
    /// Any [`ShareError`]; the cache is left untouched on failure.
    pub async fn enumerate_into(
        &self,
        session: &ShareSession,
        cache: &LinkCache,
        cancel: &CancelFlag,
    ) -> Result<EnumerationResult, ShareError> {
        let writer = cache.lock()?;
        self.walk_and_persist(session, &writer, cancel).await
    }

    async fn walk_and_persist(
        &self,
        session: &ShareSession,
        writer: &CacheWriter,
        cancel: &CancelFlag,
    ) -> Result<EnumerationResult, ShareError> {
        let files = self
            .enumerate(session, session.root_relative_path(), 0, cancel)
            .await?;
        let result = EnumerationResult::new(files);
        writer.write(&result)?;
        info!(files = result.len(), total_bytes = result.total_size(), "enumeration complete");
        Ok(result)
    }

    /// Lists `relative_path` and everything below it, depth-first in
    /// provider order. Nothing is persisted.
    ///
    /// # Errors
    ///
    /// - [`ShareError::Auth`] when a listing is rejected with 401/403
    /// - [`ShareError::Enumeration`] on an error status, a malformed page,
    ///   a continuation link off the API host, or a runaway continuation
    /// - [`ShareError::Cancelled`] when `cancel` trips between pages
    /// - [`ShareError::Transport`] when the API is unreachable after retries
    #[instrument(skip(self, session, cancel), fields(drive_id = %session.drive_id()))]
    pub async fn enumerate(
        &self,
        session: &ShareSession,
        relative_path: &str,
        depth: usize,
        cancel: &CancelFlag,
    ) -> Result<Vec<FileEntry>, ShareError> {
        let mut files = Vec::new();
        let mut stack = vec![Frame::new(FolderNode {
            relative_path: relative_path.trim_end_matches('/').to_string(),
            depth,
        })];

        while let Some(frame) = stack.last_mut() {
            if let Some(item) = frame.pending.pop_front() {
                match item {
                    ListingItem::File(entry) => {
                        debug!(depth = frame.node.depth, name = %entry.name, size = entry.size, "file");
                        files.push(entry);
                    }
                    ListingItem::Folder { name } => {
                        let child = frame.node.child(&name);
                        stack.push(Frame::new(child));
                    }
                }
                continue;
            }

            let url = match std::mem::replace(&mut frame.cursor, PageCursor::Exhausted) {
                PageCursor::First => {
                    info!(path = %frame.node.relative_path, depth = frame.node.depth, "listing folder");
                    self.endpoints
                        .listing_url(session.drive_id(), &frame.node.relative_path)
                }
                PageCursor::Next(url) => url,
                PageCursor::Exhausted => {
                    stack.pop();
                    continue;
                }
            };

            if cancel.is_cancelled() {
                warn!(files_found = files.len(), "enumeration cancelled");
                return Err(ShareError::Cancelled {
                    files_found: files.len(),
                });
            }

            frame.pages += 1;
            if frame.pages > MAX_PAGES_PER_FOLDER {
                return Err(ShareError::enumeration(
                    &frame.node.relative_path,
                    format!("more than {MAX_PAGES_PER_FOLDER} continuation pages"),
                ));
            }

            let page = self.fetch_page(session, &frame.node, &url).await?;
            debug!(
                path = %frame.node.relative_path,
                page = frame.pages,
                items = page.value.len(),
                has_next = page.next_link.is_some(),
                "listing page received"
            );
            frame
                .pending
                .extend(page.value.into_iter().map(ListingItem::from));
            frame.cursor = match page.next_link {
                Some(link) if self.endpoints.is_api_url(&link) => PageCursor::Next(link),
                Some(link) => {
                    return Err(ShareError::enumeration(
                        &frame.node.relative_path,
                        format!("continuation link {link} leaves the API host"),
                    ));
                }
                None => PageCursor::Exhausted,
            };
        }

        Ok(files)
    }

    async fn fetch_page(
        &self,
        session: &ShareSession,
        node: &FolderNode,
        url: &str,
    ) -> Result<ListingPage, ShareError> {
        let headers = HeaderSet::api()
            .content_type(LISTING_CONTENT_TYPE)
            .authorization(&session.authorization())
            .map_err(|_| ShareError::auth("token contains characters not allowed in a header"))?
            .build();
        // The listing is a read wrapped in a POST, so it may be retried.
        let spec = RequestSpec::post(url)
            .headers(headers)
            .body(multipart_body(&session.embedded_authorization()))
            .idempotent();

        let response = self.http.request(&spec).await?;
        match StatusCode::from_u16(response.status) {
            Ok(status) if status.is_success() => {}
            Ok(StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN) => {
                return Err(ShareError::auth(format!(
                    "listing of '{}' was rejected (HTTP {}); the token may have expired",
                    node.relative_path, response.status
                )));
            }
            _ => {
                return Err(ShareError::enumeration(
                    &node.relative_path,
                    format!("listing answered HTTP {}", response.status),
                ));
            }
        }

        response
            .json::<ListingPage>()
            .map_err(|e| ShareError::enumeration(&node.relative_path, e.to_string()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::share::{BearerToken, parse_redirect};
    use crate::test_support::socket_guard::start_mock_server_or_skip;
    use serde_json::json;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const ROOT_PATH: &str = "/_api/v2.0/drives/drv/items/DRV!1/children";

    fn session() -> ShareSession {
        ShareSession::new(
            parse_redirect("https://1drv.ms/f/s!x", "https://v.example/?redeem=r&id=DRV%211").unwrap(),
            BearerToken {
                auth_scheme: "badger".to_string(),
                token: "abc".to_string(),
            },
        )
    }

    fn enumerator(server: &MockServer) -> FolderEnumerator {
        FolderEnumerator::with_endpoints(
            HttpSession::new().unwrap(),
            ProviderEndpoints::with_base_url(&server.uri()),
        )
    }

    fn file(name: &str, size: u64) -> serde_json::Value {
        json!({"name": name, "size": size, "@content.downloadUrl": format!("https://dl.example/{name}")})
    }

    fn folder(name: &str) -> serde_json::Value {
        json!({"name": name, "size": 0, "folder": {"childCount": 1}})
    }

    async fn mount_listing(server: &MockServer, listing_path: &str, body: serde_json::Value) {
        Mock::given(method("POST"))
            .and(path(listing_path))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(server)
            .await;
    }

    fn names(files: &[FileEntry]) -> Vec<&str> {
        files.iter().map(|f| f.name.as_str()).collect()
    }

    #[tokio::test]
    async fn test_subfolder_files_spliced_at_folder_position() {
        let Some(server) = start_mock_server_or_skip().await else {
            return;
        };
        mount_listing(
            &server,
            ROOT_PATH,
            json!({"value": [file("a", 1), folder("Sub"), file("c", 3)]}),
        )
        .await;
        mount_listing(
            &server,
            "/_api/v2.0/drives/drv/items/DRV!1/Sub/children",
            json!({"value": [file("b", 2), folder("Deep")]}),
        )
        .await;
        mount_listing(
            &server,
            "/_api/v2.0/drives/drv/items/DRV!1/Sub/Deep/children",
            json!({"value": [file("b2", 4)]}),
        )
        .await;

        let files = enumerator(&server)
            .enumerate(&session(), "DRV!1", 0, &CancelFlag::new())
            .await
            .unwrap();
        assert_eq!(names(&files), ["a", "b", "b2", "c"]);
        assert_eq!(files[2].raw_url, "https://dl.example/b2");
    }

    #[tokio::test]
    async fn test_listing_request_shape() {
        let Some(server) = start_mock_server_or_skip().await else {
            return;
        };
        Mock::given(method("POST"))
            .and(path(ROOT_PATH))
            .and(header("content-type", LISTING_CONTENT_TYPE))
            .and(header("authorization", "Badger abc"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"value": []})))
            .expect(1)
            .mount(&server)
            .await;

        let files = enumerator(&server)
            .enumerate(&session(), "DRV!1", 0, &CancelFlag::new())
            .await
            .unwrap();
        assert!(files.is_empty());
    }

    #[tokio::test]
    async fn test_follows_continuation_pages() {
        let Some(server) = start_mock_server_or_skip().await else {
            return;
        };
        mount_listing(
            &server,
            ROOT_PATH,
            json!({
                "value": [file("p1", 1)],
                "@odata.nextLink": format!("{}/next/page2", server.uri())
            }),
        )
        .await;
        mount_listing(&server, "/next/page2", json!({"value": [file("p2", 1)]})).await;

        let files = enumerator(&server)
            .enumerate(&session(), "DRV!1", 0, &CancelFlag::new())
            .await
            .unwrap();
        assert_eq!(names(&files), ["p1", "p2"]);
    }

    #[tokio::test]
    async fn test_continuation_off_api_host_is_rejected() {
        let Some(server) = start_mock_server_or_skip().await else {
            return;
        };
        mount_listing(
            &server,
            ROOT_PATH,
            json!({"value": [], "@odata.nextLink": "https://elsewhere.example/page2"}),
        )
        .await;

        let error = enumerator(&server)
            .enumerate(&session(), "DRV!1", 0, &CancelFlag::new())
            .await
            .unwrap_err();
        assert!(matches!(error, ShareError::Enumeration { .. }), "{error:?}");
    }

    #[tokio::test]
    async fn test_missing_value_aborts_run() {
        let Some(server) = start_mock_server_or_skip().await else {
            return;
        };
        mount_listing(&server, ROOT_PATH, json!({"error": {"code": "itemNotFound"}})).await;

        let error = enumerator(&server)
            .enumerate(&session(), "DRV!1", 0, &CancelFlag::new())
            .await
            .unwrap_err();
        match error {
            ShareError::Enumeration { path, reason } => {
                assert_eq!(path, "DRV!1");
                assert!(reason.contains("value"), "{reason}");
            }
            other => panic!("expected Enumeration, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_malformed_nested_listing_aborts_whole_run() {
        let Some(server) = start_mock_server_or_skip().await else {
            return;
        };
        mount_listing(
            &server,
            ROOT_PATH,
            json!({"value": [file("a", 1), folder("Sub"), file("c", 3)]}),
        )
        .await;
        mount_listing(
            &server,
            "/_api/v2.0/drives/drv/items/DRV!1/Sub/children",
            json!({"items": [file("b", 2)]}),
        )
        .await;
        let dir = tempfile::TempDir::new().unwrap();
        let cache = LinkCache::new(dir.path());

        let error = enumerator(&server)
            .enumerate_into(&session(), &cache, &CancelFlag::new())
            .await
            .unwrap_err();
        match error {
            ShareError::Enumeration { path, .. } => assert_eq!(path, "DRV!1/Sub"),
            other => panic!("expected Enumeration, got {other:?}"),
        }
        assert!(matches!(
            cache.read(),
            Err(crate::cache::CacheError::Missing { .. })
        ));
    }

    #[tokio::test]
    async fn test_same_tree_enumerates_identically_twice() {
        let Some(server) = start_mock_server_or_skip().await else {
            return;
        };
        mount_listing(
            &server,
            ROOT_PATH,
            json!({"value": [folder("Sub"), file("a", 1), file("z", 26)]}),
        )
        .await;
        mount_listing(
            &server,
            "/_api/v2.0/drives/drv/items/DRV!1/Sub/children",
            json!({"value": [file("m", 13), file("b", 2)]}),
        )
        .await;

        let enumerator = enumerator(&server);
        let first = enumerator
            .enumerate(&session(), "DRV!1", 0, &CancelFlag::new())
            .await
            .unwrap();
        let second = enumerator
            .enumerate(&session(), "DRV!1", 0, &CancelFlag::new())
            .await
            .unwrap();
        assert_eq!(names(&first), ["m", "b", "a", "z"]);
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_unauthorized_listing_is_auth_error() {
        let Some(server) = start_mock_server_or_skip().await else {
            return;
        };
        Mock::given(method("POST"))
            .and(path(ROOT_PATH))
            .respond_with(ResponseTemplate::new(401))
            .expect(1)
            .mount(&server)
            .await;

        let error = enumerator(&server)
            .enumerate(&session(), "DRV!1", 0, &CancelFlag::new())
            .await
            .unwrap_err();
        assert!(matches!(error, ShareError::Auth { .. }), "{error:?}");
    }

    #[tokio::test]
    async fn test_cancelled_before_first_page_sends_nothing() {
        let Some(server) = start_mock_server_or_skip().await else {
            return;
        };
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"value": []})))
            .expect(0)
            .mount(&server)
            .await;

        let cancel = CancelFlag::new();
        cancel.cancel();
        let error = enumerator(&server)
            .enumerate(&session(), "DRV!1", 0, &cancel)
            .await
            .unwrap_err();
        assert!(matches!(error, ShareError::Cancelled { files_found: 0 }));
    }

    #[tokio::test]
    async fn test_enumerate_into_persists_result() {
        let Some(server) = start_mock_server_or_skip().await else {
            return;
        };
        mount_listing(&server, ROOT_PATH, json!({"value": [file("only", 9)]})).await;
        let dir = tempfile::TempDir::new().unwrap();
        let cache = LinkCache::new(dir.path());

        let result = enumerator(&server)
            .enumerate_into(&session(), &cache, &CancelFlag::new())
            .await
            .unwrap();
        assert_eq!(result.len(), 1);
        assert_eq!(cache.read().unwrap(), result);
    }

    #[tokio::test]
    async fn test_enumerate_share_fails_fast_when_cache_busy() {
        let Some(server) = start_mock_server_or_skip().await else {
            return;
        };
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;
        let dir = tempfile::TempDir::new().unwrap();
        let cache = LinkCache::new(dir.path());
        let _held = cache.lock().unwrap();

        let error = enumerator(&server)
            .enumerate_share(&format!("{}/f/s!x", server.uri()), &cache, &CancelFlag::new())
            .await
            .unwrap_err();
        assert!(
            matches!(error, ShareError::Cache(crate::cache::CacheError::Busy { .. })),
            "{error:?}"
        );
    }
}
