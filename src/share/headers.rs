//! Immutable request-header sets for share-provider calls.
//!
//! Every call builds its own [`HeaderSet`] from a fresh base, so headers
//! added for one request (authorization, `Prefer`) never leak into the next.

use reqwest::header::{
    ACCEPT, ACCEPT_LANGUAGE, AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue,
    InvalidHeaderValue, ORIGIN, REFERER,
};

/// Origin the provider's API expects cross-site calls to come from.
pub(crate) const VIEWER_ORIGIN: &str = "https://onedrive.live.com";

const NAVIGATION_ACCEPT: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,image/apng,*/*;q=0.8";
const ACCEPT_LANGUAGE_VALUE: &str = "zh-CN,zh;q=0.9,en;q=0.8";

/// A header set under construction. Each builder method consumes and
/// returns the set.
#[derive(Debug, Clone)]
pub(crate) struct HeaderSet {
    map: HeaderMap,
}

impl HeaderSet {
    /// Headers of a top-level browser navigation, used to follow the share link.
    pub(crate) fn navigation() -> Self {
        let mut map = HeaderMap::new();
        map.insert(ACCEPT, HeaderValue::from_static(NAVIGATION_ACCEPT));
        map.insert(ACCEPT_LANGUAGE, HeaderValue::from_static(ACCEPT_LANGUAGE_VALUE));
        map.insert(
            HeaderName::from_static("upgrade-insecure-requests"),
            HeaderValue::from_static("1"),
        );
        map.insert(
            HeaderName::from_static("sec-fetch-mode"),
            HeaderValue::from_static("navigate"),
        );
        map.insert(
            HeaderName::from_static("sec-fetch-dest"),
            HeaderValue::from_static("iframe"),
        );
        Self { map }
    }

    /// Headers of a cross-site API call made by the web viewer.
    pub(crate) fn api() -> Self {
        let mut map = HeaderMap::new();
        map.insert(ACCEPT, HeaderValue::from_static("*/*"));
        map.insert(ACCEPT_LANGUAGE, HeaderValue::from_static(ACCEPT_LANGUAGE_VALUE));
        map.insert(ORIGIN, HeaderValue::from_static(VIEWER_ORIGIN));
        map.insert(REFERER, HeaderValue::from_static("https://onedrive.live.com/"));
        map.insert(
            HeaderName::from_static("sec-fetch-dest"),
            HeaderValue::from_static("empty"),
        );
        map.insert(
            HeaderName::from_static("sec-fetch-mode"),
            HeaderValue::from_static("cors"),
        );
        map.insert(
            HeaderName::from_static("sec-fetch-site"),
            HeaderValue::from_static("cross-site"),
        );
        Self { map }
    }

    pub(crate) fn content_type(mut self, value: &'static str) -> Self {
        self.map.insert(CONTENT_TYPE, HeaderValue::from_static(value));
        self
    }

    pub(crate) fn prefer(mut self, value: &'static str) -> Self {
        self.map.insert(
            HeaderName::from_static("prefer"),
            HeaderValue::from_static(value),
        );
        self
    }

    /// Sets the `Authorization` header; tokens come from the network, so the
    /// value is checked.
    pub(crate) fn authorization(mut self, value: &str) -> Result<Self, InvalidHeaderValue> {
        let mut value = HeaderValue::from_str(value)?;
        value.set_sensitive(true);
        self.map.insert(AUTHORIZATION, value);
        Ok(self)
    }

    pub(crate) fn build(self) -> HeaderMap {
        self.map
    }
}
