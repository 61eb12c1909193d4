//! Listing request body and response shapes.
//!
//! The provider only serves listings to its web viewer's batching format: a
//! POST whose `multipart/form-data` body carries a single part holding the
//! real request's headers, with `X-HTTP-Method-Override: GET`.

use serde::Deserialize;

use crate::cache::FileEntry;

/// Fixed multipart boundary used by the web viewer.
pub(crate) const MULTIPART_BOUNDARY: &str = "5c872a7a-0906-4ccc-a157-2b003598569f";

pub(crate) const LISTING_CONTENT_TYPE: &str =
    "multipart/form-data;boundary=5c872a7a-0906-4ccc-a157-2b003598569f";

/// Builds the multipart body of a listing request. Lines end in CRLF.
pub(crate) fn multipart_body(embedded_authorization: &str) -> String {
    let lines = [
        format!("--{MULTIPART_BOUNDARY}"),
        "Content-Disposition: form-data;name=data".to_string(),
        "Prefer: HonorNonIndexedQueriesWarningMayFailRandomly, allowthrottleablequeries, Include-Feature=AddToOneDrive;Vault".to_string(),
        "X-ClientService-ClientTag: ODC Web".to_string(),
        "Application: ODC Web".to_string(),
        "Scenario: BrowseFiles".to_string(),
        "ScenarioType: AUO".to_string(),
        "X-HTTP-Method-Override: GET".to_string(),
        "Content-Type: application/json".to_string(),
        format!("Authorization: {embedded_authorization}"),
        String::new(),
        String::new(),
        format!("--{MULTIPART_BOUNDARY}--"),
    ];
    lines.join("\r\n")
}

/// One page of a folder listing.
#[derive(Debug, Deserialize)]
pub(crate) struct ListingPage {
    pub(crate) value: Vec<DriveItem>,
    #[serde(rename = "@odata.nextLink", default)]
    pub(crate) next_link: Option<String>,
}

/// A child item as returned by the listing API. Only the fields the
/// enumerator needs are decoded.
#[derive(Debug, Deserialize)]
pub(crate) struct DriveItem {
    pub(crate) name: String,
    #[serde(default)]
    pub(crate) size: u64,
    #[serde(rename = "@content.downloadUrl", default)]
    pub(crate) download_url: Option<String>,
}

/// A classified child item.
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum ListingItem {
    File(FileEntry),
    Folder { name: String },
}

impl From<DriveItem> for ListingItem {
    /// Items carrying a download URL are files; everything else is treated
    /// as a folder to descend into.
    fn from(item: DriveItem) -> Self {
        match item.download_url {
            Some(raw_url) => Self::File(FileEntry {
                name: item.name,
                size: item.size,
                raw_url,
            }),
            None => Self::Folder { name: item.name },
        }
    }
}
