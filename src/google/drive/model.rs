use std::path::Path;

use serde::{Deserialize, Serialize};

pub const GOOGLE_DOCS_MIME_TYPE: &str = "application/vnd.google-apps.document";

/// Local content type and hosted target type for each document extension
/// the builder can produce.
const CONVERSIONS: [(&str, MimeConversion); 1] = [(
    "html",
    MimeConversion {
        source: "text/html",
        target: GOOGLE_DOCS_MIME_TYPE,
    },
)];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MimeConversion {
    pub source: &'static str,
    pub target: &'static str,
}

pub fn conversion_for(path: &Path) -> Option<MimeConversion> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    CONVERSIONS
        .iter()
        .find(|(known, _)| *known == ext)
        .map(|(_, conversion)| *conversion)
}

#[derive(Debug, Clone, PartialEq)]
pub struct UploadRequest {
    pub name: String,
    pub parent_folder_id: String,
    pub conversion: MimeConversion,
    pub content: Vec<u8>,
}

#[derive(Serialize, Debug)]
pub struct FileMetadata<'a> {
    #[serde(rename = "name")]
    pub name: &'a str,
    #[serde(rename = "mimeType")]
    pub mime_type: &'a str,
    #[serde(rename = "parents")]
    pub parents: Vec<&'a str>,
}

#[allow(dead_code)]
#[derive(Deserialize, Debug, Clone)]
pub struct DriveFile {
    #[serde(rename = "id")]
    pub id: String,
    #[serde(rename = "name")]
    pub name: Option<String>,
    #[serde(rename = "mimeType")]
    pub mime_type: Option<String>,
}

#[allow(dead_code)]
#[derive(Deserialize, Debug)]
pub struct FileListResponse {
    #[serde(rename = "nextPageToken")]
    pub next_page_token: Option<String>,
    #[serde(rename = "files", default)]
    pub files: Vec<DriveFile>,
}
