use async_trait::async_trait;
use reqwest::{header, Client};
use tracing::{debug, info};

use super::model::{DriveFile, FileListResponse, FileMetadata, UploadRequest};
use super::DocumentUploader;

const DRIVE_API_BASE: &str = "https://www.googleapis.com/drive/v3";
const DRIVE_UPLOAD_BASE: &str = "https://www.googleapis.com/upload/drive/v3";
const BOUNDARY: &str = "lessonplan-related-boundary-5f3c9a";

pub struct GoogleDriveClient {
    client: Client,
    access_token: String,
}

impl GoogleDriveClient {
    pub fn new<T: Into<String>>(token: T) -> Self {
        GoogleDriveClient {
            client: Client::new(),
            access_token: token.into(),
        }
    }

    pub async fn list_files(&self) -> anyhow::Result<Vec<DriveFile>> {
        let url = format!("{}/files", DRIVE_API_BASE);
        let mut files = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut query: Vec<(&str, &str)> =
                vec![("fields", "nextPageToken,files(id,name,mimeType)")];
            if let Some(token) = page_token.as_deref() {
                query.push(("pageToken", token));
            }

            debug!(url = %url, page_token = ?page_token, "fetching drive files page");
            let mut page = self
                .client
                .get(&url)
                .bearer_auth(&self.access_token)
                .query(&query)
                .send()
                .await?
                .error_for_status()?
                .json::<FileListResponse>()
                .await?;
            files.append(&mut page.files);

            match page.next_page_token {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }

        info!(count = files.len(), "listed drive files");
        Ok(files)
    }
}

/// Body of a Drive `uploadType=multipart` request: JSON metadata part
/// followed by the media part.
pub fn multipart_related_body(
    boundary: &str,
    metadata: &FileMetadata<'_>,
    content_type: &str,
    content: &[u8],
) -> anyhow::Result<Vec<u8>> {
    let metadata_json = serde_json::to_string(metadata)?;

    let mut body = Vec::with_capacity(content.len() + metadata_json.len() + 256);
    body.extend_from_slice(
        format!(
            "--{boundary}\r\nContent-Type: application/json; charset=UTF-8\r\n\r\n{metadata_json}\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(format!("--{boundary}\r\nContent-Type: {content_type}\r\n\r\n").as_bytes());
    body.extend_from_slice(content);
    body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());

    Ok(body)
}

#[async_trait]
impl DocumentUploader for GoogleDriveClient {
    async fn upload(&self, request: &UploadRequest) -> anyhow::Result<String> {
        let url = format!("{}/files", DRIVE_UPLOAD_BASE);
        let metadata = FileMetadata {
            name: &request.name,
            mime_type: request.conversion.target,
            parents: vec![request.parent_folder_id.as_str()],
        };
        let body = multipart_related_body(
            BOUNDARY,
            &metadata,
            request.conversion.source,
            &request.content,
        )?;

        let created = self
            .client
            .post(&url)
            .bearer_auth(&self.access_token)
            .query(&[("uploadType", "multipart"), ("fields", "id,name,mimeType")])
            .header(
                header::CONTENT_TYPE,
                format!("multipart/related; boundary={}", BOUNDARY),
            )
            .body(body)
            .send()
            .await?
            .error_for_status()?
            .json::<DriveFile>()
            .await?;

        info!(
            name = %request.name,
            folder = %request.parent_folder_id,
            file_id = %created.id,
            "uploaded document"
        );
        Ok(created.id)
    }
}
