use crate::config::DriveConfig;
use crate::error::AppError;
use crate::models::drive_types::{FileListResponse, RemoteFile};
use crate::services::drive::auth;
use crate::services::storage::RemoteSource;
use futures::StreamExt;
use log::{debug, info};

const API_BASE: &str = "https://www.googleapis.com/drive/v3";

/// One page of results; pagination past the first page is not performed.
pub const PAGE_SIZE: usize = 10;

/// Google Drive v3 client. Authenticates once at construction and holds the
/// bearer token for its lifetime.
pub struct DriveClient {
    http: reqwest::Client,
    token: String,
}

impl DriveClient {
    pub async fn connect(config: &DriveConfig) -> Result<Self, AppError> {
        let http = reqwest::Client::new();
        let key = auth::load_key(&config.credential_path)?;
        let token = auth::fetch_access_token(&http, &key, &config.scopes).await?;
        info!("Authenticated to Drive as {}", key.client_email);
        Ok(Self { http, token })
    }
}

fn cap_page(mut files: Vec<RemoteFile>) -> Vec<RemoteFile> {
    files.truncate(PAGE_SIZE);
    files
}

impl RemoteSource for DriveClient {
    async fn list_folder(&self, folder_id: &str) -> Result<Vec<RemoteFile>, AppError> {
        let query = format!("'{}' in parents", folder_id);
        let page_size = PAGE_SIZE.to_string();

        let response = self
            .http
            .get(format!("{}/files", API_BASE))
            .bearer_auth(&self.token)
            .query(&[
                ("q", query.as_str()),
                ("pageSize", page_size.as_str()),
                ("fields", "files(id, name)"),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(AppError::Network(format!(
                "Failed to list folder {}: HTTP {}",
                folder_id,
                response.status()
            )));
        }

        let listing: FileListResponse = response.json().await?;
        debug!("Folder {} listed {} files", folder_id, listing.files.len());
        Ok(cap_page(listing.files))
    }

    async fn download(&self, file_id: &str) -> Result<Vec<u8>, AppError> {
        let response = self
            .http
            .get(format!("{}/files/{}", API_BASE, file_id))
            .bearer_auth(&self.token)
            .query(&[("alt", "media")])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(AppError::Network(format!(
                "Failed to download file {}: HTTP {}",
                file_id,
                response.status()
            )));
        }

        let mut buf = Vec::with_capacity(response.content_length().unwrap_or(0) as usize);
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            buf.extend_from_slice(&chunk);
        }

        debug!("Downloaded file {} ({} bytes)", file_id, buf.len());
        Ok(buf)
    }
}
