//! Media upload and processing (`/video/...`)
//!
//! The backend does the recognition work. This side only ships the file as
//! multipart and triggers processing by the filename the upload returned.

use reqwest::multipart::{Form, Part};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::or_log;
use crate::client::ApiClient;
use crate::envelope::decode_record;

/// Upload/process response: the stored filename plus preview paths
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MediaResult {
    #[serde(default)]
    pub filename: Option<String>,
    #[serde(default)]
    pub thumbnail: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Image,
    Video,
}

impl MediaKind {
    /// Multipart field name the backend reads
    pub fn field(&self) -> &'static str {
        match self {
            MediaKind::Image => "image",
            MediaKind::Video => "video",
        }
    }

    fn upload_path(&self) -> &'static str {
        match self {
            MediaKind::Image => "/video/upload_image",
            MediaKind::Video => "/video/upload",
        }
    }

    fn process_path(&self, filename: &str) -> String {
        let prefix = match self {
            MediaKind::Image => "/video/process_image",
            MediaKind::Video => "/video/process",
        };
        format!("{}/{}", prefix, urlencoding::encode(filename))
    }
}

#[derive(Clone)]
pub struct VideoService {
    client: ApiClient,
}

impl VideoService {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    pub async fn upload_image(&self, file_name: &str, bytes: Vec<u8>) -> Option<MediaResult> {
        self.upload(MediaKind::Image, file_name, bytes).await
    }

    pub async fn upload_video(&self, file_name: &str, bytes: Vec<u8>) -> Option<MediaResult> {
        self.upload(MediaKind::Video, file_name, bytes).await
    }

    pub async fn process_image(&self, filename: &str) -> Option<MediaResult> {
        self.process(MediaKind::Image, filename).await
    }

    pub async fn process_video(&self, filename: &str) -> Option<MediaResult> {
        self.process(MediaKind::Video, filename).await
    }

    async fn upload(&self, kind: MediaKind, file_name: &str, bytes: Vec<u8>) -> Option<MediaResult> {
        tracing::debug!("Uploading {} ({} bytes) as {}", file_name, bytes.len(), kind.field());
        let part = Part::bytes(bytes).file_name(file_name.to_string());
        let form = Form::new().part(kind.field(), part);
        let result = async {
            let raw = self.client.post_multipart(kind.upload_path(), form).await?;
            decode_record::<MediaResult>(raw, &[])
        }
        .await;
        or_log(result, &format!("upload {}", kind.field()))
    }

    async fn process(&self, kind: MediaKind, filename: &str) -> Option<MediaResult> {
        let result = async {
            let raw = self.client.post_empty(&kind.process_path(filename)).await?;
            decode_record::<MediaResult>(raw, &[])
        }
        .await;
        or_log(result, &format!("process {}", kind.field()))
    }
}
