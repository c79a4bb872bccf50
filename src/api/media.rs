use serde::Deserialize;

use crate::cache::credential_cache::CredentialCache;
use crate::client::DingTalkClient;
use crate::error::Result;
use crate::transport::request::{StandardRequest, UploadFile};
use crate::transport::response::{Envelope, MediaDownload, OapiEnvelope, ResponseContract};

/// Form field the platform expects the file under
pub const MEDIA_FIELD: &str = "media";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Image,
    Voice,
    File,
}

impl MediaKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaKind::Image => "image",
            MediaKind::Voice => "voice",
            MediaKind::File => "file",
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct MediaUploaded {
    #[serde(flatten)]
    pub envelope: OapiEnvelope,
    #[serde(rename = "type")]
    pub kind: String,
    pub media_id: String,
    pub created_at: i64,
}

impl ResponseContract for MediaUploaded {
    fn envelope(&self) -> &dyn Envelope {
        &self.envelope
    }
}

impl<C: CredentialCache> DingTalkClient<C> {
    /// Uploads one file as multipart `media` and returns the platform metadata
    pub async fn upload_media(&self, kind: MediaKind, file_name: &str, content: Vec<u8>) -> Result<MediaUploaded> {
        self.refresh_access_token().await?;
        let request = StandardRequest::new("media/upload")
            .param("type", kind.as_str())
            .upload(UploadFile::new(MEDIA_FIELD, file_name).with_source(content));
        let mut data = MediaUploaded::default();
        self.dispatch(request, &mut data).await?;
        Ok(data)
    }

    /// Streams a media file into memory
    pub async fn download_media(&self, media_id: &str) -> Result<Vec<u8>> {
        self.refresh_access_token().await?;
        let mut data = MediaDownload::default();
        let request = StandardRequest::new("media/downloadFile").param("media_id", media_id);
        self.dispatch(request, &mut data).await?;
        Ok(data.content)
    }
}
