//! Announcements/articles and presigned object-storage uploads
//!
//! This module contains zero I/O operations and is fully testable with fixture data.

use serde::{Deserialize, Serialize};

// ============================================================================
// Domain Models (Input from API)
// ============================================================================

/// An article from `GET /articles/` or `GET /articles/{id}`
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Announcement {
    pub id: i64,
    #[serde(default)]
    pub create_time: Option<String>,
    #[serde(default)]
    pub update_time: Option<String>,
    #[serde(default)]
    pub delete_time: Option<String>,
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub author_id: Option<i64>,
    #[serde(default)]
    pub cover_image: Option<String>,
    #[serde(default)]
    pub tags: Option<String>,
    #[serde(default)]
    pub views: u64,
    #[serde(default)]
    pub likes: u64,
    #[serde(default)]
    pub comments: u64,
}

/// Signed upload form returned by `POST /auth/oss/generate-presigned-post`
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Default)]
pub struct PresignedPost {
    #[serde(default)]
    pub accessid: String,
    #[serde(default)]
    pub policy: String,
    #[serde(default)]
    pub signature: String,
    #[serde(default)]
    pub dir: String,
    #[serde(default)]
    pub key: String,
    #[serde(default)]
    pub host: String,
    #[serde(default, deserialize_with = "deserialize_expire")]
    pub expire: String,
    #[serde(default, rename = "Content-Type")]
    pub content_type: Option<String>,
}

/// `expire` arrives as either a string or a unix timestamp.
fn deserialize_expire<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::String(s) => s,
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    })
}

// ============================================================================
// Request Bodies (Output to API)
// ============================================================================

/// What an uploaded image is for; decides the storage directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadKind {
    Cover,
    Content,
}

impl UploadKind {
    pub fn upload_dir(self) -> &'static str {
        match self {
            UploadKind::Cover => "article-covers/",
            UploadKind::Content => "article-content-images/",
        }
    }
}

/// Body of `POST /auth/oss/generate-presigned-post`
#[derive(Debug, Serialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PresignRequest {
    pub filename: String,
    pub content_type: String,
    pub upload_dir: String,
}

impl PresignRequest {
    pub fn new(filename: impl Into<String>, content_type: impl Into<String>, kind: UploadKind) -> Self {
        PresignRequest {
            filename: filename.into(),
            content_type: content_type.into(),
            upload_dir: kind.upload_dir().to_string(),
        }
    }
}

/// Body of `POST /articles/new`
#[derive(Debug, Serialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NewArticleRequest {
    pub title: String,
    pub content: String,
    pub cover_image_url: String,
}

// ============================================================================
// Pure Transformation Functions
// ============================================================================

impl PresignedPost {
    /// Reject signatures that are missing a field the upload needs.
    pub fn validate(&self) -> Result<(), String> {
        let missing: Vec<&str> = [
            ("host", &self.host),
            ("key", &self.key),
            ("policy", &self.policy),
            ("accessid", &self.accessid),
            ("signature", &self.signature),
        ]
        .into_iter()
        .filter(|(_, v)| v.trim().is_empty())
        .map(|(k, _)| k)
        .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(format!(
                "Incomplete upload signature, missing: {}",
                missing.join(", ")
            ))
        }
    }

    /// Text fields of the multipart upload, in the order the storage service
    /// expects. The file part goes after all of these.
    pub fn form_fields(&self) -> Vec<(&'static str, String)> {
        let mut fields = vec![
            ("key", self.key.clone()),
            ("policy", self.policy.clone()),
            ("OSSAccessKeyId", self.accessid.clone()),
            ("signature", self.signature.clone()),
        ];
        if let Some(content_type) = self.content_type.as_ref().filter(|c| !c.is_empty()) {
            fields.push(("Content-Type", content_type.clone()));
        }
        fields
    }

    /// Public URL of the uploaded object.
    pub fn object_url(&self) -> String {
        object_url(&self.host, &self.key)
    }
}

/// Join a storage host and object key with exactly one slash.
pub fn object_url(host: &str, key: &str) -> String {
    format!("{}/{}", host.trim_end_matches('/'), key.trim_start_matches('/'))
}

/// Infer MIME type from file extension.
pub fn mime_from_extension(filename: &str) -> &'static str {
    let ext = filename.rsplit('.').next().unwrap_or("").to_lowercase();

    match ext.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "svg" => "image/svg+xml",
        "bmp" => "image/bmp",
        "md" => "text/markdown",
        "txt" => "text/plain",
        _ => "application/octet-stream",
    }
}

pub fn article_path(id: i64) -> String {
    format!("/articles/{id}")
}
