//! # Object Storage
//!
//! Uploaded photos and guide documents are written to an object store and
//! referenced everywhere else by their public URL. Keys are a fresh UUID plus
//! the original file extension, so concurrent uploads never collide.

#[cfg(test)]
pub mod memory;
pub mod remote;
pub mod s3;

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;
use uuid::Uuid;

#[cfg(test)]
pub use memory::MemoryObjectStore;
pub use remote::{fetch_remote, remote_client};
pub use s3::S3ObjectStore;

#[derive(Error, Debug)]
pub enum ObjectStoreError {
    /// A remote file could not be downloaded for upload-by-link
    #[error("Could not fetch {link}: {reason}")]
    Fetch { link: String, reason: String },

    #[error(transparent)]
    Backend(#[from] anyhow::Error),
}

#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Store `bytes` under a new key and return the public URL
    async fn put(&self, bytes: Bytes, file_name: &str, content_type: Option<&str>) -> Result<String, ObjectStoreError>;
}

/// Build a collision-free key that keeps the original extension
pub fn object_key(file_name: &str, content_type: Option<&str>) -> String {
    format!("{}.{}", Uuid::new_v4(), extension(file_name, content_type))
}

fn extension(file_name: &str, content_type: Option<&str>) -> String {
    let from_name = file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .filter(|ext| !ext.is_empty() && ext.len() <= 8 && ext.chars().all(|c| c.is_ascii_alphanumeric()));

    if let Some(ext) = from_name {
        return ext;
    }

    let from_type = match content_type.map(|ct| ct.split(';').next().unwrap_or("").trim()) {
        Some("image/jpeg") => "jpg",
        Some("image/png") => "png",
        Some("image/gif") => "gif",
        Some("image/webp") => "webp",
        Some("application/pdf") => "pdf",
        _ => "bin",
    };
    from_type.to_string()
}
