//! In-process object store for tests and local development.

use async_trait::async_trait;
use bytes::Bytes;
use dashmap::DashMap;

use super::{ObjectStore, ObjectStoreError, object_key};

#[derive(Debug)]
pub struct MemoryObjectStore {
    base_url: String,
    objects: DashMap<String, (Bytes, Option<String>)>,
}

impl MemoryObjectStore {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            objects: DashMap::new(),
        }
    }

    /// Look up a stored object by the URL `put` returned
    pub fn get(&self, url: &str) -> Option<Bytes> {
        let key = url.strip_prefix(&self.base_url)?.trim_start_matches('/');
        self.objects.get(key).map(|entry| entry.0.clone())
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    async fn put(&self, bytes: Bytes, file_name: &str, content_type: Option<&str>) -> Result<String, ObjectStoreError> {
        let key = object_key(file_name, content_type);
        self.objects
            .insert(key.clone(), (bytes, content_type.map(str::to_string)));
        Ok(format!("{}/{}", self.base_url, key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_put_then_get() {
        let store = MemoryObjectStore::new("http://objects.local/bucket/");
        let url = store.put(Bytes::from_static(b"jpeg"), "a.jpg", Some("image/jpeg")).await.unwrap();
        assert!(url.starts_with("http://objects.local/bucket/"));
        assert!(url.ends_with(".jpg"));
        assert_eq!(store.get(&url).unwrap(), Bytes::from_static(b"jpeg"));
        assert_eq!(store.len(), 1);
    }
}
