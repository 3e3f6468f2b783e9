// crates/signet-server/src/s3_store.rs
// ============================================================================
// Module: Signet S3 Document Store
// Description: S3-backed object store for documents and signed artifacts.
// Purpose: Persist document bytes durably with presigned read access.
// Dependencies: signet-core, aws-sdk-s3, tokio
// ============================================================================

//! ## Overview
//! S3-backed implementation of the document object store. Source documents,
//! synthesized forms, and signed artifacts are stored as opaque objects;
//! signers and administrators retrieve them through presigned URLs rather
//! than through the server. Reads are size-bounded and storage is treated as
//! untrusted: missing objects and backend failures map to closed errors.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use aws_config::BehaviorVersion;
use aws_config::Region;
use aws_sdk_s3::Client;
use aws_sdk_s3::presigning::PresigningConfig;
use aws_sdk_s3::primitives::ByteStream;
use signet_core::DocumentKey;
use signet_core::ObjectMetadata;
use signet_core::ObjectStore;
use signet_core::ObjectStoreError;
use signet_core::PresignedUrl;
use tokio::io::AsyncReadExt;
use tokio::runtime::Handle;
use tokio::runtime::Runtime;
use tokio::runtime::RuntimeFlavor;

use crate::config::ObjectStoreConfig;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Maximum accepted object size in bytes.
const MAX_OBJECT_BYTES: usize = 50 * 1024 * 1024;

// ============================================================================
// SECTION: Runtime Helpers
// ============================================================================

/// Blocks on an object-store future using a compatible runtime.
fn block_on_with_runtime<F, T>(runtime: &Runtime, future: F) -> Result<T, ObjectStoreError>
where
    F: Future<Output = Result<T, ObjectStoreError>> + Send + 'static,
    T: Send + 'static,
{
    if let Ok(handle) = Handle::try_current() {
        if matches!(handle.runtime_flavor(), RuntimeFlavor::MultiThread) {
            return tokio::task::block_in_place(|| handle.block_on(future));
        }
        let (tx, rx) = std::sync::mpsc::sync_channel(1);
        std::thread::spawn(move || {
            let result = Runtime::new()
                .map_err(|err| ObjectStoreError::Io(err.to_string()))
                .and_then(|runtime| runtime.block_on(future));
            let _ = tx.send(result);
        });
        return rx.recv().unwrap_or_else(|_| {
            Err(ObjectStoreError::Io("object store thread join failed".to_string()))
        });
    }

    runtime.block_on(future)
}

// ============================================================================
// SECTION: S3 Document Store
// ============================================================================

/// S3-backed document store.
pub struct S3DocumentStore {
    /// Underlying S3 client.
    client: Client,
    /// Bucket name.
    bucket: String,
    /// Prefix for object keys.
    prefix: String,
    /// Tokio runtime for blocking S3 operations.
    runtime: Option<Arc<Runtime>>,
}

impl Drop for S3DocumentStore {
    fn drop(&mut self) {
        if let Some(runtime) = self.runtime.take() {
            let _ = std::thread::spawn(move || drop(runtime));
        }
    }
}

impl S3DocumentStore {
    /// Builds a new S3-backed document store.
    ///
    /// # Errors
    ///
    /// Returns [`ObjectStoreError`] when configuration or client
    /// initialization fails.
    pub fn new(config: &ObjectStoreConfig) -> Result<Self, ObjectStoreError> {
        config.validate().map_err(|err| ObjectStoreError::Invalid(err.to_string()))?;
        let prefix = normalize_prefix(config.prefix.as_deref().unwrap_or(""));
        let runtime = Runtime::new().map_err(|err| ObjectStoreError::Io(err.to_string()))?;
        let region = config.region.clone();
        let endpoint = config.endpoint.clone();
        let shared_config = block_on_with_runtime(&runtime, async {
            let mut loader = aws_config::defaults(BehaviorVersion::latest());
            if let Some(region) = region {
                loader = loader.region(Region::new(region));
            }
            if let Some(endpoint) = endpoint {
                loader = loader.endpoint_url(endpoint);
            }
            Ok(loader.load().await)
        })?;
        let mut s3_builder = aws_sdk_s3::config::Builder::from(&shared_config);
        if config.force_path_style {
            s3_builder = s3_builder.force_path_style(true);
        }
        let client = Client::from_conf(s3_builder.build());
        Ok(Self {
            client,
            bucket: config.bucket.clone(),
            prefix,
            runtime: Some(Arc::new(runtime)),
        })
    }

    /// Applies the configured prefix to a key.
    fn prefixed_key(&self, key: &DocumentKey) -> String {
        if self.prefix.is_empty() {
            key.to_string()
        } else {
            format!("{}{key}", self.prefix)
        }
    }

    /// Returns the runtime or an error if shut down.
    fn runtime(&self) -> Result<&Runtime, ObjectStoreError> {
        self.runtime
            .as_ref()
            .map(AsRef::as_ref)
            .ok_or_else(|| ObjectStoreError::Io("object store runtime closed".to_string()))
    }
}

impl ObjectStore for S3DocumentStore {
    fn get(&self, key: &DocumentKey) -> Result<Vec<u8>, ObjectStoreError> {
        let bucket = self.bucket.clone();
        let object_key = self.prefixed_key(key);
        let display_key = key.to_string();
        let client = self.client.clone();
        block_on_with_runtime(self.runtime()?, async move {
            let output = client
                .get_object()
                .bucket(bucket)
                .key(object_key)
                .send()
                .await
                .map_err(|err| {
                    let service = err.into_service_error();
                    if service.is_no_such_key() {
                        ObjectStoreError::NotFound(display_key.clone())
                    } else {
                        ObjectStoreError::Backend(service.to_string())
                    }
                })?;
            if let Some(length) = output.content_length() {
                let actual = usize::try_from(length).unwrap_or(usize::MAX);
                if actual > MAX_OBJECT_BYTES {
                    return Err(ObjectStoreError::Invalid(format!(
                        "object too large: {display_key}"
                    )));
                }
            }
            let mut reader = output.body.into_async_read();
            let mut buffer = Vec::new();
            let mut total = 0usize;
            let mut chunk = [0u8; 8192];
            loop {
                let read = reader
                    .read(&mut chunk)
                    .await
                    .map_err(|err| ObjectStoreError::Io(err.to_string()))?;
                if read == 0 {
                    break;
                }
                total = total
                    .checked_add(read)
                    .ok_or_else(|| ObjectStoreError::Io("object size overflow".to_string()))?;
                if total > MAX_OBJECT_BYTES {
                    return Err(ObjectStoreError::Invalid(format!(
                        "object too large: {display_key}"
                    )));
                }
                buffer.extend_from_slice(&chunk[.. read]);
            }
            Ok(buffer)
        })
    }

    fn put(
        &self,
        bytes: Vec<u8>,
        metadata: ObjectMetadata,
    ) -> Result<DocumentKey, ObjectStoreError> {
        if bytes.len() > MAX_OBJECT_BYTES {
            return Err(ObjectStoreError::Invalid(format!("object too large: {}", metadata.key)));
        }
        let bucket = self.bucket.clone();
        let object_key = self.prefixed_key(&metadata.key);
        let client = self.client.clone();
        let stored_key = metadata.key.clone();
        let content_type = metadata.content_type.clone();
        let tagging = encode_tags(&metadata.tags);
        block_on_with_runtime(self.runtime()?, async move {
            let body = ByteStream::from(bytes);
            let mut request = client
                .put_object()
                .bucket(bucket)
                .key(object_key)
                .content_type(content_type)
                .body(body);
            if let Some(tagging) = tagging {
                request = request.tagging(tagging);
            }
            request.send().await.map_err(|err| ObjectStoreError::Backend(err.to_string()))?;
            Ok(stored_key)
        })
    }

    fn presign(&self, key: &DocumentKey, ttl_secs: u64) -> Result<PresignedUrl, ObjectStoreError> {
        let bucket = self.bucket.clone();
        let object_key = self.prefixed_key(key);
        let client = self.client.clone();
        block_on_with_runtime(self.runtime()?, async move {
            let presigning = PresigningConfig::expires_in(Duration::from_secs(ttl_secs))
                .map_err(|err| ObjectStoreError::Invalid(err.to_string()))?;
            let presigned = client
                .get_object()
                .bucket(bucket)
                .key(object_key)
                .presigned(presigning)
                .await
                .map_err(|err| ObjectStoreError::Backend(err.to_string()))?;
            Ok(PresignedUrl::new(presigned.uri().to_string()))
        })
    }
}

// ============================================================================
// SECTION: Key and Tag Helpers
// ============================================================================

/// Normalizes a key prefix to end with a single slash, or empty.
fn normalize_prefix(prefix: &str) -> String {
    let trimmed = prefix.trim_matches('/');
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("{trimmed}/")
    }
}

/// Encodes object tags into the S3 tagging query format.
fn encode_tags(tags: &BTreeMap<String, String>) -> Option<String> {
    if tags.is_empty() {
        return None;
    }
    let encoded: Vec<String> =
        tags.iter().map(|(key, value)| format!("{key}={value}")).collect();
    Some(encoded.join("&"))
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    #![allow(
        clippy::panic,
        clippy::print_stdout,
        clippy::print_stderr,
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::use_debug,
        clippy::dbg_macro,
        clippy::panic_in_result_fn,
        clippy::unwrap_in_result,
        reason = "Test-only assertions and helpers are permitted."
    )]

    use super::*;

    #[test]
    fn prefix_normalization() {
        assert_eq!(normalize_prefix(""), "");
        assert_eq!(normalize_prefix("/"), "");
        assert_eq!(normalize_prefix("docs"), "docs/");
        assert_eq!(normalize_prefix("/docs/"), "docs/");
    }

    #[test]
    fn tag_encoding() {
        assert_eq!(encode_tags(&BTreeMap::new()), None);
        let tags = BTreeMap::from([
            ("template_id".to_string(), "tpl-1".to_string()),
            ("token".to_string(), "tok-1".to_string()),
        ]);
        assert_eq!(encode_tags(&tags).as_deref(), Some("template_id=tpl-1&token=tok-1"));
    }
}
