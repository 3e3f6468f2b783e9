// crates/signet-core/src/runtime/store.rs
// ============================================================================
// Module: Signet In-Memory Stores
// Description: In-memory metadata store, object store, and token generator.
// Purpose: Host-free backends for tests and single-process deployments.
// Dependencies: crate::{core, interfaces}, std
// ============================================================================

//! ## Overview
//! These implementations back the lifecycle engine without external
//! infrastructure. The metadata store keeps records in a `BTreeMap` behind a
//! single mutex, which makes [`MetadataStore::transact`] trivially atomic:
//! preconditions are checked and mutations staged while the lock is held, and
//! nothing is committed unless every operation can be applied. The object
//! store and token generator mirror the same pattern for opaque bytes and
//! deterministic identifiers.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::MutexGuard;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;

use crate::core::DocumentKey;
use crate::core::SignLinkStatus;
use crate::interfaces::EntityKey;
use crate::interfaces::MetadataRecord;
use crate::interfaces::MetadataStore;
use crate::interfaces::MetadataStoreError;
use crate::interfaces::Mutation;
use crate::interfaces::ObjectMetadata;
use crate::interfaces::ObjectStore;
use crate::interfaces::ObjectStoreError;
use crate::interfaces::Precondition;
use crate::interfaces::PresignedUrl;
use crate::interfaces::TokenGenerator;
use crate::interfaces::WriteOp;

// ============================================================================
// SECTION: In-Memory Metadata Store
// ============================================================================

/// In-memory metadata store over a mutex-guarded ordered map.
///
/// # Invariants
/// - All reads and writes serialize on one mutex, so every transaction is
///   atomic and isolated.
/// - Clones share the same underlying map.
#[derive(Debug, Clone, Default)]
pub struct InMemoryMetadataStore {
    /// Records keyed by (partition, sort).
    records: Arc<Mutex<BTreeMap<EntityKey, MetadataRecord>>>,
}

impl InMemoryMetadataStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquires the record map, mapping lock poisoning to an error.
    fn lock(
        &self,
    ) -> Result<MutexGuard<'_, BTreeMap<EntityKey, MetadataRecord>>, MetadataStoreError> {
        self.records
            .lock()
            .map_err(|_| MetadataStoreError::Unavailable("metadata store lock poisoned".to_string()))
    }
}

impl MetadataStore for InMemoryMetadataStore {
    fn get(&self, key: &EntityKey) -> Result<Option<MetadataRecord>, MetadataStoreError> {
        let records = self.lock()?;
        Ok(records.get(key).cloned())
    }

    fn put(&self, record: MetadataRecord) -> Result<(), MetadataStoreError> {
        let mut records = self.lock()?;
        records.insert(record.key(), record);
        Ok(())
    }

    fn query_prefix(
        &self,
        partition: &str,
        sort_prefix: &str,
    ) -> Result<Vec<MetadataRecord>, MetadataStoreError> {
        let records = self.lock()?;
        // BTreeMap iteration is already sort-key ordered within a partition.
        Ok(records
            .iter()
            .filter(|(key, _)| key.partition == partition && key.sort.starts_with(sort_prefix))
            .map(|(_, record)| record.clone())
            .collect())
    }

    fn transact(&self, ops: Vec<WriteOp>) -> Result<(), MetadataStoreError> {
        let mut records = self.lock()?;
        // Stage every operation before committing any of them.
        let mut staged: Vec<(EntityKey, MetadataRecord)> = Vec::with_capacity(ops.len());
        for op in ops {
            match op {
                WriteOp::Put(record) => {
                    staged.push((record.key(), record));
                }
                WriteOp::Update {
                    key,
                    mutation,
                    precondition,
                } => {
                    let current = records.get(&key).ok_or_else(|| {
                        MetadataStoreError::Invalid(format!(
                            "update target absent: {}/{}",
                            key.partition, key.sort
                        ))
                    })?;
                    if let Some(precondition) = precondition {
                        check_precondition(&key, current, precondition)?;
                    }
                    let mutated = apply_mutation(&key, current.clone(), &mutation)?;
                    staged.push((key, mutated));
                }
            }
        }
        for (key, record) in staged {
            records.insert(key, record);
        }
        Ok(())
    }
}

/// Evaluates a write-time precondition against the stored record.
fn check_precondition(
    key: &EntityKey,
    current: &MetadataRecord,
    precondition: Precondition,
) -> Result<(), MetadataStoreError> {
    match precondition {
        Precondition::LinkStatusIs {
            status,
        } => {
            let stored = link_status(key, current)?;
            if stored == status {
                Ok(())
            } else {
                Err(MetadataStoreError::PreconditionFailed {
                    partition: key.partition.clone(),
                    sort: key.sort.clone(),
                })
            }
        }
    }
}

/// Applies a mutation to a stored record, producing the replacement.
fn apply_mutation(
    key: &EntityKey,
    current: MetadataRecord,
    mutation: &Mutation,
) -> Result<MetadataRecord, MetadataStoreError> {
    match mutation {
        Mutation::CompleteLink {
            completed_at,
        } => match current {
            MetadataRecord::SignLink(mut link) => {
                link.status = SignLinkStatus::Completed;
                link.completed_at = Some(*completed_at);
                Ok(MetadataRecord::SignLink(link))
            }
            MetadataRecord::SignLinkIndex(mut index) => {
                index.status = SignLinkStatus::Completed;
                Ok(MetadataRecord::SignLinkIndex(index))
            }
            _ => Err(MetadataStoreError::Invalid(format!(
                "complete_link against non-link record: {}/{}",
                key.partition, key.sort
            ))),
        },
    }
}

/// Reads the lifecycle status from a link-shaped record.
fn link_status(
    key: &EntityKey,
    record: &MetadataRecord,
) -> Result<SignLinkStatus, MetadataStoreError> {
    match record {
        MetadataRecord::SignLink(link) => Ok(link.status),
        MetadataRecord::SignLinkIndex(index) => Ok(index.status),
        _ => Err(MetadataStoreError::Invalid(format!(
            "status precondition against non-link record: {}/{}",
            key.partition, key.sort
        ))),
    }
}

// ============================================================================
// SECTION: In-Memory Object Store
// ============================================================================

/// Stored object payload: bytes plus write-time metadata.
type StoredObject = (Vec<u8>, ObjectMetadata);

/// In-memory object store for document bytes.
///
/// # Invariants
/// - Clones share the same underlying map.
/// - Presigned URLs use the `memory://` scheme and carry no real capability;
///   they exist so callers can exercise the full lifecycle without a backend.
#[derive(Debug, Clone, Default)]
pub struct InMemoryObjectStore {
    /// Stored objects keyed by document key.
    objects: Arc<Mutex<BTreeMap<DocumentKey, StoredObject>>>,
}

impl InMemoryObjectStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquires the object map, mapping lock poisoning to an error.
    fn lock(
        &self,
    ) -> Result<MutexGuard<'_, BTreeMap<DocumentKey, StoredObject>>, ObjectStoreError> {
        self.objects
            .lock()
            .map_err(|_| ObjectStoreError::Io("object store lock poisoned".to_string()))
    }

    /// Returns the number of stored objects.
    ///
    /// # Errors
    ///
    /// Returns [`ObjectStoreError::Io`] when the store lock is poisoned.
    pub fn len(&self) -> Result<usize, ObjectStoreError> {
        Ok(self.lock()?.len())
    }

    /// Reports whether the store holds no objects.
    ///
    /// # Errors
    ///
    /// Returns [`ObjectStoreError::Io`] when the store lock is poisoned.
    pub fn is_empty(&self) -> Result<bool, ObjectStoreError> {
        Ok(self.lock()?.is_empty())
    }
}

impl ObjectStore for InMemoryObjectStore {
    fn get(&self, key: &DocumentKey) -> Result<Vec<u8>, ObjectStoreError> {
        let objects = self.lock()?;
        objects
            .get(key)
            .map(|(bytes, _)| bytes.clone())
            .ok_or_else(|| ObjectStoreError::NotFound(key.to_string()))
    }

    fn put(
        &self,
        bytes: Vec<u8>,
        metadata: ObjectMetadata,
    ) -> Result<DocumentKey, ObjectStoreError> {
        let mut objects = self.lock()?;
        let key = metadata.key.clone();
        objects.insert(key.clone(), (bytes, metadata));
        Ok(key)
    }

    fn presign(&self, key: &DocumentKey, ttl_secs: u64) -> Result<PresignedUrl, ObjectStoreError> {
        let objects = self.lock()?;
        if !objects.contains_key(key) {
            return Err(ObjectStoreError::NotFound(key.to_string()));
        }
        Ok(PresignedUrl::new(format!("memory://{key}?ttl={ttl_secs}")))
    }
}

// ============================================================================
// SECTION: Shared Store Wrappers
// ============================================================================

/// Shared metadata store backed by an `Arc` trait object.
#[derive(Clone)]
pub struct SharedMetadataStore {
    /// Inner store implementation.
    inner: Arc<dyn MetadataStore + Send + Sync>,
}

impl SharedMetadataStore {
    /// Wraps a metadata store in a shared, clonable wrapper.
    #[must_use]
    pub fn from_store(store: impl MetadataStore + Send + Sync + 'static) -> Self {
        Self {
            inner: Arc::new(store),
        }
    }

    /// Wraps an existing shared store.
    #[must_use]
    pub const fn new(store: Arc<dyn MetadataStore + Send + Sync>) -> Self {
        Self {
            inner: store,
        }
    }
}

impl MetadataStore for SharedMetadataStore {
    fn get(&self, key: &EntityKey) -> Result<Option<MetadataRecord>, MetadataStoreError> {
        self.inner.get(key)
    }

    fn put(&self, record: MetadataRecord) -> Result<(), MetadataStoreError> {
        self.inner.put(record)
    }

    fn query_prefix(
        &self,
        partition: &str,
        sort_prefix: &str,
    ) -> Result<Vec<MetadataRecord>, MetadataStoreError> {
        self.inner.query_prefix(partition, sort_prefix)
    }

    fn transact(&self, ops: Vec<WriteOp>) -> Result<(), MetadataStoreError> {
        self.inner.transact(ops)
    }

    fn readiness(&self) -> Result<(), MetadataStoreError> {
        self.inner.readiness()
    }
}

/// Shared object store backed by an `Arc` trait object.
#[derive(Clone)]
pub struct SharedObjectStore {
    /// Inner store implementation.
    inner: Arc<dyn ObjectStore + Send + Sync>,
}

impl SharedObjectStore {
    /// Wraps an object store in a shared, clonable wrapper.
    #[must_use]
    pub fn from_store(store: impl ObjectStore + Send + Sync + 'static) -> Self {
        Self {
            inner: Arc::new(store),
        }
    }

    /// Wraps an existing shared store.
    #[must_use]
    pub const fn new(store: Arc<dyn ObjectStore + Send + Sync>) -> Self {
        Self {
            inner: store,
        }
    }
}

impl ObjectStore for SharedObjectStore {
    fn get(&self, key: &DocumentKey) -> Result<Vec<u8>, ObjectStoreError> {
        self.inner.get(key)
    }

    fn put(
        &self,
        bytes: Vec<u8>,
        metadata: ObjectMetadata,
    ) -> Result<DocumentKey, ObjectStoreError> {
        self.inner.put(bytes, metadata)
    }

    fn presign(&self, key: &DocumentKey, ttl_secs: u64) -> Result<PresignedUrl, ObjectStoreError> {
        self.inner.presign(key, ttl_secs)
    }
}

// ============================================================================
// SECTION: Sequential Token Generator
// ============================================================================

/// Deterministic token generator producing zero-padded counters.
///
/// # Invariants
/// - Outputs are unique per instance and stable across calls with the same
///   history, which keeps test assertions deterministic. Not unguessable;
///   production hosts must supply an entropy-backed generator.
#[derive(Debug, Default)]
pub struct SequentialTokenGenerator {
    /// Monotonic counter.
    counter: AtomicU64,
}

impl SequentialTokenGenerator {
    /// Creates a generator starting at zero.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl TokenGenerator for SequentialTokenGenerator {
    fn generate(&self, length: usize) -> String {
        let next = self.counter.fetch_add(1, Ordering::Relaxed);
        format!("{next:0length$}")
    }
}
