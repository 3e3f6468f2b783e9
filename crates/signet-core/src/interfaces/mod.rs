// crates/signet-core/src/interfaces/mod.rs
// ============================================================================
// Module: Signet Interfaces
// Description: Backend-agnostic interfaces for metadata, objects, and forms.
// Purpose: Define the contract surfaces used by the Signet lifecycle engine.
// Dependencies: crate::core, serde, thiserror
// ============================================================================

//! ## Overview
//! Interfaces define how Signet integrates with external systems without
//! embedding backend-specific details. The metadata store is a two-part-key
//! record store with atomic multi-record writes; the object store holds
//! opaque document bytes; the form engine bakes values into documents. All
//! implementations must fail closed on missing or invalid data.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

use crate::core::AuditRecord;
use crate::core::DocumentKey;
use crate::core::DocumentRecord;
use crate::core::FieldDef;
use crate::core::FieldId;
use crate::core::FilledValue;
use crate::core::SignLink;
use crate::core::SignLinkStatus;
use crate::core::SignToken;
use crate::core::TemplateId;
use crate::core::Timestamp;

// ============================================================================
// SECTION: Entity Keys
// ============================================================================

/// Sort-key literal for singleton metadata records.
pub const SORT_META: &str = "META";
/// Sort-key prefix for template field records.
pub const SORT_FIELD_PREFIX: &str = "FIELD#";
/// Sort-key prefix for sign-link index records.
pub const SORT_LINK_PREFIX: &str = "SIGNLINK#";

/// Two-part key addressing one metadata record.
///
/// # Invariants
/// - `partition` groups records for one entity; `sort` orders records within
///   the partition and supports prefix scans.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityKey {
    /// Partition component.
    pub partition: String,
    /// Sort component.
    pub sort: String,
}

impl EntityKey {
    /// Builds a key from partition and sort components.
    #[must_use]
    pub fn new(partition: impl Into<String>, sort: impl Into<String>) -> Self {
        Self {
            partition: partition.into(),
            sort: sort.into(),
        }
    }

    /// Key of a template metadata record.
    #[must_use]
    pub fn template(template_id: &TemplateId) -> Self {
        Self::new(format!("TEMPLATE#{template_id}"), SORT_META)
    }

    /// Key of one template field record.
    ///
    /// The zero-padded ordinal keeps prefix scans in authoring order.
    #[must_use]
    pub fn template_field(template_id: &TemplateId, ordinal: u32, field_id: &FieldId) -> Self {
        Self::new(
            format!("TEMPLATE#{template_id}"),
            format!("{SORT_FIELD_PREFIX}{ordinal:06}#{field_id}"),
        )
    }

    /// Key of a sign-link primary record.
    #[must_use]
    pub fn sign_link(token: &SignToken) -> Self {
        Self::new(format!("SIGNLINK#{token}"), SORT_META)
    }

    /// Key of the by-template sign-link index record.
    #[must_use]
    pub fn sign_link_index(template_id: &TemplateId, token: &SignToken) -> Self {
        Self::new(format!("TEMPLATE#{template_id}"), format!("{SORT_LINK_PREFIX}{token}"))
    }

    /// Key of an audit record.
    #[must_use]
    pub fn audit(audit_id: &crate::core::AuditId) -> Self {
        Self::new(format!("AUDIT#{audit_id}"), SORT_META)
    }

    /// Key of a stored document metadata record.
    #[must_use]
    pub fn document(key: &DocumentKey) -> Self {
        Self::new(format!("DOCUMENT#{key}"), SORT_META)
    }
}

// ============================================================================
// SECTION: Metadata Records
// ============================================================================

/// Template metadata as stored, without its field records.
///
/// # Invariants
/// - Field definitions live in separate records under the same partition so
///   they can be range-scanned in authoring order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateMeta {
    /// Template identifier.
    pub template_id: TemplateId,
    /// Human-readable template name.
    pub name: String,
    /// Key of the original source document.
    pub source_document: DocumentKey,
    /// Key of the derived interactive-form document used at fill time.
    pub form_document: DocumentKey,
    /// Creation timestamp.
    pub created_at: Timestamp,
}

/// One stored field definition belonging to a template.
///
/// # Invariants
/// - `ordinal` reflects authoring order and is unique within the template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldRecord {
    /// Owning template identifier.
    pub template_id: TemplateId,
    /// Zero-based authoring ordinal.
    pub ordinal: u32,
    /// Field definition payload.
    pub field: FieldDef,
}

/// By-template index mirror of a sign link.
///
/// # Invariants
/// - Written atomically with the primary link record at issuance and at
///   completion; the two must always be observable in the same state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignLinkIndexRecord {
    /// Owning template identifier.
    pub template_id: TemplateId,
    /// Sign token of the mirrored link.
    pub token: SignToken,
    /// Mirrored lifecycle status.
    pub status: SignLinkStatus,
    /// Issuance timestamp.
    pub created_at: Timestamp,
    /// Expiry instant.
    pub expires_at: Timestamp,
}

/// Canonical metadata record union stored by the metadata store.
///
/// # Invariants
/// - Variants are stable for serialization; `key()` is total.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MetadataRecord {
    /// Template metadata record.
    Template(TemplateMeta),
    /// Template field record.
    TemplateField(FieldRecord),
    /// Sign-link primary record.
    SignLink(SignLink),
    /// Sign-link by-template index record.
    SignLinkIndex(SignLinkIndexRecord),
    /// Audit record.
    Audit(AuditRecord),
    /// Stored document metadata record.
    Document(DocumentRecord),
}

impl MetadataRecord {
    /// Returns the entity key under which this record is stored.
    #[must_use]
    pub fn key(&self) -> EntityKey {
        match self {
            Self::Template(meta) => EntityKey::template(&meta.template_id),
            Self::TemplateField(record) => {
                EntityKey::template_field(&record.template_id, record.ordinal, &record.field.id)
            }
            Self::SignLink(link) => EntityKey::sign_link(&link.token),
            Self::SignLinkIndex(index) => {
                EntityKey::sign_link_index(&index.template_id, &index.token)
            }
            Self::Audit(audit) => EntityKey::audit(&audit.audit_id),
            Self::Document(document) => EntityKey::document(&document.key),
        }
    }
}

// ============================================================================
// SECTION: Metadata Store
// ============================================================================

/// Conditional mutation applied by [`WriteOp::Update`].
///
/// # Invariants
/// - Variants are stable; each applies to a specific record shape and fails
///   with [`MetadataStoreError::Invalid`] against any other shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Mutation {
    /// Transition a sign link (primary or index record) to completed.
    CompleteLink {
        /// Completion timestamp recorded on the primary record.
        completed_at: Timestamp,
    },
}

/// Precondition evaluated at write time inside the store.
///
/// # Invariants
/// - Evaluated against the stored record under the same isolation as the
///   mutation; a failed precondition aborts the whole transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Precondition {
    /// The stored link record must currently carry the given status.
    LinkStatusIs {
        /// Expected stored status.
        status: SignLinkStatus,
    },
}

/// One operation inside an atomic metadata write.
#[derive(Debug, Clone, PartialEq)]
pub enum WriteOp {
    /// Unconditional upsert of a full record.
    Put(MetadataRecord),
    /// Conditional in-place mutation of an existing record.
    Update {
        /// Key of the record to mutate.
        key: EntityKey,
        /// Mutation to apply.
        mutation: Mutation,
        /// Optional write-time precondition.
        precondition: Option<Precondition>,
    },
}

/// Metadata store errors.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
/// - `PreconditionFailed` identifies the loser of a guarded concurrent write.
#[derive(Debug, Error)]
pub enum MetadataStoreError {
    /// Store I/O error.
    #[error("metadata store io error: {0}")]
    Io(String),
    /// Store data is corrupted or fails integrity checks.
    #[error("metadata store corruption: {0}")]
    Corrupt(String),
    /// Request or record shape is invalid.
    #[error("metadata store invalid data: {0}")]
    Invalid(String),
    /// A write-time precondition did not hold.
    #[error("metadata store precondition failed for {partition}/{sort}")]
    PreconditionFailed {
        /// Partition of the guarded record.
        partition: String,
        /// Sort key of the guarded record.
        sort: String,
    },
    /// Transient backend failure; safe to retry.
    #[error("metadata store unavailable: {0}")]
    Unavailable(String),
}

/// Two-part-key metadata store with atomic multi-record writes.
///
/// Point lookups and prefix scans mirror a (partition, sort) table;
/// [`MetadataStore::transact`] must apply all operations atomically or none,
/// which keeps a sign link and its by-template index observable in the same
/// state.
pub trait MetadataStore {
    /// Loads one record by key.
    ///
    /// # Errors
    ///
    /// Returns [`MetadataStoreError`] when loading fails.
    fn get(&self, key: &EntityKey) -> Result<Option<MetadataRecord>, MetadataStoreError>;

    /// Upserts one record unconditionally.
    ///
    /// # Errors
    ///
    /// Returns [`MetadataStoreError`] when saving fails.
    fn put(&self, record: MetadataRecord) -> Result<(), MetadataStoreError>;

    /// Scans a partition for records whose sort key starts with `sort_prefix`,
    /// ordered by sort key.
    ///
    /// # Errors
    ///
    /// Returns [`MetadataStoreError`] when scanning fails.
    fn query_prefix(
        &self,
        partition: &str,
        sort_prefix: &str,
    ) -> Result<Vec<MetadataRecord>, MetadataStoreError>;

    /// Applies all operations atomically, or none of them.
    ///
    /// # Errors
    ///
    /// Returns [`MetadataStoreError::PreconditionFailed`] when any guarded
    /// operation's precondition does not hold, and other variants when the
    /// write fails.
    fn transact(&self, ops: Vec<WriteOp>) -> Result<(), MetadataStoreError>;

    /// Reports store readiness for liveness/readiness probes.
    ///
    /// # Errors
    ///
    /// Returns [`MetadataStoreError`] when the store is unavailable.
    fn readiness(&self) -> Result<(), MetadataStoreError> {
        Ok(())
    }
}

// ============================================================================
// SECTION: Object Store
// ============================================================================

/// Metadata attached to a stored object at write time.
///
/// # Invariants
/// - `key` is chosen by the caller and must be fresh for signed artifacts;
///   source objects are never overwritten.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectMetadata {
    /// Object key to store the bytes under.
    pub key: DocumentKey,
    /// Content type of the bytes.
    pub content_type: String,
    /// Opaque tags recorded alongside the object.
    pub tags: BTreeMap<String, String>,
}

/// Time-limited, capability-bearing retrieval URL for one stored object.
///
/// # Invariants
/// - Grants read access only; expires after the requested TTL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PresignedUrl(String);

impl PresignedUrl {
    /// Wraps a presigned URL string.
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self(url.into())
    }

    /// Returns the URL as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Object store errors.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Error)]
pub enum ObjectStoreError {
    /// Object does not exist.
    #[error("object not found: {0}")]
    NotFound(String),
    /// Backend I/O failure.
    #[error("object store io error: {0}")]
    Io(String),
    /// Backend returned an error.
    #[error("object store backend error: {0}")]
    Backend(String),
    /// Request input is invalid.
    #[error("object store invalid input: {0}")]
    Invalid(String),
}

/// Opaque-byte object store with presigned read access.
pub trait ObjectStore {
    /// Reads object bytes by key.
    ///
    /// # Errors
    ///
    /// Returns [`ObjectStoreError::NotFound`] when the object is absent and
    /// other variants when the read fails.
    fn get(&self, key: &DocumentKey) -> Result<Vec<u8>, ObjectStoreError>;

    /// Writes a new object and returns its key.
    ///
    /// # Errors
    ///
    /// Returns [`ObjectStoreError`] when the write fails.
    fn put(&self, bytes: Vec<u8>, metadata: ObjectMetadata)
    -> Result<DocumentKey, ObjectStoreError>;

    /// Issues a time-limited retrieval URL for an object.
    ///
    /// # Errors
    ///
    /// Returns [`ObjectStoreError`] when URL issuance fails.
    fn presign(&self, key: &DocumentKey, ttl_secs: u64) -> Result<PresignedUrl, ObjectStoreError>;
}

// ============================================================================
// SECTION: Token Generator
// ============================================================================

/// Generator of unguessable unique identifier strings.
///
/// Used for sign tokens, template/document/audit identifiers. Uniqueness and
/// entropy are the implementation's responsibility; the lifecycle engine
/// treats outputs as opaque.
pub trait TokenGenerator {
    /// Produces a new identifier string of the given length.
    fn generate(&self, length: usize) -> String;
}

// ============================================================================
// SECTION: Form Engine
// ============================================================================

/// Output of a fill-and-flatten pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlattenOutput {
    /// Flattened document bytes with zero interactive fields remaining.
    pub bytes: Vec<u8>,
    /// Page count of the flattened document.
    pub page_count: u32,
}

/// Form engine errors.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
/// - Per-field synthesis/fill failures never surface here; they are logged
///   and skipped inside the engine.
#[derive(Debug, Error)]
pub enum FormEngineError {
    /// Document bytes are malformed or unreadable.
    #[error("invalid document: {0}")]
    InvalidDocument(String),
    /// Document exceeds the page limit.
    #[error("document has {pages} pages (max {max})")]
    PageLimitExceeded {
        /// Actual page count.
        pages: u32,
        /// Maximum allowed page count.
        max: u32,
    },
    /// Engine reported an internal error.
    #[error("form engine error: {0}")]
    Engine(String),
}

/// Document form engine: field synthesis at authoring time, fill-and-flatten
/// at submission time.
pub trait FormEngine {
    /// Validates document bytes and returns the page count.
    ///
    /// # Errors
    ///
    /// Returns [`FormEngineError::InvalidDocument`] for malformed bytes and
    /// [`FormEngineError::PageLimitExceeded`] past the page limit.
    fn inspect(&self, document: &[u8]) -> Result<u32, FormEngineError>;

    /// Creates one named interactive field per definition on the indicated
    /// pages and returns the editable document.
    ///
    /// Synthesis is best-effort: a field whose creation fails is skipped with
    /// a warning and never aborts the whole document.
    ///
    /// # Errors
    ///
    /// Returns [`FormEngineError`] when the document cannot be loaded or is
    /// over the page limit.
    fn synthesize_fields(
        &self,
        document: &[u8],
        fields: &[FieldDef],
    ) -> Result<Vec<u8>, FormEngineError>;

    /// Sets field display text from the given values, then converts every
    /// interactive field into fixed page content.
    ///
    /// The output is a static document; applying this operation to its own
    /// output with no further values is a no-op. Per-field fill failures are
    /// logged and skipped, never fatal.
    ///
    /// # Errors
    ///
    /// Returns [`FormEngineError`] when the document cannot be loaded or is
    /// over the page limit.
    fn fill_and_flatten(
        &self,
        document: &[u8],
        values: &[FilledValue],
    ) -> Result<FlattenOutput, FormEngineError>;
}
