// crates/signet-core/src/runtime/lifecycle.rs
// ============================================================================
// Module: Signet Sign-Link Lifecycle Engine
// Description: Issuance, session resolution, and guarded submission.
// Purpose: Execute the sign-link state machine with exactly-once completion.
// Dependencies: crate::{core, interfaces}, serde, thiserror
// ============================================================================

//! ## Overview
//! The lifecycle engine is the single canonical execution path for sign
//! links. All API surfaces must call into these methods to preserve the
//! state-machine invariants: expiry is re-derived on every read, completion
//! is guarded by a store-side precondition, and the link record plus its
//! by-template index are always written in one atomic transaction.
//!
//! The engine holds no mutable in-process state; correctness across
//! concurrent callers rests entirely on the metadata store's transactional
//! guarantees. Hosts supply the current instant on every call; the engine
//! never reads wall-clock time.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::collections::BTreeSet;

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

use crate::core::AuditId;
use crate::core::AuditRecord;
use crate::core::DAY_MILLIS;
use crate::core::DocumentKey;
use crate::core::DocumentRecord;
use crate::core::FieldDef;
use crate::core::FieldGeometryError;
use crate::core::FieldId;
use crate::core::FilledValue;
use crate::core::SignLink;
use crate::core::SignLinkStatus;
use crate::core::SignToken;
use crate::core::Template;
use crate::core::TemplateId;
use crate::core::Timestamp;
use crate::core::ValidationError;
use crate::core::validate_filled_values;
use crate::interfaces::EntityKey;
use crate::interfaces::FieldRecord;
use crate::interfaces::FormEngine;
use crate::interfaces::FormEngineError;
use crate::interfaces::MetadataRecord;
use crate::interfaces::MetadataStore;
use crate::interfaces::MetadataStoreError;
use crate::interfaces::Mutation;
use crate::interfaces::ObjectMetadata;
use crate::interfaces::ObjectStore;
use crate::interfaces::ObjectStoreError;
use crate::interfaces::Precondition;
use crate::interfaces::PresignedUrl;
use crate::interfaces::SORT_FIELD_PREFIX;
use crate::interfaces::SignLinkIndexRecord;
use crate::interfaces::TemplateMeta;
use crate::interfaces::TokenGenerator;
use crate::interfaces::WriteOp;

// ============================================================================
// SECTION: Lifecycle Configuration
// ============================================================================

/// Configuration for the sign-link lifecycle engine.
///
/// # Invariants
/// - Passed in at construction; the engine never reads configuration
///   ad hoc mid-operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LifecycleConfig {
    /// Default link lifetime in milliseconds when issuance omits an expiry.
    pub default_link_ttl_millis: i64,
    /// Length of generated sign tokens.
    pub token_length: usize,
    /// Length of generated template/document/audit identifiers.
    pub id_length: usize,
    /// TTL in seconds for the source-document URL in a signing session.
    pub session_url_ttl_secs: u64,
    /// TTL in seconds for the signed-artifact URL after submission.
    pub artifact_url_ttl_secs: u64,
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            default_link_ttl_millis: 7 * DAY_MILLIS,
            token_length: 21,
            id_length: 21,
            session_url_ttl_secs: 3_600,
            artifact_url_ttl_secs: 86_400,
        }
    }
}

// ============================================================================
// SECTION: Requests and Results
// ============================================================================

/// Request to issue a new sign link.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueRequest {
    /// Template the link will sign.
    pub template_id: TemplateId,
    /// Optional signer email recorded on the link.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signer_email: Option<String>,
    /// Optional explicit expiry; defaults to issuance time plus the
    /// configured lifetime.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<Timestamp>,
}

/// Request to create a new template from a registered document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateTemplateRequest {
    /// Human-readable template name.
    pub name: String,
    /// Key of the registered source document.
    pub source_document: DocumentKey,
    /// Ordered field definitions to place on the document.
    pub fields: Vec<FieldDef>,
}

/// Presentable signing session resolved for an active link.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SigningSession {
    /// Template with its ordered field definitions.
    pub template: Template,
    /// Time-limited URL of the source document for rendering.
    pub document_url: PresignedUrl,
    /// Link expiry instant.
    pub expires_at: Timestamp,
}

/// Transport-level submitter attribution recorded in the audit trail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmitterInfo {
    /// Network address reported by the transport.
    pub address: String,
    /// User-agent string reported by the transport.
    pub agent: String,
}

/// Result of a successful submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionResult {
    /// Time-limited URL of the signed artifact.
    pub artifact_url: PresignedUrl,
    /// Identifier of the audit record created for this submission.
    pub audit_id: AuditId,
    /// Page count of the signed artifact.
    pub page_count: u32,
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Lifecycle engine errors.
///
/// # Invariants
/// - Variants are stable for programmatic handling and map one-to-one onto
///   the caller-visible error taxonomy: gone/not-found classes carry no
///   retry value, caller-input classes carry enough detail to correct the
///   input, and `Unavailable` is safely retryable because no terminal state
///   mutation precedes the guarded completion write.
#[derive(Debug, Error)]
pub enum LifecycleError {
    /// Template does not exist (issuance and template lookups).
    #[error("template not found: {0}")]
    TemplateNotFound(TemplateId),
    /// Link, template, or document referenced by an operation is absent.
    #[error("not found: {0}")]
    NotFound(String),
    /// Link is past its expiry instant.
    #[error("sign link has expired")]
    Expired,
    /// Link was already consumed by a successful submission.
    #[error("sign link has already been used")]
    AlreadyUsed,
    /// Required fields have no submitted value.
    #[error("missing required fields: {missing:?}")]
    MissingRequiredFields {
        /// Sorted identifiers of the unfilled required fields.
        missing: Vec<FieldId>,
    },
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
    /// A field definition failed geometry validation.
    #[error(transparent)]
    Geometry(#[from] FieldGeometryError),
    /// Two field definitions share one identifier.
    #[error("duplicate field id: {0}")]
    DuplicateField(FieldId),
    /// Transient collaborator failure; safe to retry.
    #[error("unavailable: {0}")]
    Unavailable(String),
}

impl From<ValidationError> for LifecycleError {
    fn from(error: ValidationError) -> Self {
        match error {
            ValidationError::MissingRequiredFields {
                missing,
            } => Self::MissingRequiredFields {
                missing,
            },
        }
    }
}

impl From<FormEngineError> for LifecycleError {
    fn from(error: FormEngineError) -> Self {
        match error {
            FormEngineError::InvalidDocument(reason) => Self::InvalidDocument(reason),
            FormEngineError::PageLimitExceeded {
                pages,
                max,
            } => Self::PageLimitExceeded {
                pages,
                max,
            },
            FormEngineError::Engine(reason) => Self::Unavailable(reason),
        }
    }
}

impl From<MetadataStoreError> for LifecycleError {
    fn from(error: MetadataStoreError) -> Self {
        match error {
            // The loser of a guarded completion write observes the
            // precondition failure as a consumed link.
            MetadataStoreError::PreconditionFailed {
                ..
            } => Self::AlreadyUsed,
            other => Self::Unavailable(other.to_string()),
        }
    }
}

impl From<ObjectStoreError> for LifecycleError {
    fn from(error: ObjectStoreError) -> Self {
        match error {
            ObjectStoreError::NotFound(key) => Self::NotFound(format!("document absent: {key}")),
            other => Self::Unavailable(other.to_string()),
        }
    }
}

// ============================================================================
// SECTION: Lifecycle Engine
// ============================================================================

/// Sign-link lifecycle engine over abstract collaborators.
pub struct SignLinkLifecycle<S, O, G, F> {
    /// Metadata store implementation.
    store: S,
    /// Object store implementation.
    objects: O,
    /// Identifier generator implementation.
    tokens: G,
    /// Document form engine implementation.
    forms: F,
    /// Engine configuration.
    config: LifecycleConfig,
}

impl<S, O, G, F> SignLinkLifecycle<S, O, G, F>
where
    S: MetadataStore,
    O: ObjectStore,
    G: TokenGenerator,
    F: FormEngine,
{
    /// Creates a new lifecycle engine.
    #[must_use]
    pub const fn new(store: S, objects: O, tokens: G, forms: F, config: LifecycleConfig) -> Self {
        Self {
            store,
            objects,
            tokens,
            forms,
            config,
        }
    }

    /// Returns the engine configuration.
    #[must_use]
    pub const fn config(&self) -> &LifecycleConfig {
        &self.config
    }

    /// Registers an uploaded document: validates it, stores the bytes, and
    /// records its metadata.
    ///
    /// # Errors
    ///
    /// Returns [`LifecycleError::InvalidDocument`] or
    /// [`LifecycleError::PageLimitExceeded`] for rejected bytes, and
    /// [`LifecycleError::Unavailable`] on collaborator failure.
    pub fn register_document(
        &self,
        filename: &str,
        content_type: &str,
        bytes: Vec<u8>,
        now: Timestamp,
    ) -> Result<DocumentRecord, LifecycleError> {
        let page_count = self.forms.inspect(&bytes)?;
        let key = DocumentKey::new(format!("{}.pdf", self.tokens.generate(self.config.id_length)));
        let stored_key = self.objects.put(
            bytes,
            ObjectMetadata {
                key: key.clone(),
                content_type: content_type.to_string(),
                tags: BTreeMap::new(),
            },
        )?;
        let record = DocumentRecord {
            key: stored_key,
            filename: filename.to_string(),
            content_type: content_type.to_string(),
            page_count,
            uploaded_at: now,
        };
        self.store.put(MetadataRecord::Document(record.clone()))?;
        Ok(record)
    }

    /// Creates a template: validates field definitions, synthesizes the
    /// interactive form document, and writes template metadata plus field
    /// records atomically.
    ///
    /// # Errors
    ///
    /// Returns [`LifecycleError::NotFound`] when the source document is not
    /// registered, geometry/duplicate errors for invalid field definitions,
    /// and document errors from form synthesis.
    pub fn create_template(
        &self,
        request: CreateTemplateRequest,
        now: Timestamp,
    ) -> Result<Template, LifecycleError> {
        let mut seen: BTreeSet<&FieldId> = BTreeSet::new();
        for field in &request.fields {
            field.validate_geometry()?;
            if !seen.insert(&field.id) {
                return Err(LifecycleError::DuplicateField(field.id.clone()));
            }
        }

        let source = self.load_document_record(&request.source_document)?;
        let source_bytes = self.objects.get(&source.key)?;
        let form_bytes = self.forms.synthesize_fields(&source_bytes, &request.fields)?;

        let template_id = TemplateId::new(self.tokens.generate(self.config.id_length));
        let form_key = DocumentKey::new(format!("{template_id}-form.pdf"));
        let form_key = self.objects.put(
            form_bytes,
            ObjectMetadata {
                key: form_key,
                content_type: "application/pdf".to_string(),
                tags: BTreeMap::from([("template_id".to_string(), template_id.to_string())]),
            },
        )?;

        let meta = TemplateMeta {
            template_id: template_id.clone(),
            name: request.name.clone(),
            source_document: source.key.clone(),
            form_document: form_key,
            created_at: now,
        };
        let mut ops = vec![WriteOp::Put(MetadataRecord::Template(meta))];
        for (ordinal, field) in request.fields.iter().enumerate() {
            ops.push(WriteOp::Put(MetadataRecord::TemplateField(FieldRecord {
                template_id: template_id.clone(),
                ordinal: ordinal_u32(ordinal),
                field: field.clone(),
            })));
        }
        self.store.transact(ops)?;

        Ok(Template {
            template_id,
            name: request.name,
            source_document: source.key,
            created_at: now,
            fields: request.fields,
        })
    }

    /// Loads a template with its ordered field definitions.
    ///
    /// # Errors
    ///
    /// Returns [`LifecycleError::TemplateNotFound`] when the template does
    /// not exist.
    pub fn get_template(&self, template_id: &TemplateId) -> Result<Template, LifecycleError> {
        let meta = self.load_template_meta(template_id)?;
        let fields = self.load_template_fields(template_id)?;
        Ok(Template {
            template_id: meta.template_id,
            name: meta.name,
            source_document: meta.source_document,
            created_at: meta.created_at,
            fields,
        })
    }

    /// Issues a new sign link against a template.
    ///
    /// Writes the link record and its by-template index entry in one atomic
    /// transaction; a partially-issued link is never observable.
    ///
    /// # Errors
    ///
    /// Returns [`LifecycleError::TemplateNotFound`] when the template does
    /// not exist and [`LifecycleError::Unavailable`] on store failure.
    pub fn issue(&self, request: IssueRequest, now: Timestamp) -> Result<SignLink, LifecycleError> {
        let meta = self.load_template_meta(&request.template_id)?;
        let token = SignToken::new(self.tokens.generate(self.config.token_length));
        let expires_at = request
            .expires_at
            .unwrap_or_else(|| now.saturating_add_millis(self.config.default_link_ttl_millis));
        let link = SignLink {
            token: token.clone(),
            template_id: meta.template_id.clone(),
            signer_email: request.signer_email,
            status: SignLinkStatus::Active,
            created_at: now,
            expires_at,
            completed_at: None,
        };
        let index = SignLinkIndexRecord {
            template_id: meta.template_id,
            token,
            status: SignLinkStatus::Active,
            created_at: now,
            expires_at,
        };
        self.store.transact(vec![
            WriteOp::Put(MetadataRecord::SignLink(link.clone())),
            WriteOp::Put(MetadataRecord::SignLinkIndex(index)),
        ])?;
        Ok(link)
    }

    /// Loads a sign link for administrative inspection, with its effective
    /// status derived from expiry.
    ///
    /// Unlike the signer-facing operations this never rejects expired or
    /// completed links; callers get the record with expiry already applied
    /// to the presented status.
    ///
    /// # Errors
    ///
    /// Returns [`LifecycleError::NotFound`] when no link exists for the
    /// token and [`LifecycleError::Unavailable`] on store failure.
    pub fn get_link(&self, token: &SignToken, now: Timestamp) -> Result<SignLink, LifecycleError> {
        let record = self.store.get(&EntityKey::sign_link(token))?;
        let Some(MetadataRecord::SignLink(mut link)) = record else {
            return Err(LifecycleError::NotFound("sign link not found".to_string()));
        };
        if link.status == SignLinkStatus::Active && link.is_expired(now) {
            link.status = SignLinkStatus::Expired;
        }
        Ok(link)
    }

    /// Issues a time-limited retrieval URL for a registered document.
    ///
    /// # Errors
    ///
    /// Returns [`LifecycleError::NotFound`] when the key is not registered
    /// and collaborator errors otherwise.
    pub fn document_url(&self, key: &DocumentKey) -> Result<PresignedUrl, LifecycleError> {
        self.load_document_record(key)?;
        Ok(self.objects.presign(key, self.config.session_url_ttl_secs)?)
    }

    /// Issues a time-limited retrieval URL for a signed artifact.
    ///
    /// Artifacts carry no metadata record; the key itself, returned from a
    /// successful submission's audit trail, is the handle.
    ///
    /// # Errors
    ///
    /// Returns [`LifecycleError::NotFound`] when the backend reports the
    /// object absent and collaborator errors otherwise.
    pub fn artifact_url(&self, key: &DocumentKey) -> Result<PresignedUrl, LifecycleError> {
        Ok(self.objects.presign(key, self.config.artifact_url_ttl_secs)?)
    }

    /// Resolves a presentable signing session for an active link.
    ///
    /// # Errors
    ///
    /// Returns [`LifecycleError::NotFound`], [`LifecycleError::Expired`], or
    /// [`LifecycleError::AlreadyUsed`] per the state preconditions, and
    /// collaborator errors otherwise.
    pub fn fetch_session(
        &self,
        token: &SignToken,
        now: Timestamp,
    ) -> Result<SigningSession, LifecycleError> {
        let link = self.load_active_link(token, now)?;
        let template = self.get_template(&link.template_id).map_err(not_found_for_session)?;
        let source = self.load_document_record(&template.source_document)?;
        let document_url = self.objects.presign(&source.key, self.config.session_url_ttl_secs)?;
        Ok(SigningSession {
            template,
            document_url,
            expires_at: link.expires_at,
        })
    }

    /// Validates and applies a submission, producing the signed artifact and
    /// audit record and consuming the link.
    ///
    /// State preconditions are re-validated here even when the caller already
    /// fetched a session; link state may have changed in between. The
    /// completion transaction is guarded on the stored status still being
    /// `active`, so exactly one concurrent submission can ever succeed for a
    /// token; the loser fails with [`LifecycleError::AlreadyUsed`].
    ///
    /// # Errors
    ///
    /// Returns the state precondition errors of
    /// [`SignLinkLifecycle::fetch_session`],
    /// [`LifecycleError::MissingRequiredFields`] without mutating any state,
    /// and document/collaborator errors otherwise.
    pub fn submit(
        &self,
        token: &SignToken,
        values: &[FilledValue],
        submitter: &SubmitterInfo,
        now: Timestamp,
    ) -> Result<SubmissionResult, LifecycleError> {
        let link = self.load_active_link(token, now)?;
        let meta = self.load_template_meta(&link.template_id).map_err(not_found_for_session)?;
        let fields = self.load_template_fields(&link.template_id)?;
        validate_filled_values(&fields, values)?;

        let form_bytes = self.objects.get(&meta.form_document)?;
        let output = self.forms.fill_and_flatten(&form_bytes, values)?;

        // Fresh key per attempt: the artifact write is idempotent across
        // retries while the completion write below is not.
        let artifact_key =
            DocumentKey::new(format!("{token}-signed-{}.pdf", now.as_unix_millis()));
        let artifact_key = self.objects.put(
            output.bytes,
            ObjectMetadata {
                key: artifact_key,
                content_type: "application/pdf".to_string(),
                tags: BTreeMap::from([
                    ("template_id".to_string(), meta.template_id.to_string()),
                    ("token".to_string(), token.to_string()),
                    ("signed_at".to_string(), now.to_string()),
                ]),
            },
        )?;

        let audit = AuditRecord {
            audit_id: AuditId::new(self.tokens.generate(self.config.id_length)),
            template_id: meta.template_id.clone(),
            token: token.clone(),
            submitter_address: submitter.address.clone(),
            submitter_agent: submitter.agent.clone(),
            started_at: now,
            completed_at: now,
            artifact: artifact_key.clone(),
        };
        let audit_id = audit.audit_id.clone();

        self.store.transact(vec![
            WriteOp::Put(MetadataRecord::Audit(audit)),
            WriteOp::Update {
                key: EntityKey::sign_link(token),
                mutation: Mutation::CompleteLink {
                    completed_at: now,
                },
                precondition: Some(Precondition::LinkStatusIs {
                    status: SignLinkStatus::Active,
                }),
            },
            WriteOp::Update {
                key: EntityKey::sign_link_index(&meta.template_id, token),
                mutation: Mutation::CompleteLink {
                    completed_at: now,
                },
                precondition: None,
            },
        ])?;

        let artifact_url =
            self.objects.presign(&artifact_key, self.config.artifact_url_ttl_secs)?;
        Ok(SubmissionResult {
            artifact_url,
            audit_id,
            page_count: output.page_count,
        })
    }

    // ------------------------------------------------------------------
    // Internal loads
    // ------------------------------------------------------------------

    /// Loads a sign link and enforces the three state preconditions.
    ///
    /// Expiry is evaluated first and from `expires_at`, never from the
    /// stored status alone: expiry dominates.
    fn load_active_link(
        &self,
        token: &SignToken,
        now: Timestamp,
    ) -> Result<SignLink, LifecycleError> {
        let record = self.store.get(&EntityKey::sign_link(token))?;
        let Some(MetadataRecord::SignLink(link)) = record else {
            return Err(LifecycleError::NotFound("sign link not found".to_string()));
        };
        if link.is_expired(now) || link.status == SignLinkStatus::Expired {
            return Err(LifecycleError::Expired);
        }
        if link.status == SignLinkStatus::Completed {
            return Err(LifecycleError::AlreadyUsed);
        }
        Ok(link)
    }

    /// Loads template metadata or fails with `TemplateNotFound`.
    fn load_template_meta(
        &self,
        template_id: &TemplateId,
    ) -> Result<TemplateMeta, LifecycleError> {
        let record = self.store.get(&EntityKey::template(template_id))?;
        match record {
            Some(MetadataRecord::Template(meta)) => Ok(meta),
            _ => Err(LifecycleError::TemplateNotFound(template_id.clone())),
        }
    }

    /// Loads a template's field definitions in authoring order.
    fn load_template_fields(
        &self,
        template_id: &TemplateId,
    ) -> Result<Vec<FieldDef>, LifecycleError> {
        let records = self
            .store
            .query_prefix(&format!("TEMPLATE#{template_id}"), SORT_FIELD_PREFIX)?;
        let mut fields = Vec::with_capacity(records.len());
        for record in records {
            if let MetadataRecord::TemplateField(field_record) = record {
                fields.push(field_record.field);
            }
        }
        Ok(fields)
    }

    /// Loads a stored document record or fails with `NotFound`.
    fn load_document_record(&self, key: &DocumentKey) -> Result<DocumentRecord, LifecycleError> {
        let record = self.store.get(&EntityKey::document(key))?;
        match record {
            Some(MetadataRecord::Document(document)) => Ok(document),
            _ => Err(LifecycleError::NotFound(format!("document not registered: {key}"))),
        }
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Converts a vector index to a stored ordinal.
fn ordinal_u32(index: usize) -> u32 {
    u32::try_from(index).unwrap_or(u32::MAX)
}

/// Collapses template lookup failures inside a session into the generic
/// gone/not-found class expected by signer-facing callers.
fn not_found_for_session(error: LifecycleError) -> LifecycleError {
    match error {
        LifecycleError::TemplateNotFound(id) => {
            LifecycleError::NotFound(format!("template not found: {id}"))
        }
        other => other,
    }
}
