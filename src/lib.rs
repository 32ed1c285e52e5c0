//! Content-addressed processing store for a postcard scan-to-listing
//! workflow: fingerprint every upload, keep one identity per unique content,
//! cache the latest crop/enrichment artifacts per identity, and record every
//! reuse-vs-reprocess decision in an append-only ledger.

pub mod database;
pub mod fingerprint;
pub mod services;

pub use database::models::{
    ActivityAction, ActivityEntry, BoundaryParams, ContentIdentity, ContentKind,
    EnrichmentMetadata, ProcessingRecord, ShapeParams,
};
pub use database::repositories::{
    ActivityFilter, ActivityRepository, ArtifactValidation, IdentityRepository,
    ProcessingRepository,
};
pub use database::{Database, StoreError};
pub use fingerprint::{Fingerprint, FingerprintError, Fingerprinter};
pub use services::coordinator::{
    Coordinator, Decision, ReprocessParams, ResolutionOutcome, ResolutionState, WorkflowError,
};
pub use services::enrichment::{Enricher, EnrichmentUnavailable};
pub use services::extraction::{DetectionFailed, ExtractionOutput, Extractor};
pub use services::publishing::{ListingDraft, ListingRef, PublishError, Publisher};
pub use services::spool::{SpoolError, UploadSpool};
