use crate::database::models::EnrichmentMetadata;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
#[error("enrichment unavailable: {message}")]
pub struct EnrichmentUnavailable {
    pub message: String,
}

/// External AI enrichment service. Produces descriptive listing metadata for
/// a set of crop artifacts. Treated as optional: during reprocessing a
/// failure is logged and the record is cached without metadata.
pub trait Enricher: Send + Sync {
    fn enrich(&self, artifact_paths: &[PathBuf]) -> Result<EnrichmentMetadata, EnrichmentUnavailable>;
}
