use crate::database::models::ProcessingRecord;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PublishError {
    #[error("listing rejected: {0}")]
    Rejected(String),

    #[error("publisher unreachable: {0}")]
    Unreachable(String),
}

/// Remote listing identifier returned by the marketplace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingRef(pub String);

/// Finished listing payload handed to the marketplace client. This crate
/// only assembles it from a processing record; the wire protocol lives
/// outside.
#[derive(Debug, Clone)]
pub struct ListingDraft {
    pub title: String,
    pub description: String,
    pub condition: String,
    pub price: f64,
    pub image_paths: Vec<PathBuf>,
}

impl ListingDraft {
    /// Build a draft from a cached record. Returns `None` when the record
    /// carries no enrichment metadata; a listing cannot be drafted without it.
    pub fn from_record(record: &ProcessingRecord) -> Option<Self> {
        let metadata = record.enrichment_metadata.as_ref()?;

        Some(Self {
            title: metadata.title.clone(),
            description: metadata.description.clone(),
            condition: metadata.condition.clone(),
            price: metadata.price,
            image_paths: record.artifact_paths.clone(),
        })
    }
}

/// External marketplace publishing client.
pub trait Publisher: Send + Sync {
    fn publish(&self, draft: &ListingDraft) -> Result<ListingRef, PublishError>;
}
