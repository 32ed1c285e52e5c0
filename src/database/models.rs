use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Canonical record for one unique piece of uploaded content.
/// Exactly one row exists per distinct fingerprint; the fingerprint is never
/// mutated after creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentIdentity {
    pub id: i64,
    pub fingerprint: String,
    pub source_name: String,
    pub content_kind: ContentKind,
    pub byte_size: i64,
    /// Pixel dimensions when the content could be decoded as an image.
    /// Unknown is `None`, never zero.
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub first_seen_at: String,
    pub last_seen_at: String,
    pub seen_count: i64,
}

/// Latest computed artifacts for one identity. At most one record per
/// identity; reprocessing replaces the record wholesale.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessingRecord {
    pub identity_id: i64,
    pub artifact_paths: Vec<PathBuf>,
    pub boundary_params: BoundaryParams,
    pub shape_params: ShapeParams,
    pub enrichment_metadata: Option<EnrichmentMetadata>,
    pub processed_at: String,
}

/// Cut positions describing how a scanned sheet was partitioned into cards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundaryParams {
    pub horizontal: Vec<u32>,
    pub vertical: Vec<u32>,
}

/// Detected grid shape of a scanned sheet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShapeParams {
    pub rows: u32,
    pub cols: u32,
}

/// Descriptive listing metadata produced by the enrichment collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrichmentMetadata {
    pub title: String,
    pub description: String,
    pub condition: String,
    pub price: f64,
}

/// Immutable audit record. Appended once per meaningful action, never
/// updated or deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityEntry {
    pub id: i64,
    pub session_id: String,
    pub identity_id: i64,
    pub action: ActivityAction,
    pub occurred_at: String,
    pub details: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContentKind {
    Face,
    Verso,
    Generic,
}

impl From<String> for ContentKind {
    fn from(s: String) -> Self {
        match s.as_str() {
            "face" => ContentKind::Face,
            "verso" => ContentKind::Verso,
            _ => ContentKind::Generic,
        }
    }
}

impl From<ContentKind> for String {
    fn from(kind: ContentKind) -> Self {
        match kind {
            ContentKind::Face => "face".to_string(),
            ContentKind::Verso => "verso".to_string(),
            ContentKind::Generic => "generic".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActivityAction {
    Created,
    Reused,
    Reprocessed,
    Enriched,
}

impl From<String> for ActivityAction {
    fn from(s: String) -> Self {
        match s.as_str() {
            "created" => ActivityAction::Created,
            "reused" => ActivityAction::Reused,
            "reprocessed" => ActivityAction::Reprocessed,
            "enriched" => ActivityAction::Enriched,
            _ => ActivityAction::Created,
        }
    }
}

impl From<ActivityAction> for String {
    fn from(action: ActivityAction) -> Self {
        match action {
            ActivityAction::Created => "created".to_string(),
            ActivityAction::Reused => "reused".to_string(),
            ActivityAction::Reprocessed => "reprocessed".to_string(),
            ActivityAction::Enriched => "enriched".to_string(),
        }
    }
}
