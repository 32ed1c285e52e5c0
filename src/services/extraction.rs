use crate::database::models::{BoundaryParams, ContentKind, ShapeParams};
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
#[error("detection failed: {message}")]
pub struct DetectionFailed {
    pub message: String,
}

/// What the cropping collaborator produced for one sheet: where the cuts
/// landed, the grid shape, and the crop files it wrote.
#[derive(Debug, Clone)]
pub struct ExtractionOutput {
    pub boundary_params: BoundaryParams,
    pub shape_params: ShapeParams,
    pub artifact_paths: Vec<PathBuf>,
}

/// External grid-detection/cropping service. The algorithm itself lives
/// outside this crate; implementations take the raw sheet bytes and return
/// crop artifacts on disk.
pub trait Extractor: Send + Sync {
    fn extract(&self, image: &[u8], kind: ContentKind) -> Result<ExtractionOutput, DetectionFailed>;
}
