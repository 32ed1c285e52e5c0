use crate::database::models::{BoundaryParams, EnrichmentMetadata, ProcessingRecord, ShapeParams};
use crate::database::{Database, StoreError};
use chrono::Utc;
use rusqlite::{params, OptionalExtension};
use std::fs::File;
use std::path::PathBuf;

/// Result of re-checking cached artifact paths against the filesystem.
#[derive(Debug, Clone)]
pub struct ArtifactValidation {
    pub all_present: bool,
    pub missing: Vec<PathBuf>,
}

#[derive(Clone)]
pub struct ProcessingRepository {
    db: Database,
}

impl ProcessingRepository {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Store the processing artifacts for `identity_id`, replacing any
    /// existing record wholesale. The `identity_id` primary key guarantees at
    /// most one record per identity survives concurrent writers.
    pub fn upsert(
        &self,
        identity_id: i64,
        artifact_paths: &[PathBuf],
        boundary_params: &BoundaryParams,
        shape_params: &ShapeParams,
        enrichment_metadata: Option<&EnrichmentMetadata>,
    ) -> Result<ProcessingRecord, StoreError> {
        let now = Utc::now().to_rfc3339();
        let paths_json = serde_json::to_string(artifact_paths)?;
        let boundary_json = serde_json::to_string(boundary_params)?;
        let shape_json = serde_json::to_string(shape_params)?;
        let enrichment_json = enrichment_metadata
            .map(serde_json::to_string)
            .transpose()?;

        {
            let conn = self.db.conn()?;

            let known: i64 = conn.query_row(
                "SELECT COUNT(*) FROM identities WHERE id = ?1",
                params![identity_id],
                |row| row.get(0),
            )?;
            if known == 0 {
                return Err(StoreError::UnknownIdentity(identity_id));
            }

            conn.execute(
                "INSERT INTO processing_records
                     (identity_id, artifact_paths, boundary_params, shape_params,
                      enrichment_metadata, processed_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                 ON CONFLICT(identity_id) DO UPDATE SET
                     artifact_paths = excluded.artifact_paths,
                     boundary_params = excluded.boundary_params,
                     shape_params = excluded.shape_params,
                     enrichment_metadata = excluded.enrichment_metadata,
                     processed_at = excluded.processed_at",
                params![
                    identity_id,
                    paths_json,
                    boundary_json,
                    shape_json,
                    enrichment_json,
                    now,
                ],
            )?;
        }

        self.find(identity_id)?
            .ok_or(StoreError::UnknownIdentity(identity_id))
    }

    pub fn find(&self, identity_id: i64) -> Result<Option<ProcessingRecord>, StoreError> {
        let conn = self.db.conn()?;

        let raw = conn
            .query_row(
                "SELECT identity_id, artifact_paths, boundary_params, shape_params,
                        enrichment_metadata, processed_at
                 FROM processing_records WHERE identity_id = ?1",
                params![identity_id],
                |row| {
                    Ok((
                        row.get::<_, i64>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, String>(3)?,
                        row.get::<_, Option<String>>(4)?,
                        row.get::<_, String>(5)?,
                    ))
                },
            )
            .optional()?;

        let Some((id, paths, boundary, shape, enrichment, processed_at)) = raw else {
            return Ok(None);
        };

        Ok(Some(ProcessingRecord {
            identity_id: id,
            artifact_paths: serde_json::from_str(&paths)?,
            boundary_params: serde_json::from_str(&boundary)?,
            shape_params: serde_json::from_str(&shape)?,
            enrichment_metadata: enrichment
                .map(|json| serde_json::from_str(&json))
                .transpose()?,
            processed_at,
        }))
    }

    /// Re-check that every cached artifact still exists and is readable.
    /// Artifacts may be deleted out-of-band between caching and reuse, so
    /// this is evaluated at use time, never assumed from the cache alone.
    pub fn validate_artifacts(&self, record: &ProcessingRecord) -> ArtifactValidation {
        let missing: Vec<PathBuf> = record
            .artifact_paths
            .iter()
            .filter(|path| File::open(path).is_err())
            .cloned()
            .collect();

        ArtifactValidation {
            all_present: missing.is_empty(),
            missing,
        }
    }
}
