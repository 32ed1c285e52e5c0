use crate::database::models::{
    ActivityAction, ActivityEntry, ContentIdentity, ContentKind, ProcessingRecord,
};
use crate::database::repositories::{
    ActivityFilter, ActivityRepository, IdentityRepository, ProcessingRepository,
};
use crate::database::{Database, StoreError};
use crate::fingerprint::{Fingerprint, Fingerprinter};
use crate::services::enrichment::{Enricher, EnrichmentUnavailable};
use crate::services::extraction::{DetectionFailed, Extractor};
use crate::services::spool::{SpoolError, UploadSpool};
use image::GenericImageView;
use log::{debug, info, warn};
use serde_json::json;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Detection(#[from] DetectionFailed),

    #[error(transparent)]
    Enrichment(#[from] EnrichmentUnavailable),

    #[error(transparent)]
    Spool(#[from] SpoolError),

    #[error("no cached record to reuse for identity {0}")]
    NothingToReuse(i64),

    #[error("cached artifacts missing for identity {identity_id}: {missing:?}")]
    StaleArtifacts {
        identity_id: i64,
        missing: Vec<PathBuf>,
    },
}

/// Where a submitted upload landed in the resolution flow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolutionState {
    /// Nothing cached for this content; the caller must process fresh.
    NoPriorWork,
    /// A cached record exists and all its artifacts are still present.
    ReuseCandidate,
    /// A cached record exists but artifacts were deleted out-of-band.
    /// Reuse is unavailable; the caller must reprocess.
    CacheInvalid { missing: Vec<PathBuf> },
}

#[derive(Debug, Clone)]
pub struct ResolutionOutcome {
    pub state: ResolutionState,
    pub identity: ContentIdentity,
    pub created: bool,
    pub cached_record: Option<ProcessingRecord>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    UseExisting,
    ProcessAnyway,
}

/// Optional overrides for a `ProcessAnyway` resolution.
#[derive(Debug, Clone, Default)]
pub struct ReprocessParams {
    /// Extract with this kind instead of the one recorded at first sight.
    pub content_kind: Option<ContentKind>,
}

/// Orchestrates the per-upload decision flow: fingerprint, identity lookup,
/// cache check, and the caller's reuse-vs-reprocess decision, recording each
/// resolved action in the ledger.
///
/// All authoritative state lives in the backing store; the coordinator holds
/// no cross-call mutable state, so sessions may invoke it concurrently.
pub struct Coordinator {
    identities: IdentityRepository,
    processing: ProcessingRepository,
    activity: ActivityRepository,
    fingerprinter: Fingerprinter,
    spool: UploadSpool,
    extractor: Box<dyn Extractor>,
    enricher: Box<dyn Enricher>,
}

impl Coordinator {
    pub fn new(
        db: Database,
        spool: UploadSpool,
        extractor: Box<dyn Extractor>,
        enricher: Box<dyn Enricher>,
    ) -> Self {
        Self {
            identities: IdentityRepository::new(db.clone()),
            processing: ProcessingRepository::new(db.clone()),
            activity: ActivityRepository::new(db),
            fingerprinter: Fingerprinter::new(),
            spool,
            extractor,
            enricher,
        }
    }

    /// Take a raw upload and report whether prior work can be reused.
    ///
    /// A brand-new fingerprint creates the identity, logs `created`, and
    /// lands in [`ResolutionState::NoPriorWork`]. A known fingerprint bumps
    /// the identity's seen count and is classified by the state of its
    /// cached record. Losing a concurrent creation race is not an error:
    /// the loser simply observes an existing identity.
    pub fn submit(
        &self,
        bytes: &[u8],
        session_id: &str,
        content_kind: ContentKind,
        source_name: &str,
    ) -> Result<ResolutionOutcome, WorkflowError> {
        let fingerprint = self.fingerprinter.fingerprint_bytes(bytes);
        let dimensions = probe_dimensions(bytes);
        self.spool.store(&fingerprint, bytes)?;

        let (identity, created) = self.identities.get_or_create(
            fingerprint.as_str(),
            source_name,
            content_kind,
            bytes.len() as i64,
            dimensions,
        )?;

        if created {
            info!("new content {} from {}", fingerprint, source_name);
            self.activity.append(
                session_id,
                identity.id,
                ActivityAction::Created,
                Some(json!({
                    "fingerprint": fingerprint.as_str(),
                    "source_name": source_name,
                })),
            )?;
            return Ok(ResolutionOutcome {
                state: ResolutionState::NoPriorWork,
                identity,
                created,
                cached_record: None,
            });
        }

        debug!(
            "repeat upload of {} (seen {} times)",
            fingerprint, identity.seen_count
        );

        let Some(record) = self.processing.find(identity.id)? else {
            // Identity exists but was never processed (for example an
            // abandoned earlier session). Valid state, not corruption.
            return Ok(ResolutionOutcome {
                state: ResolutionState::NoPriorWork,
                identity,
                created,
                cached_record: None,
            });
        };

        let validation = self.processing.validate_artifacts(&record);
        let state = if validation.all_present {
            ResolutionState::ReuseCandidate
        } else {
            warn!(
                "cached artifacts missing for identity {}: {:?}",
                identity.id, validation.missing
            );
            ResolutionState::CacheInvalid {
                missing: validation.missing,
            }
        };

        Ok(ResolutionOutcome {
            state,
            identity,
            created,
            cached_record: Some(record),
        })
    }

    /// Apply the caller's decision for an identified upload.
    ///
    /// `UseExisting` re-validates the cached artifacts at use time and logs a
    /// `reused` entry; it fails rather than silently serving stale data.
    /// `ProcessAnyway` runs the external collaborators and replaces the
    /// cached record, logging `reprocessed`. A prior record stays
    /// authoritative until the new upsert fully succeeds.
    pub fn resolve(
        &self,
        identity_id: i64,
        session_id: &str,
        decision: Decision,
        params: ReprocessParams,
    ) -> Result<ProcessingRecord, WorkflowError> {
        match decision {
            Decision::UseExisting => {
                let record = self
                    .processing
                    .find(identity_id)?
                    .ok_or(WorkflowError::NothingToReuse(identity_id))?;

                let validation = self.processing.validate_artifacts(&record);
                if !validation.all_present {
                    return Err(WorkflowError::StaleArtifacts {
                        identity_id,
                        missing: validation.missing,
                    });
                }

                self.activity.append(
                    session_id,
                    identity_id,
                    ActivityAction::Reused,
                    Some(json!({ "artifact_paths": display_paths(&record.artifact_paths) })),
                )?;
                debug!("reused {} artifacts for identity {}", record.artifact_paths.len(), identity_id);
                Ok(record)
            }

            Decision::ProcessAnyway => {
                let identity = self
                    .identities
                    .find_by_id(identity_id)?
                    .ok_or(StoreError::UnknownIdentity(identity_id))?;

                let bytes = self.spool.read(&Fingerprint(identity.fingerprint.clone()))?;
                let kind = params.content_kind.unwrap_or(identity.content_kind);

                // A detection failure aborts here; any prior cached record
                // is left untouched.
                let output = self.extractor.extract(&bytes, kind)?;

                let enrichment = match self.enricher.enrich(&output.artifact_paths) {
                    Ok(metadata) => Some(metadata),
                    Err(e) => {
                        warn!("enrichment unavailable for identity {}: {}", identity_id, e);
                        None
                    }
                };

                let record = self.processing.upsert(
                    identity_id,
                    &output.artifact_paths,
                    &output.boundary_params,
                    &output.shape_params,
                    enrichment.as_ref(),
                )?;

                self.activity.append(
                    session_id,
                    identity_id,
                    ActivityAction::Reprocessed,
                    Some(json!({
                        "artifact_count": record.artifact_paths.len(),
                        "enriched": record.enrichment_metadata.is_some(),
                    })),
                )?;
                info!(
                    "reprocessed identity {} into {} artifacts",
                    identity_id,
                    record.artifact_paths.len()
                );
                Ok(record)
            }
        }
    }

    /// Re-run enrichment over an already-cached record, keeping its crop
    /// artifacts and boundaries. Unlike during reprocessing, a failure here
    /// is surfaced: the caller asked for enrichment explicitly.
    pub fn enrich_existing(
        &self,
        identity_id: i64,
        session_id: &str,
    ) -> Result<ProcessingRecord, WorkflowError> {
        let record = self
            .processing
            .find(identity_id)?
            .ok_or(WorkflowError::NothingToReuse(identity_id))?;

        let metadata = self.enricher.enrich(&record.artifact_paths)?;

        let updated = self.processing.upsert(
            identity_id,
            &record.artifact_paths,
            &record.boundary_params,
            &record.shape_params,
            Some(&metadata),
        )?;

        self.activity.append(
            session_id,
            identity_id,
            ActivityAction::Enriched,
            Some(json!({ "title": metadata.title })),
        )?;
        Ok(updated)
    }

    pub fn history(&self, filter: &ActivityFilter) -> Result<Vec<ActivityEntry>, WorkflowError> {
        Ok(self.activity.query(filter)?)
    }
}

fn probe_dimensions(bytes: &[u8]) -> Option<(u32, u32)> {
    image::load_from_memory(bytes).ok().map(|img| img.dimensions())
}

fn display_paths(paths: &[PathBuf]) -> Vec<String> {
    paths.iter().map(|p| p.display().to_string()).collect()
}
