use crate::error::BuildError;
use crate::model::{Construction, DecisionArtifact};
use crate::ruleset::decide;
use routegate_contract::vocab::{ARTIFACT_SCHEMA_VERSION, RULESET_ID};
use routegate_contract::{ContentHash, RepoRelativePath, RunId};
use routegate_proposal::{validate_bytes, ValidationResult};
use tracing::{info, warn};

/// Builds sealed decision artifacts from untrusted proposal bytes.
#[derive(Debug, Clone, Copy, Default)]
pub struct ArtifactBuilder;

impl ArtifactBuilder {
    pub fn new() -> Self {
        Self
    }

    /// Build the artifact for one run.
    ///
    /// Fails only when `run_id` is malformed ([`BuildError::Usage`]) or
    /// `input_ref` is not repo-relative ([`BuildError::PathSafety`]). Every
    /// problem with `proposal_bytes` becomes a REJECT artifact.
    pub fn build(
        &self,
        proposal_bytes: &[u8],
        run_id: &str,
        input_ref: &str,
    ) -> Result<DecisionArtifact, BuildError> {
        let run_id = RunId::parse(run_id).map_err(BuildError::Usage)?;
        let input_ref = RepoRelativePath::parse(input_ref).map_err(BuildError::PathSafety)?;

        let validation = validate_bytes(proposal_bytes);
        let verdict = decide(&validation);
        let (proposal_set, validator_errors) = match validation {
            ValidationResult::Valid(set) => (Some(set), Vec::new()),
            ValidationResult::Invalid { errors, .. } => (None, errors),
        };

        let mut artifact = DecisionArtifact {
            schema_version: ARTIFACT_SCHEMA_VERSION.to_string(),
            ruleset_id: RULESET_ID.to_string(),
            run_id,
            input_ref,
            decision: verdict.decision,
            reason_code: verdict.reason_code,
            route: verdict.route,
            proposal_set,
            proposal_set_sha256: ContentHash::hash(proposal_bytes),
            construction: Construction {
                proposal_count: verdict.proposal_count,
                selected_proposal_index: verdict.selected_proposal_index,
                validator_errors,
                notes: verdict.notes,
            },
            content_hash: ContentHash::from_bytes([0u8; 32]),
        };
        artifact.content_hash = artifact.compute_hash().map_err(BuildError::Encoding)?;

        if artifact.is_accept() {
            info!(
                run_id = %artifact.run_id,
                content_hash = %artifact.content_hash,
                "artifact built: ACCEPT"
            );
        } else {
            warn!(
                run_id = %artifact.run_id,
                reason = %artifact.reason_code,
                errors = artifact.construction.validator_errors.len(),
                "artifact built: REJECT"
            );
        }
        Ok(artifact)
    }
}
