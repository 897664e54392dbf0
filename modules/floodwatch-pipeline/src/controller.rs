//! Pipeline controller: sequences the stages for one report.
//!
//! ```text
//! RECEIVED -> GATEKEEPING -> { REJECTED | LOCATING }
//! LOCATING -> { INCOMPLETE | EVIDENCE_GATHERING }
//! EVIDENCE_GATHERING -> SCORING -> ASSEMBLING -> COMPLETED
//! ```
//!
//! RECEIVED may also go straight to REJECTED on empty input. Control flow
//! is decided from typed stage results only; the one `Err` this returns is
//! an illegal transition, which is a bug.

use std::fmt;
use std::path::Path;

use tracing::{info, warn};
use uuid::Uuid;

use floodwatch_common::{
    FloodWatchError, GatekeeperVerdict, LocationClassification, PipelineOutcome, ReportRequest,
};

use crate::assembler::{AssemblyInput, ReportAssembler};
use crate::deps::ServiceContext;
use crate::gatekeeper::Gatekeeper;
use crate::images::load_images;
use crate::location::LocationResolver;
use crate::scoring::ScoringInput;

pub const REASON_EMPTY_INPUT: &str = "empty input";
pub const REASON_NOT_FLOOD: &str = "Not identified as flood by MLLM";
pub const REASON_NO_LOCATION: &str = "No location identified";
pub const REASON_UNRESOLVED: &str = "Location could not be resolved";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Received,
    Gatekeeping,
    Rejected,
    Locating,
    Incomplete,
    EvidenceGathering,
    Scoring,
    Assembling,
    Completed,
}

impl PipelineState {
    pub fn as_str(&self) -> &'static str {
        match self {
            PipelineState::Received => "RECEIVED",
            PipelineState::Gatekeeping => "GATEKEEPING",
            PipelineState::Rejected => "REJECTED",
            PipelineState::Locating => "LOCATING",
            PipelineState::Incomplete => "INCOMPLETE",
            PipelineState::EvidenceGathering => "EVIDENCE_GATHERING",
            PipelineState::Scoring => "SCORING",
            PipelineState::Assembling => "ASSEMBLING",
            PipelineState::Completed => "COMPLETED",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            PipelineState::Rejected | PipelineState::Incomplete | PipelineState::Completed
        )
    }

    pub fn can_transition_to(&self, next: PipelineState) -> bool {
        use PipelineState::*;
        matches!(
            (self, next),
            (Received, Gatekeeping)
                | (Received, Rejected)
                | (Gatekeeping, Rejected)
                | (Gatekeeping, Locating)
                | (Locating, Incomplete)
                | (Locating, EvidenceGathering)
                | (EvidenceGathering, Scoring)
                | (Scoring, Assembling)
                | (Assembling, Completed)
        )
    }
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// State of one run. Transitions are checked and logged.
struct Run {
    id: Uuid,
    state: PipelineState,
}

impl Run {
    fn start() -> Self {
        let id = Uuid::new_v4();
        info!(run_id = %id, state = %PipelineState::Received, "Report received");
        Self {
            id,
            state: PipelineState::Received,
        }
    }

    fn advance(&mut self, next: PipelineState) -> Result<(), FloodWatchError> {
        if !self.state.can_transition_to(next) {
            return Err(FloodWatchError::InvalidTransition {
                from: self.state.to_string(),
                to: next.to_string(),
            });
        }
        info!(run_id = %self.id, from = %self.state, to = %next, "Pipeline transition");
        self.state = next;
        Ok(())
    }
}

pub struct FloodPipeline {
    ctx: ServiceContext,
    gatekeeper: Gatekeeper,
    resolver: LocationResolver,
    assembler: ReportAssembler,
}

impl FloodPipeline {
    pub fn new(ctx: ServiceContext) -> Self {
        Self {
            gatekeeper: Gatekeeper::new(ctx.gatekeeper.clone(), ctx.model_timeout),
            resolver: LocationResolver::new(
                ctx.knowledge_base.clone(),
                ctx.gazetteer.clone(),
                ctx.model_timeout,
            ),
            assembler: ReportAssembler::new(ctx.narrator.clone(), ctx.model_timeout),
            ctx,
        }
    }

    pub fn context(&self) -> &ServiceContext {
        &self.ctx
    }

    /// Gatekeeper only.
    pub async fn classify(&self, request: &ReportRequest) -> GatekeeperVerdict {
        let images = load_images(request).await;
        self.gatekeeper.classify(request.text(), &images).await
    }

    /// Location resolver only.
    pub async fn resolve(&self, location: &str) -> LocationClassification {
        self.resolver.resolve(location).await
    }

    /// Run one report to a terminal state. Dropping the future cancels any
    /// in-flight stage; nothing is emitted until assembly finishes.
    pub async fn process(
        &self,
        request: &ReportRequest,
    ) -> Result<PipelineOutcome, FloodWatchError> {
        let mut run = Run::start();

        if let Err(e) = request.validate() {
            run.advance(PipelineState::Rejected)?;
            let reason = match e {
                FloodWatchError::Validation(msg) => msg,
                other => other.to_string(),
            };
            info!(
                run_id = %run.id,
                reason = reason.as_str(),
                "Report rejected before classification"
            );
            return Ok(PipelineOutcome::Rejected { reason, verdict: None });
        }

        // --- Gatekeeping ---
        run.advance(PipelineState::Gatekeeping)?;
        let archived_images = self.archive_images(request).await;
        let verdict = self.classify(request).await;

        if !verdict.is_flood {
            run.advance(PipelineState::Rejected)?;
            return Ok(PipelineOutcome::Rejected {
                reason: REASON_NOT_FLOOD.to_string(),
                verdict: Some(verdict),
            });
        }

        // --- Locating ---
        run.advance(PipelineState::Locating)?;
        let Some(location_text) = verdict.location_text().map(str::to_string) else {
            run.advance(PipelineState::Incomplete)?;
            return Ok(PipelineOutcome::Incomplete {
                reason: REASON_NO_LOCATION.to_string(),
                verdict,
                location: None,
            });
        };

        let location = self.resolver.resolve(&location_text).await;
        if location.ordered_locations.is_empty() {
            run.advance(PipelineState::Incomplete)?;
            return Ok(PipelineOutcome::Incomplete {
                reason: REASON_UNRESOLVED.to_string(),
                verdict,
                location: Some(location),
            });
        }
        info!(
            run_id = %run.id,
            candidates = ?location.ordered_locations.as_slice(),
            resolved_by = ?location.resolved_by,
            "Location resolved"
        );

        // --- Evidence ---
        run.advance(PipelineState::EvidenceGathering)?;
        let evidence = self.ctx.fan_out().gather(&location.ordered_locations).await;
        let succeeded = evidence.iter().filter(|r| r.is_success()).count();
        info!(run_id = %run.id, succeeded, total = evidence.len(), "Evidence gathered");

        // --- Scoring ---
        run.advance(PipelineState::Scoring)?;
        let assessment = self.ctx.scoring.assess(&ScoringInput {
            verdict: &verdict,
            candidates: &location.ordered_locations,
            evidence: &evidence,
        });
        info!(
            run_id = %run.id,
            score = assessment.score,
            initial = %verdict.severity,
            severity = %assessment.severity,
            "Report scored"
        );

        // --- Assembling ---
        run.advance(PipelineState::Assembling)?;
        let report = self
            .assembler
            .assemble(AssemblyInput {
                verdict,
                location,
                evidence,
                assessment,
                archived_images,
            })
            .await;

        run.advance(PipelineState::Completed)?;
        info!(run_id = %run.id, report_id = %report.report_id, "Report completed");
        Ok(PipelineOutcome::Completed(Box::new(report)))
    }

    /// Copy local images to the storage target when asked. Failures are
    /// logged and skipped.
    async fn archive_images(&self, request: &ReportRequest) -> Vec<String> {
        if !request.save_images || request.image_files.is_empty() {
            return Vec::new();
        }
        let Some(sink) = &self.ctx.sink else {
            warn!("Image archiving requested but no report sink is configured");
            return Vec::new();
        };

        let bucket = request.storage_target.as_deref().unwrap_or(&self.ctx.default_bucket);
        let mut archived = Vec::new();
        for file in &request.image_files {
            match sink.archive_image(bucket, Path::new(file)).await {
                Ok(location) => archived.push(location),
                Err(e) => warn!(path = file.as_str(), error = %e, "Failed to archive image"),
            }
        }
        archived
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn legal_paths() {
        use PipelineState::*;
        let happy = [
            Received,
            Gatekeeping,
            Locating,
            EvidenceGathering,
            Scoring,
            Assembling,
            Completed,
        ];
        for pair in happy.windows(2) {
            assert!(pair[0].can_transition_to(pair[1]), "{} -> {}", pair[0], pair[1]);
        }
        assert!(Received.can_transition_to(Rejected));
        assert!(Gatekeeping.can_transition_to(Rejected));
        assert!(Locating.can_transition_to(Incomplete));
    }

    #[test]
    fn terminal_states_go_nowhere() {
        use PipelineState::*;
        let all = [
            Received, Gatekeeping, Rejected, Locating, Incomplete, EvidenceGathering, Scoring,
            Assembling, Completed,
        ];
        for terminal in all.iter().filter(|s| s.is_terminal()) {
            assert!(all.iter().all(|next| !terminal.can_transition_to(*next)));
        }
    }

    #[test]
    fn skipping_evidence_is_illegal() {
        let mut run = Run {
            id: Uuid::new_v4(),
            state: PipelineState::Locating,
        };
        let err = run.advance(PipelineState::Scoring).unwrap_err();
        assert!(err.to_string().contains("LOCATING -> SCORING"));
        assert_eq!(run.state, PipelineState::Locating);
    }
}
