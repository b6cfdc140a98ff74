//! Workflow controller.
//!
//! Owns the log list, ingestion status and analysis status as three disjoint slices, and
//! sequences the backend calls each operation needs. Every mutation is published as a
//! [`WorkflowEvent`] so presentation layers can re-render.

use crate::backend::LogBackend;
use crate::error::{error_chain, ValidationError};
use crate::input::normalize_lines;
use crate::model::{
    AnalysisState, IngestRequest, IngestState, LogsState, WorkflowEvent, WorkflowSnapshot,
};
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedSender;

pub(crate) const FETCH_LOGS_FAILED: &str = "Error fetching logs from backend.";
pub(crate) const INGEST_FAILED: &str = "Error ingesting logs.";
pub(crate) const ANALYZE_FAILED: &str = "Error analyzing logs.";

/// How an `ingest_logs` call ended, as far as the ingestion itself is concerned.
///
/// The follow-up refresh reports through the logs slice and never changes this value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IngestOutcome {
    Rejected(ValidationError),
    Failed,
    Stored,
}

#[derive(Default)]
struct Slices {
    logs: LogsState,
    ingest: IngestState,
    analysis: AnalysisState,
    // Latest issued request per operation; responses from older requests are dropped.
    logs_generation: u64,
    analysis_generation: u64,
    ingest_in_flight: usize,
}

pub struct WorkflowController {
    backend: Arc<dyn LogBackend>,
    slices: Mutex<Slices>,
    event_tx: Option<UnboundedSender<WorkflowEvent>>,
}

impl WorkflowController {
    pub fn new(backend: Arc<dyn LogBackend>) -> Self {
        Self {
            backend,
            slices: Mutex::new(Slices::default()),
            event_tx: None,
        }
    }

    /// Publish every slice change on `event_tx`.
    pub fn with_events(mut self, event_tx: UnboundedSender<WorkflowEvent>) -> Self {
        self.event_tx = Some(event_tx);
        self
    }

    pub fn snapshot(&self) -> WorkflowSnapshot {
        let s = self.slices.lock();
        WorkflowSnapshot {
            logs: s.logs.clone(),
            ingest: s.ingest.clone(),
            analysis: s.analysis.clone(),
        }
    }

    // Called with the slice lock held so event order always matches mutation order.
    fn publish(&self, event: WorkflowEvent) {
        if let Some(tx) = &self.event_tx {
            let _ = tx.send(event);
        }
    }

    /// Replace the log list with the backend's current contents.
    pub async fn load_logs(&self) {
        let generation = {
            let mut s = self.slices.lock();
            s.logs_generation += 1;
            if s.logs.error.take().is_some() {
                self.publish(WorkflowEvent::Logs(s.logs.clone()));
            }
            s.logs_generation
        };
        tracing::debug!(generation, "loading logs");

        let outcome = self.backend.list_logs().await;

        let mut s = self.slices.lock();
        if s.logs_generation != generation {
            tracing::debug!(
                generation,
                latest = s.logs_generation,
                "dropping superseded log list response"
            );
            return;
        }
        match outcome {
            Ok(entries) => {
                tracing::debug!(count = entries.len(), "log list refreshed");
                s.logs.data = entries;
                s.logs.error = None;
            }
            Err(e) => {
                tracing::warn!(error = %error_chain(&e), "log list fetch failed");
                s.logs.error = Some(FETCH_LOGS_FAILED.to_string());
            }
        }
        self.publish(WorkflowEvent::Logs(s.logs.clone()));
    }

    /// Validate `raw_text`, submit it for storage, then refresh the log list.
    ///
    /// The refresh only starts after the ingest request has completed successfully.
    pub async fn ingest_logs(&self, service_name: &str, raw_text: &str) -> IngestOutcome {
        let lines = normalize_lines(raw_text);
        if lines.is_empty() {
            let err = ValidationError::NoLines;
            let mut s = self.slices.lock();
            s.ingest.error = Some(err.to_string());
            self.publish(WorkflowEvent::Ingest(s.ingest.clone()));
            return IngestOutcome::Rejected(err);
        }

        let _pending = IngestGuard::begin(self);
        let request = IngestRequest {
            service_name: service_name.to_string(),
            lines,
        };
        tracing::debug!(
            service = %request.service_name,
            lines = request.lines.len(),
            "ingesting logs"
        );

        if let Err(e) = self.backend.ingest_logs(&request).await {
            tracing::warn!(error = %error_chain(&e), "ingest failed");
            let mut s = self.slices.lock();
            s.ingest.error = Some(INGEST_FAILED.to_string());
            self.publish(WorkflowEvent::Ingest(s.ingest.clone()));
            return IngestOutcome::Failed;
        }

        self.load_logs().await;
        IngestOutcome::Stored
    }

    /// Fetch a fresh analysis. The previous result stays visible until a new one arrives.
    pub async fn analyze_logs(&self) {
        let pending = AnalysisGuard::begin(self);
        let generation = pending.generation;
        tracing::debug!(generation, "requesting analysis");

        let outcome = self.backend.analyze_logs().await;

        let mut s = self.slices.lock();
        if s.analysis_generation != generation {
            tracing::debug!(
                generation,
                latest = s.analysis_generation,
                "dropping superseded analysis response"
            );
            return;
        }
        match outcome {
            Ok(result) => {
                tracing::debug!(clusters = result.clusters.len(), "analysis received");
                s.analysis.data = Some(result);
                s.analysis.error = None;
            }
            Err(e) => {
                tracing::warn!(error = %error_chain(&e), "analysis failed");
                s.analysis.error = Some(ANALYZE_FAILED.to_string());
            }
        }
        self.publish(WorkflowEvent::Analysis(s.analysis.clone()));
    }
}

/// Marks an ingestion in flight; clears `ingest.pending` on drop once no other is running.
struct IngestGuard<'a> {
    ctrl: &'a WorkflowController,
}

impl<'a> IngestGuard<'a> {
    fn begin(ctrl: &'a WorkflowController) -> Self {
        let mut s = ctrl.slices.lock();
        s.ingest_in_flight += 1;
        s.ingest.pending = true;
        s.ingest.error = None;
        ctrl.publish(WorkflowEvent::Ingest(s.ingest.clone()));
        // Any displayed or in-flight analysis describes a log set that is about to change.
        // Bumping the generation drops responses to requests issued before this point, and
        // their guards will no longer clear `pending`, so it is cleared here.
        s.analysis_generation += 1;
        let had_data = s.analysis.data.take().is_some();
        let was_pending = std::mem::replace(&mut s.analysis.pending, false);
        if had_data || was_pending {
            ctrl.publish(WorkflowEvent::Analysis(s.analysis.clone()));
        }
        Self { ctrl }
    }
}

impl Drop for IngestGuard<'_> {
    fn drop(&mut self) {
        let mut s = self.ctrl.slices.lock();
        s.ingest_in_flight = s.ingest_in_flight.saturating_sub(1);
        s.ingest.pending = s.ingest_in_flight > 0;
        self.ctrl.publish(WorkflowEvent::Ingest(s.ingest.clone()));
    }
}

/// Marks an analysis request in flight; only the newest request clears `analysis.pending`.
struct AnalysisGuard<'a> {
    ctrl: &'a WorkflowController,
    generation: u64,
}

impl<'a> AnalysisGuard<'a> {
    fn begin(ctrl: &'a WorkflowController) -> Self {
        let mut s = ctrl.slices.lock();
        s.analysis_generation += 1;
        s.analysis.pending = true;
        s.analysis.error = None;
        ctrl.publish(WorkflowEvent::Analysis(s.analysis.clone()));
        Self {
            ctrl,
            generation: s.analysis_generation,
        }
    }
}

impl Drop for AnalysisGuard<'_> {
    fn drop(&mut self) {
        let mut s = self.ctrl.slices.lock();
        if s.analysis_generation == self.generation {
            s.analysis.pending = false;
            self.ctrl.publish(WorkflowEvent::Analysis(s.analysis.clone()));
        }
    }
}
