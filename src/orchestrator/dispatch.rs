//! Command loop between a presentation layer and the [`WorkflowController`].
//!
//! Each command runs as its own task, so an analysis can be requested while an ingestion
//! is still pending. Results reach the UI through the controller's event channel.

use super::WorkflowController;
use crate::model::WorkflowEvent;
use anyhow::Result;
use std::sync::Arc;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};
use tokio::task::JoinSet;

/// Commands emitted by UI layers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum UiCommand {
    LoadLogs,
    Ingest {
        service_name: String,
        raw_text: String,
    },
    Analyze,
    Quit,
}

/// Dispatch UI commands onto the controller until `Quit` or the UI hangs up.
pub(crate) async fn run_controller(
    controller: Arc<WorkflowController>,
    event_tx: UnboundedSender<WorkflowEvent>,
    mut cmd_rx: UnboundedReceiver<UiCommand>,
) -> Result<()> {
    let mut tasks: JoinSet<()> = JoinSet::new();

    loop {
        tokio::select! {
            cmd = cmd_rx.recv() => {
                let ctrl = controller.clone();
                match cmd {
                    Some(UiCommand::LoadLogs) => {
                        tasks.spawn(async move { ctrl.load_logs().await });
                    }
                    Some(UiCommand::Ingest { service_name, raw_text }) => {
                        tasks.spawn(async move {
                            ctrl.ingest_logs(&service_name, &raw_text).await;
                        });
                    }
                    Some(UiCommand::Analyze) => {
                        tasks.spawn(async move { ctrl.analyze_logs().await });
                    }
                    Some(UiCommand::Quit) | None => break,
                }
            }
            Some(joined) = tasks.join_next(), if !tasks.is_empty() => {
                if let Err(e) = joined {
                    tracing::error!(error = %e, "workflow task failed");
                    let _ = event_tx.send(WorkflowEvent::Info(format!("Task failed: {e}")));
                }
            }
        }
    }

    // The UI is gone, so nothing is left to observe in-flight requests.
    if !tasks.is_empty() {
        tracing::debug!(in_flight = tasks.len(), "abandoning in-flight requests on quit");
    }
    tasks.shutdown().await;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::LogBackend;
    use crate::error::BackendError;
    use crate::model::{AnalysisResult, IngestRequest, LogEntry, LogId};
    use async_trait::async_trait;
    use tokio::sync::mpsc;

    struct StaticBackend;

    #[async_trait]
    impl LogBackend for StaticBackend {
        async fn list_logs(&self) -> Result<Vec<LogEntry>, BackendError> {
            Ok(vec![LogEntry {
                id: LogId::Number(1),
                timestamp: "2025-12-05T10:15:30".into(),
                level: "INFO".into(),
                service_name: "AuthService".into(),
                message: "ok".into(),
                raw_line: None,
            }])
        }

        async fn ingest_logs(&self, _request: &IngestRequest) -> Result<(), BackendError> {
            Ok(())
        }

        async fn analyze_logs(&self) -> Result<AnalysisResult, BackendError> {
            Ok(AnalysisResult {
                overall_summary: "Analyzed 1 log entries".into(),
                clusters: Vec::new(),
            })
        }
    }

    #[tokio::test]
    async fn commands_drive_controller_until_quit() {
        let (event_tx, mut event_rx) = mpsc::unbounded_channel();
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
        let ctrl = Arc::new(
            WorkflowController::new(Arc::new(StaticBackend)).with_events(event_tx.clone()),
        );

        let runner = tokio::spawn(run_controller(ctrl.clone(), event_tx, cmd_rx));
        cmd_tx.send(UiCommand::LoadLogs).unwrap();
        cmd_tx.send(UiCommand::Analyze).unwrap();

        let mut saw_logs = false;
        let mut saw_analysis = false;
        while !(saw_logs && saw_analysis) {
            match event_rx.recv().await {
                Some(WorkflowEvent::Logs(s)) if !s.data.is_empty() => saw_logs = true,
                Some(WorkflowEvent::Analysis(s)) if s.data.is_some() => saw_analysis = true,
                Some(_) => {}
                None => panic!("event channel closed early"),
            }
        }

        cmd_tx.send(UiCommand::Quit).unwrap();
        runner.await.unwrap().unwrap();
        let snap = ctrl.snapshot();
        assert_eq!(snap.logs.data.len(), 1);
        assert_eq!(
            snap.analysis.data.unwrap().overall_summary,
            "Analyzed 1 log entries"
        );
    }

    #[tokio::test]
    async fn hang_up_ends_loop() {
        let (event_tx, _event_rx) = mpsc::unbounded_channel();
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel::<UiCommand>();
        let ctrl = Arc::new(WorkflowController::new(Arc::new(StaticBackend)));
        drop(cmd_tx);
        run_controller(ctrl, event_tx, cmd_rx).await.unwrap();
    }
}
