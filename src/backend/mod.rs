//! Access to the remote log-intelligence service.
//!
//! The controller only sees [`LogBackend`]; [`HttpBackend`] is the production implementation.

mod http;

pub use http::HttpBackend;

use crate::error::BackendError;
use crate::model::{AnalysisResult, IngestRequest, LogEntry};
use async_trait::async_trait;

/// Request/response contract of the backend.
///
/// Each call is one suspension point; implementations must not retry on their own.
#[async_trait]
pub trait LogBackend: Send + Sync {
    /// Every stored entry, in backend order.
    async fn list_logs(&self) -> Result<Vec<LogEntry>, BackendError>;

    /// Store the given lines. The acknowledgment body carries no state for the caller.
    async fn ingest_logs(&self, request: &IngestRequest) -> Result<(), BackendError>;

    /// Cluster and summarise everything currently stored.
    async fn analyze_logs(&self) -> Result<AnalysisResult, BackendError>;
}
