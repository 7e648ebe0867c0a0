use crate::credentials::CredentialError;
use crate::store::StoreError;
use crate::upstream::UpstreamError;

/// Why a single task invocation aborted (spec §4.5 "Failure semantics").
/// A rate-limit abort is expected to resolve itself on the task's next
/// due tick; every other variant is logged and the tick moves on.
#[derive(thiserror::Error, Debug)]
pub enum ProcessError {
    #[error("no usable credential: {0}")]
    Credential(#[from] CredentialError),
    #[error("upstream rate limited mid-task: {0}")]
    RateLimited(#[source] UpstreamError),
    #[error("upstream error: {0}")]
    Upstream(#[from] UpstreamError),
    #[error("backing store error: {0}")]
    Store(#[from] StoreError),
}
