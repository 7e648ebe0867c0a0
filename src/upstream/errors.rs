/// Failure taxonomy for upstream marketplace calls (spec §4.3/§4.4). The
/// task processor and scheduler branch on these variants rather than on
/// raw HTTP status codes so the rotation/cooldown/disable decisions stay
/// in one place (`credentials::CredentialPool`).
#[derive(thiserror::Error, Debug)]
pub enum UpstreamError {
    #[error("credential {credential} rate limited (429)")]
    RateLimitError { credential: String },

    #[error("credential {credential} rejected (401)")]
    AuthError { credential: String },

    #[error("bulk fetch not authorized for this credential (403); caller should retry per-item")]
    BulkNotAuthorizedError,

    #[error("transient upstream failure: {status} {body_excerpt}")]
    TransientError { status: u16, body_excerpt: String },

    #[error("upstream request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("upstream returned malformed data: {0}")]
    Decode(String),
}
