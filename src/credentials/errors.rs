#[derive(thiserror::Error, Debug, Clone)]
pub enum CredentialError {
    /// All usable credentials are cooled down. Carries the number of
    /// seconds until the earliest cooldown expires (spec §4.2).
    #[error("all credentials cooled down; earliest reset in {0}s")]
    AllCooled(u64),
    #[error("no usable credentials: all are disabled")]
    NoneUsable,
}
