mod errors;
mod pool;
mod rate_governor;
mod token_cache;

pub use errors::CredentialError;
pub use pool::CredentialPool;
pub use rate_governor::RateGovernor;
pub use token_cache::{CachedToken, TokenCache};
