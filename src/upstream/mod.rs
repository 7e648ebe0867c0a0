//! C5: the upstream marketplace client — OAuth token acquisition, search
//! query construction, and single/bulk detail fetch with error
//! classification (spec §4.3, §4.4, §6.4).

mod client;
mod errors;
mod query;

pub use client::UpstreamClient;
pub use errors::UpstreamError;
pub use query::{queries_for, SearchQuery};
