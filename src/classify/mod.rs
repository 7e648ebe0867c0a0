//! C7: domain extractors and classifiers. Pure functions — title/spec/
//! description text in, typed attributes and pass/fail verdicts out. No
//! I/O (spec §4.6).

pub mod extractors;
mod gemstone;
mod jewelry;
mod watch;

pub use gemstone::GemstoneOutcome;
pub use jewelry::JewelryOutcome;
pub use watch::WatchOutcome;

pub use gemstone::classify as classify_gemstone;
pub use jewelry::classify as classify_jewelry;
pub use watch::classify as classify_watch;
