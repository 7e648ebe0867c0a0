//! A long-running polling worker that hunts a jewelry/watch/gemstone
//! marketplace for newly listed items matching user-defined tasks,
//! enriches and classifies candidates, and persists matches into a
//! backing store. See `SPEC_FULL.md` for the full component contract.

pub mod cache;
pub mod classify;
pub mod config;
pub mod credentials;
pub mod domain;
pub mod health;
pub mod notify;
pub mod processor;
pub mod scheduler;
pub mod store;
pub mod upstream;

pub use config::{Cli, Config};
