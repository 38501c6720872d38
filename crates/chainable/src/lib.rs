//! Consecutive-day chains ("streaks") over timestamped records.
//!
//! Records belonging to an owner are resolved through a `DateSource`,
//! truncated to calendar days in one reference time zone, and grouped into
//! maximal runs of consecutive days. From those runs the crate reports the
//! current chain, the longest chain, or the runs themselves.
//!
//! ```no_run
//! use chainable::{ChainOptions, Chainable, MemorySource};
//!
//! let mut source = MemorySource::new();
//! source.insert_timestamp("alice", "posts", "created_at", "2024-03-10T09:00:00Z");
//!
//! let chains = Chainable::new(source);
//! let current = chains.chain_length_for("alice", "posts", None, ChainOptions::default())?;
//! # Ok::<(), chainable::ChainError>(())
//! ```

pub mod chain;
pub mod config;
pub mod error;
pub mod service;
pub mod source;
pub mod timestamp;
pub mod zone;

pub use chain::{chain_length, extract_runs, summarize, ChainMode, ChainStats, DateSet, Run};
pub use config::{ChainOptions, ChainableConfig, DEFAULT_COLUMN};
pub use error::{ChainError, Result};
pub use service::Chainable;
pub use source::{DateSource, JsonlSource, MemorySource, Record};
pub use timestamp::RawTimestamp;
pub use zone::ReferenceZone;
