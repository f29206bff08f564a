//! Tabular data loading for A/B comparisons.
//!
//! Reads a labeled CSV table into the two `Sample`s the decision pipeline
//! consumes, writes the merged labeled table back out, and fingerprints the
//! loaded data for the experiment record. Group membership comes from an
//! explicit `group` column, never from row position.

pub mod error;
pub mod table;

pub use error::{LoaderError, Result};
pub use table::{fingerprint, read_groups, write_merged, GROUP_COLUMN};
