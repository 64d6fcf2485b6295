//! Backup engine module.

pub mod engine;

pub use engine::{collect_candidates, BackupEngine, FileCandidate};
