use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// One syntactically valid variant of the source, differing from the
/// original by exactly one operator-applied change. The scratch file at
/// `file` holds the entire mutated source and lives only as long as the
/// owning session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Mutant {
    pub id: String,
    pub operator: String,
    pub original: String,
    pub mutated: String,
    pub line: usize,
    pub column: usize,
    pub function: String,
    pub description: String,
    pub diff: String,
    pub file: PathBuf,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MutantStatus {
    /// Tests failed against the mutant; the suite detected the change.
    Killed,
    /// Tests passed; the change went unnoticed.
    Survived,
    /// The test run exceeded the wall-clock bound.
    Timeout,
    /// Environment setup or process launch failed. Excluded from the
    /// mutation-score denominator together with Timeout.
    Error,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MutationResult {
    pub mutant_id: String,
    pub status: MutantStatus,
    pub duration_ms: u64,
    pub output: String,
    pub failing_tests: Vec<String>,
    pub error: Option<String>,
}
