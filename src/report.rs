use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::mutants::{MutantStatus, MutationResult};

/// Aggregate outcome of one mutation-testing batch. Timeouts and errors
/// indicate infrastructure noise, not test quality, so the mutation
/// score counts only killed and survived mutants in its denominator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MutationTestReport {
    pub file: String,
    pub total_mutants: usize,
    pub killed: usize,
    pub survived: usize,
    pub timeout: usize,
    pub error: usize,
    pub mutation_score: f64,
    pub duration_ms: u64,
    pub results: Vec<MutationResult>,
}

impl MutationTestReport {
    pub fn new(
        file: &Path,
        total_mutants: usize,
        results: Vec<MutationResult>,
        duration_ms: u64,
    ) -> Self {
        let count =
            |status: MutantStatus| results.iter().filter(|r| r.status == status).count();
        let killed = count(MutantStatus::Killed);
        let survived = count(MutantStatus::Survived);
        let timeout = count(MutantStatus::Timeout);
        let error = count(MutantStatus::Error);
        Self {
            file: file.display().to_string(),
            total_mutants,
            killed,
            survived,
            timeout,
            error,
            mutation_score: score(killed, survived),
            duration_ms,
            results,
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    pub fn from_json(data: &str) -> serde_json::Result<Self> {
        serde_json::from_str(data)
    }
}

fn score(killed: usize, survived: usize) -> f64 {
    let valid = killed + survived;
    if valid == 0 {
        0.0
    } else {
        killed as f64 / valid as f64 * 100.0
    }
}
