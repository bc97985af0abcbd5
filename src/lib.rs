pub mod discovery;
pub mod engine;
pub mod error;
pub mod mutants;
pub mod operators;
pub mod report;
pub mod runner;

use std::path::Path;
use std::time::Duration;

pub use engine::{GenerateOptions, MutationSession};
pub use error::{ConstructionError, MutationError, SandboxError};
pub use mutants::{Mutant, MutantStatus, MutationResult};
pub use operators::{Category, MutationOperator, OperatorRegistry};
pub use report::MutationTestReport;
pub use runner::MutationTestRunner;

#[derive(Debug, Clone)]
pub struct MutationTestOptions {
    pub target_functions: Option<Vec<String>>,
    pub operators: Option<Vec<String>>,
    pub max_mutants: usize,
    /// Explicit test command; None derives one from discovered test files.
    pub test_command: Option<String>,
    pub timeout: Duration,
}

impl Default for MutationTestOptions {
    fn default() -> Self {
        Self {
            target_functions: None,
            operators: None,
            max_mutants: 50,
            test_command: None,
            timeout: Duration::from_secs(30),
        }
    }
}

pub struct MutationOutcome {
    pub mutants: Vec<Mutant>,
    pub report: MutationTestReport,
}

/// Generate mutants for `file`, test each in isolation, and return the
/// mutant list together with the aggregate report. Scratch artifacts are
/// removed before returning, on success and failure alike.
pub fn run_mutation_tests(
    file: &Path,
    options: &MutationTestOptions,
) -> Result<MutationOutcome, MutationError> {
    let mut session = MutationSession::new()?;
    let generate = GenerateOptions {
        target_functions: options.target_functions.clone(),
        operators: options.operators.clone(),
        max_mutants: options.max_mutants,
    };
    let mutants = session.generate_mutants(file, &generate)?;

    let mut runner = MutationTestRunner::new(options.timeout);
    if let Some(command) = &options.test_command {
        runner = runner.with_test_command(command.clone());
    }
    let report = runner.run(&mutants, file);

    session.cleanup();
    Ok(MutationOutcome { mutants, report })
}
