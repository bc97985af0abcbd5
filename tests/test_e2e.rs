use std::path::{Path, PathBuf};
use std::time::Duration;

use pymutant::mutants::MutantStatus;
use pymutant::{MutationTestOptions, run_mutation_tests};

fn python3_available() -> bool {
    std::process::Command::new("python3")
        .arg("--version")
        .output()
        .is_ok()
}

/// Nest the project one level down so test-file discovery stays inside
/// the fixture directory.
fn project_dir(root: &Path) -> PathBuf {
    let pkg = root.join("pkg");
    std::fs::create_dir(&pkg).unwrap();
    pkg
}

#[test]
fn arithmetic_mutants_are_killed_by_a_real_test_suite() {
    if !python3_available() {
        eprintln!("python3 not available, skipping");
        return;
    }
    let dir = tempfile::TempDir::new().unwrap();
    let pkg = project_dir(dir.path());
    let source = pkg.join("calc.py");
    std::fs::write(&source, "def add(a, b):\n    return a + b\n").unwrap();
    std::fs::write(
        pkg.join("test_calc.py"),
        "from calc import add\n\nassert add(2, 3) == 5\n",
    )
    .unwrap();

    let options = MutationTestOptions {
        operators: Some(vec!["arithmetic".to_string()]),
        target_functions: Some(vec!["add".to_string()]),
        test_command: Some("python3 test_calc.py".to_string()),
        timeout: Duration::from_secs(20),
        ..MutationTestOptions::default()
    };
    let outcome = run_mutation_tests(&source, &options).unwrap();

    assert_eq!(outcome.mutants.len(), 2, "+ maps to - and *");
    assert_eq!(outcome.report.killed, 2);
    assert_eq!(outcome.report.survived, 0);
    assert_eq!(outcome.report.mutation_score, 100.0);
}

#[test]
fn dead_statement_survives_while_live_ones_are_killed() {
    if !python3_available() {
        eprintln!("python3 not available, skipping");
        return;
    }
    let dir = tempfile::TempDir::new().unwrap();
    let pkg = project_dir(dir.path());
    let source = pkg.join("proc.py");
    std::fs::write(
        &source,
        "def process(values):\n    unused = 0\n    total = sum(values)\n    return total\n",
    )
    .unwrap();
    std::fs::write(
        pkg.join("test_proc.py"),
        "from proc import process\n\nassert process([1, 2]) == 3\n",
    )
    .unwrap();

    let options = MutationTestOptions {
        operators: Some(vec!["stmt_delete".to_string()]),
        target_functions: Some(vec!["process".to_string()]),
        test_command: Some("python3 test_proc.py".to_string()),
        timeout: Duration::from_secs(20),
        ..MutationTestOptions::default()
    };
    let outcome = run_mutation_tests(&source, &options).unwrap();

    assert!(outcome.report.survived >= 1, "deleting dead code survives");
    assert!(outcome.report.killed >= 1, "deleting live code is caught");
}

#[test]
fn missing_test_suite_is_reported_as_an_error() {
    let dir = tempfile::TempDir::new().unwrap();
    let pkg = project_dir(dir.path());
    let source = pkg.join("calc.py");
    std::fs::write(&source, "def add(a, b):\n    return a + b\n").unwrap();

    let options = MutationTestOptions::default();
    let outcome = run_mutation_tests(&source, &options).unwrap();

    assert!(!outcome.mutants.is_empty());
    assert_eq!(outcome.report.results.len(), 1);
    assert_eq!(outcome.report.results[0].mutant_id, "no_tests");
    assert_eq!(outcome.report.results[0].status, MutantStatus::Error);
    assert_eq!(outcome.report.killed, 0);
    assert_eq!(outcome.report.survived, 0);
    assert_eq!(outcome.report.mutation_score, 0.0);
}

#[test]
fn scratch_files_are_removed_and_original_untouched() {
    let dir = tempfile::TempDir::new().unwrap();
    let pkg = project_dir(dir.path());
    let source = pkg.join("calc.py");
    let content = "def add(a, b):\n    return a + b\n";
    std::fs::write(&source, content).unwrap();

    let options = MutationTestOptions {
        operators: Some(vec!["arithmetic".to_string()]),
        test_command: Some("true".to_string()),
        ..MutationTestOptions::default()
    };
    let outcome = run_mutation_tests(&source, &options).unwrap();

    assert!(!outcome.mutants.is_empty());
    assert!(
        outcome
            .report
            .results
            .iter()
            .all(|r| r.status == MutantStatus::Survived)
    );
    assert_eq!(std::fs::read_to_string(&source).unwrap(), content);
    for mutant in &outcome.mutants {
        assert!(!mutant.file.exists(), "scratch files must be cleaned up");
    }
}
