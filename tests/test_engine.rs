use std::path::{Path, PathBuf};

use pymutant::discovery;
use pymutant::engine::{GenerateOptions, MutationSession};
use pymutant::error::MutationError;

const SAMPLE: &str = "\
def add(a, b):
    return a + b

def clamp(n):
    if n > 10:
        return 10
    return n
";

fn write_sample(dir: &Path) -> PathBuf {
    let file = dir.join("calc.py");
    std::fs::write(&file, SAMPLE).unwrap();
    file
}

#[test]
fn generates_mutants_for_sample_file() {
    let dir = tempfile::TempDir::new().unwrap();
    let file = write_sample(dir.path());

    let mut session = MutationSession::new().unwrap();
    let mutants = session
        .generate_mutants(&file, &GenerateOptions::default())
        .unwrap();

    assert!(!mutants.is_empty());
    for mutant in &mutants {
        assert!(mutant.file.exists());
        assert!(mutant.file.starts_with(session.scratch_dir().unwrap()));
        assert_eq!(mutant.file.extension().and_then(|e| e.to_str()), Some("py"));
    }
}

#[test]
fn every_scratch_file_parses_cleanly() {
    let dir = tempfile::TempDir::new().unwrap();
    let file = write_sample(dir.path());

    let mut session = MutationSession::new().unwrap();
    let mutants = session
        .generate_mutants(&file, &GenerateOptions::default())
        .unwrap();

    for mutant in &mutants {
        let content = std::fs::read_to_string(&mutant.file).unwrap();
        discovery::parse(&content, &mutant.file)
            .unwrap_or_else(|e| panic!("mutant {} is not valid Python: {e}", mutant.id));
        assert_ne!(content, SAMPLE, "mutant must differ from the original");
    }
}

#[test]
fn original_file_is_never_touched() {
    let dir = tempfile::TempDir::new().unwrap();
    let file = write_sample(dir.path());
    let mtime_before = std::fs::metadata(&file).unwrap().modified().unwrap();

    let mut session = MutationSession::new().unwrap();
    let mutants = session
        .generate_mutants(&file, &GenerateOptions::default())
        .unwrap();
    assert!(!mutants.is_empty());

    assert_eq!(std::fs::read_to_string(&file).unwrap(), SAMPLE);
    let mtime_after = std::fs::metadata(&file).unwrap().modified().unwrap();
    assert_eq!(mtime_before, mtime_after);
}

#[test]
fn mutants_carry_fragments_and_diff() {
    let dir = tempfile::TempDir::new().unwrap();
    let file = write_sample(dir.path());

    let mut session = MutationSession::new().unwrap();
    let options = GenerateOptions {
        operators: Some(vec!["arithmetic".to_string()]),
        ..GenerateOptions::default()
    };
    let mutants = session.generate_mutants(&file, &options).unwrap();

    let mutant = mutants.first().expect("arithmetic mutant expected");
    assert_eq!(mutant.operator, "arithmetic");
    assert_eq!(mutant.original, "a + b");
    assert_eq!(mutant.function, "add");
    assert_eq!(mutant.line, 2);
    assert!(mutant.diff.contains("- "));
    assert!(mutant.diff.contains("+ "));
}

#[test]
fn operator_filter_restricts_generation() {
    let dir = tempfile::TempDir::new().unwrap();
    let file = write_sample(dir.path());

    let mut session = MutationSession::new().unwrap();
    let options = GenerateOptions {
        operators: Some(vec!["boundary".to_string()]),
        ..GenerateOptions::default()
    };
    let mutants = session.generate_mutants(&file, &options).unwrap();

    assert!(!mutants.is_empty());
    assert!(mutants.iter().all(|m| m.operator == "boundary"));
}

#[test]
fn target_function_filter_restricts_generation() {
    let dir = tempfile::TempDir::new().unwrap();
    let file = write_sample(dir.path());

    let mut session = MutationSession::new().unwrap();
    let options = GenerateOptions {
        target_functions: Some(vec!["add".to_string()]),
        ..GenerateOptions::default()
    };
    let mutants = session.generate_mutants(&file, &options).unwrap();

    assert!(!mutants.is_empty());
    assert!(mutants.iter().all(|m| m.function == "add"));
}

#[test]
fn max_mutants_short_circuits_generation() {
    let dir = tempfile::TempDir::new().unwrap();
    let file = write_sample(dir.path());

    let mut session = MutationSession::new().unwrap();
    let options = GenerateOptions {
        max_mutants: 3,
        ..GenerateOptions::default()
    };
    let mutants = session.generate_mutants(&file, &options).unwrap();

    assert_eq!(mutants.len(), 3);
    assert_eq!(session.scratch_files().len(), 3);
}

#[test]
fn parse_failure_aborts_the_session() {
    let dir = tempfile::TempDir::new().unwrap();
    let file = dir.path().join("broken.py");
    std::fs::write(&file, "def broken(:\n    pass\n").unwrap();

    let mut session = MutationSession::new().unwrap();
    let result = session.generate_mutants(&file, &GenerateOptions::default());
    assert!(matches!(result, Err(MutationError::Parse { .. })));
}

#[test]
fn missing_file_is_an_io_error() {
    let dir = tempfile::TempDir::new().unwrap();
    let file = dir.path().join("nope.py");

    let mut session = MutationSession::new().unwrap();
    let result = session.generate_mutants(&file, &GenerateOptions::default());
    assert!(matches!(result, Err(MutationError::Io { .. })));
}

#[test]
fn cleanup_removes_everything_and_is_idempotent() {
    let dir = tempfile::TempDir::new().unwrap();
    let file = write_sample(dir.path());

    let mut session = MutationSession::new().unwrap();
    let mutants = session
        .generate_mutants(&file, &GenerateOptions::default())
        .unwrap();
    let scratch_dir = session.scratch_dir().unwrap().to_path_buf();

    session.cleanup();
    assert!(!scratch_dir.exists());
    for mutant in &mutants {
        assert!(!mutant.file.exists());
    }
    assert!(session.scratch_dir().is_none());

    // Second call is a no-op.
    session.cleanup();
    assert!(session.scratch_files().is_empty());
}

#[test]
fn generation_after_cleanup_fails() {
    let dir = tempfile::TempDir::new().unwrap();
    let file = write_sample(dir.path());

    let mut session = MutationSession::new().unwrap();
    session.cleanup();
    let result = session.generate_mutants(&file, &GenerateOptions::default());
    assert!(matches!(result, Err(MutationError::SessionClosed)));
}

#[test]
fn drop_removes_the_scratch_directory() {
    let dir = tempfile::TempDir::new().unwrap();
    let file = write_sample(dir.path());

    let scratch_dir;
    {
        let mut session = MutationSession::new().unwrap();
        session
            .generate_mutants(&file, &GenerateOptions::default())
            .unwrap();
        scratch_dir = session.scratch_dir().unwrap().to_path_buf();
        assert!(scratch_dir.exists());
    }
    assert!(!scratch_dir.exists());
}
