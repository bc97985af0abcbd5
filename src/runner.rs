use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::time::{Duration, Instant};

use crate::error::SandboxError;
use crate::mutants::{Mutant, MutantStatus, MutationResult};
use crate::report::MutationTestReport;

pub const DEFAULT_TEST_COMMAND: &str = "python -m pytest";

/// Runs the test suite against each mutant in an isolated sandbox
/// directory and classifies the outcome. One mutant is tested fully to
/// completion before the next begins.
pub struct MutationTestRunner {
    test_command: Option<String>,
    timeout: Duration,
    stop_after: Option<usize>,
}

impl MutationTestRunner {
    pub fn new(timeout: Duration) -> Self {
        Self {
            test_command: None,
            timeout,
            stop_after: None,
        }
    }

    /// Explicit test command. Without one the runner falls back to
    /// `python -m pytest` against the discovered test files.
    pub fn with_test_command(mut self, command: impl Into<String>) -> Self {
        self.test_command = Some(command.into());
        self
    }

    /// Stop after this many mutants. Checked between mutants only, so a
    /// running test always completes or times out cleanly.
    pub fn with_stop_after(mut self, limit: usize) -> Self {
        self.stop_after = Some(limit);
        self
    }

    pub fn run(&self, mutants: &[Mutant], original_file: &Path) -> MutationTestReport {
        let start = Instant::now();
        let test_files = discover_test_files(original_file);
        let mut results = Vec::with_capacity(mutants.len());

        if test_files.is_empty() && self.test_command.is_none() {
            // Never report a misleadingly perfect score against nothing.
            results.push(MutationResult {
                mutant_id: "no_tests".to_string(),
                status: MutantStatus::Error,
                duration_ms: 0,
                output: "No test files found".to_string(),
                failing_tests: vec![],
                error: Some(format!(
                    "no test files found for {}",
                    original_file.display()
                )),
            });
        } else {
            let command = self.test_command.as_deref().unwrap_or(DEFAULT_TEST_COMMAND);
            for mutant in mutants {
                if let Some(limit) = self.stop_after {
                    if results.len() >= limit {
                        break;
                    }
                }
                results.push(self.test_single_mutant(mutant, original_file, &test_files, command));
            }
        }

        MutationTestReport::new(
            original_file,
            mutants.len(),
            results,
            start.elapsed().as_millis() as u64,
        )
    }

    fn test_single_mutant(
        &self,
        mutant: &Mutant,
        original_file: &Path,
        test_files: &[PathBuf],
        command: &str,
    ) -> MutationResult {
        let start = Instant::now();
        match self.execute_in_sandbox(mutant, original_file, test_files, command) {
            Ok(outcome) => MutationResult {
                mutant_id: mutant.id.clone(),
                status: outcome.status,
                duration_ms: start.elapsed().as_millis() as u64,
                output: outcome.output,
                failing_tests: outcome.failing_tests,
                error: outcome.error,
            },
            Err(e) => MutationResult {
                mutant_id: mutant.id.clone(),
                status: MutantStatus::Error,
                duration_ms: start.elapsed().as_millis() as u64,
                output: String::new(),
                failing_tests: vec![],
                error: Some(e.to_string()),
            },
        }
    }

    fn execute_in_sandbox(
        &self,
        mutant: &Mutant,
        original_file: &Path,
        test_files: &[PathBuf],
        command: &str,
    ) -> Result<TestOutcome, SandboxError> {
        // TempDir drops on every path, so the sandbox never leaks.
        let sandbox = tempfile::Builder::new()
            .prefix("mutation-sandbox-")
            .tempdir()
            .map_err(SandboxError::Create)?;

        // The mutant takes the original basename so the tests import it
        // under the expected module name.
        let basename = original_file
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "module.py".into());
        fs::copy(&mutant.file, sandbox.path().join(&basename)).map_err(|e| SandboxError::Copy {
            path: mutant.file.clone(),
            source: e,
        })?;
        for test_file in test_files {
            if let Some(name) = test_file.file_name() {
                fs::copy(test_file, sandbox.path().join(name)).map_err(|e| SandboxError::Copy {
                    path: test_file.clone(),
                    source: e,
                })?;
            }
        }

        let (program, args) = split_command(command);
        let mut spawn = Command::new(&program);
        spawn
            .args(&args)
            .current_dir(sandbox.path())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt;
            // The command leads its own process group so a timeout can
            // take down test-spawned helpers together with the child.
            spawn.process_group(0);
        }
        let mut child = spawn.spawn().map_err(|e| SandboxError::Spawn {
            command: command.to_string(),
            source: e,
        })?;

        // Drain both pipes off-thread. A suite whose output exceeds the
        // pipe buffer would otherwise block on write and never exit.
        let stdout_reader = spawn_pipe_reader(child.stdout.take());
        let stderr_reader = spawn_pipe_reader(child.stderr.take());

        let start = Instant::now();
        loop {
            match child.try_wait() {
                Ok(Some(exit_status)) => {
                    let output = collect_output(stdout_reader, stderr_reader);
                    let status = if exit_status.success() {
                        MutantStatus::Survived
                    } else {
                        MutantStatus::Killed
                    };
                    let failing_tests = extract_failing_tests(&output);
                    return Ok(TestOutcome {
                        status,
                        output,
                        failing_tests,
                        error: None,
                    });
                }
                Ok(None) => {
                    if start.elapsed() > self.timeout {
                        // Kill and reap so no test process outlives us.
                        kill_process_tree(&mut child);
                        let _ = collect_output(stdout_reader, stderr_reader);
                        return Ok(TestOutcome {
                            status: MutantStatus::Timeout,
                            output: "Test execution timed out".to_string(),
                            failing_tests: vec![],
                            error: Some(format!(
                                "test run exceeded {} ms",
                                self.timeout.as_millis()
                            )),
                        });
                    }
                    std::thread::sleep(Duration::from_millis(10));
                }
                Err(e) => {
                    kill_process_tree(&mut child);
                    let _ = collect_output(stdout_reader, stderr_reader);
                    return Ok(TestOutcome {
                        status: MutantStatus::Error,
                        output: String::new(),
                        failing_tests: vec![],
                        error: Some(format!("failed to wait on test process: {e}")),
                    });
                }
            }
        }
    }
}

struct TestOutcome {
    status: MutantStatus,
    output: String,
    failing_tests: Vec<String>,
    error: Option<String>,
}

fn spawn_pipe_reader<R>(pipe: Option<R>) -> std::thread::JoinHandle<String>
where
    R: std::io::Read + Send + 'static,
{
    std::thread::spawn(move || {
        let mut buffer = String::new();
        if let Some(mut pipe) = pipe {
            let _ = pipe.read_to_string(&mut buffer);
        }
        buffer
    })
}

/// Join both reader threads. They terminate once the child (and anything
/// it handed the pipe to) closes the write end.
fn collect_output(
    stdout: std::thread::JoinHandle<String>,
    stderr: std::thread::JoinHandle<String>,
) -> String {
    let mut output = stdout.join().unwrap_or_default();
    output.push_str(&stderr.join().unwrap_or_default());
    output
}

/// Signal the child's whole process group, then reap the child itself.
#[cfg(unix)]
fn kill_process_tree(child: &mut Child) {
    unsafe {
        libc::kill(-(child.id() as i32), libc::SIGKILL);
    }
    let _ = child.wait();
}

#[cfg(not(unix))]
fn kill_process_tree(child: &mut Child) {
    let _ = child.kill();
    let _ = child.wait();
}

pub fn split_command(command: &str) -> (String, Vec<String>) {
    let parts: Vec<&str> = command.split_whitespace().collect();
    if parts.len() > 1 {
        (
            parts[0].to_string(),
            parts[1..].iter().map(|s| s.to_string()).collect(),
        )
    } else {
        (command.to_string(), vec![])
    }
}

/// Discover test files by filename convention relative to the source
/// file: `test_<stem>.py`, `<stem>_test.py`, and a `test*.py` fallback,
/// searched in the source directory, sibling `tests`/`test` directories,
/// and the same one level up. Sorted and deduped for stable output.
pub fn discover_test_files(source_file: &Path) -> Vec<PathBuf> {
    let source_dir = source_file
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));
    let stem = source_file
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or_default();

    let mut search_dirs = vec![
        source_dir.clone(),
        source_dir.join("tests"),
        source_dir.join("test"),
    ];
    if let Some(parent) = source_dir.parent().filter(|p| !p.as_os_str().is_empty()) {
        search_dirs.push(parent.join("tests"));
        search_dirs.push(parent.join("test"));
    }

    let mut found = Vec::new();
    for dir in &search_dirs {
        if !dir.is_dir() {
            continue;
        }
        for name in [format!("test_{stem}.py"), format!("{stem}_test.py")] {
            let candidate = dir.join(&name);
            if candidate.is_file() {
                found.push(candidate);
            }
        }
        // Fallback glob: any test*.py in the directory.
        if let Ok(entries) = fs::read_dir(dir) {
            for entry in entries.flatten() {
                let name = entry.file_name();
                let name = name.to_string_lossy();
                if name.starts_with("test") && name.ends_with(".py") && entry.path().is_file() {
                    found.push(entry.path());
                }
            }
        }
    }
    found.sort();
    found.dedup();
    found
}

/// Best-effort extraction of failing test names from pytest
/// (`FAILED <name>`) and unittest (`FAIL: <name>`) output. A miss never
/// changes the status classification.
pub fn extract_failing_tests(output: &str) -> Vec<String> {
    let mut failing = Vec::new();
    for line in output.lines() {
        let line = line.trim();
        if let Some((_, rest)) = line.split_once("FAILED ") {
            if let Some(name) = rest.split_whitespace().next() {
                failing.push(name.to_string());
            }
        } else if let Some((_, rest)) = line.split_once("FAIL: ") {
            failing.push(rest.trim().to_string());
        }
    }
    failing
}
