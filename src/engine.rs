use std::fs;
use std::path::{Path, PathBuf};

use tree_sitter::Node;

use crate::discovery::{self, MutationPoint};
use crate::error::{ConstructionError, MutationError};
use crate::mutants::Mutant;
use crate::operators::{MutationOperator, OperatorRegistry, node_text};

#[derive(Debug, Clone)]
pub struct GenerateOptions {
    /// Restrict mutation to these function names.
    pub target_functions: Option<Vec<String>>,
    /// Restrict mutation to these operator names.
    pub operators: Option<Vec<String>>,
    /// Hard cap on generated mutants; generation short-circuits once hit.
    pub max_mutants: usize,
}

impl Default for GenerateOptions {
    fn default() -> Self {
        Self {
            target_functions: None,
            operators: None,
            max_mutants: 50,
        }
    }
}

/// Generates mutants without ever writing to the original file. All
/// mutated content lives in a session-owned scratch directory that is
/// removed on `cleanup()` or drop, including panic unwinds.
pub struct MutationSession {
    registry: OperatorRegistry,
    scratch: Option<tempfile::TempDir>,
    scratch_files: Vec<PathBuf>,
    id: String,
}

impl MutationSession {
    pub fn new() -> Result<Self, MutationError> {
        Self::with_registry(OperatorRegistry::with_defaults())
    }

    pub fn with_registry(registry: OperatorRegistry) -> Result<Self, MutationError> {
        let id = format!("{:08x}", fastrand::u32(..));
        let scratch = tempfile::Builder::new()
            .prefix(&format!("mutation-{id}-"))
            .tempdir()
            .map_err(MutationError::Scratch)?;
        Ok(Self {
            registry,
            scratch: Some(scratch),
            scratch_files: Vec::new(),
            id,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn registry(&self) -> &OperatorRegistry {
        &self.registry
    }

    /// The scratch directory, or None once the session is cleaned up.
    pub fn scratch_dir(&self) -> Option<&Path> {
        self.scratch.as_ref().map(|dir| dir.path())
    }

    pub fn scratch_files(&self) -> &[PathBuf] {
        &self.scratch_files
    }

    pub fn generate_mutants(
        &mut self,
        file: &Path,
        options: &GenerateOptions,
    ) -> Result<Vec<Mutant>, MutationError> {
        let scratch_root = self
            .scratch
            .as_ref()
            .ok_or(MutationError::SessionClosed)?
            .path()
            .to_path_buf();

        let source = fs::read_to_string(file).map_err(|e| MutationError::Io {
            path: file.to_path_buf(),
            source: e,
        })?;
        let tree = discovery::parse(&source, file)?;

        let points = discovery::find_mutation_points(
            tree.root_node(),
            &source,
            &self.registry,
            options.target_functions.as_deref(),
        );

        let mut mutants = Vec::new();
        'points: for point in &points {
            for op_name in &point.operators {
                if let Some(filter) = &options.operators {
                    if !filter.iter().any(|n| n == op_name) {
                        continue;
                    }
                }
                let Some(operator) = self.registry.get(op_name) else {
                    continue;
                };
                for replacement in operator.mutate(point.node, &source) {
                    if mutants.len() >= options.max_mutants {
                        break 'points;
                    }
                    match build_mutant(&scratch_root, file, &source, point, operator, &replacement)
                    {
                        Ok(mutant) => {
                            self.scratch_files.push(mutant.file.clone());
                            mutants.push(mutant);
                        }
                        Err(e) => {
                            tracing::warn!(
                                "skipping {} candidate at line {}: {}",
                                op_name,
                                point.line,
                                e
                            );
                        }
                    }
                }
            }
        }
        Ok(mutants)
    }

    /// Remove every scratch file and the scratch directory. Idempotent;
    /// also invoked from Drop so the scratch area cannot outlive the
    /// session on any exit path.
    pub fn cleanup(&mut self) {
        for file in self.scratch_files.drain(..) {
            if file.exists() {
                if let Err(e) = fs::remove_file(&file) {
                    tracing::warn!("could not remove scratch file {}: {}", file.display(), e);
                }
            }
        }
        if let Some(dir) = self.scratch.take() {
            if let Err(e) = dir.close() {
                tracing::warn!("could not remove scratch directory: {}", e);
            }
        }
    }
}

impl Drop for MutationSession {
    fn drop(&mut self) {
        self.cleanup();
    }
}

/// Node kinds whose text must also match when locating the equivalent
/// node in a copied tree.
const LITERAL_KINDS: &[&str] = &["true", "false", "integer", "float", "string"];

fn build_mutant(
    scratch_root: &Path,
    file: &Path,
    source: &str,
    point: &MutationPoint,
    operator: &dyn MutationOperator,
    replacement: &str,
) -> Result<Mutant, ConstructionError> {
    let not_found = || ConstructionError::NodeNotFound {
        kind: point.node.kind(),
        line: point.line,
        column: point.column,
    };

    // Work on a fresh parse of the original, never the discovery tree.
    // The target is re-located by content key, not by identity.
    let copy = discovery::parse_raw(source).ok_or_else(not_found)?;
    let target = locate_equivalent(copy.root_node(), point.node, source).ok_or_else(not_found)?;

    let mut mutated_source = String::with_capacity(source.len() + replacement.len());
    mutated_source.push_str(&source[..target.start_byte()]);
    mutated_source.push_str(replacement);
    mutated_source.push_str(&source[target.end_byte()..]);

    // The scratch file must stand alone as valid source.
    let reparsed = discovery::parse_raw(&mutated_source);
    if !reparsed.is_some_and(|t| !t.root_node().has_error()) {
        return Err(ConstructionError::InvalidSyntax {
            operator: operator.name().to_string(),
            line: point.line,
        });
    }

    let id = format!("{:08x}", fastrand::u32(..));
    let stem = file.file_stem().and_then(|s| s.to_str()).unwrap_or("module");
    let extension = file.extension().and_then(|s| s.to_str()).unwrap_or("py");
    let scratch_path = scratch_root.join(format!("{stem}_{id}.{extension}"));
    fs::write(&scratch_path, &mutated_source).map_err(|e| ConstructionError::Write {
        path: scratch_path.clone(),
        source: e,
    })?;

    Ok(Mutant {
        id,
        operator: operator.name().to_string(),
        original: node_text(target, source).to_string(),
        mutated: replacement.to_string(),
        line: point.line,
        column: point.column,
        function: point.function.clone(),
        description: format!("{} at line {}", operator.description(), point.line),
        diff: generate_diff(source, &mutated_source),
        file: scratch_path,
    })
}

fn locate_equivalent<'t>(node: Node<'t>, target: Node, source: &str) -> Option<Node<'t>> {
    if nodes_match(node, target, source) {
        return Some(node);
    }
    for i in 0..node.child_count() {
        if let Some(found) = node
            .child(i)
            .and_then(|child| locate_equivalent(child, target, source))
        {
            return Some(found);
        }
    }
    None
}

fn nodes_match(candidate: Node, target: Node, source: &str) -> bool {
    candidate.kind() == target.kind()
        && candidate.start_position() == target.start_position()
        && candidate.end_position() == target.end_position()
        && (!LITERAL_KINDS.contains(&candidate.kind())
            || node_text(candidate, source) == node_text(target, source))
}

/// Unified line diff between original and mutated source, carried on
/// each mutant for downstream reporting.
pub fn generate_diff(original: &str, mutated: &str) -> String {
    use similar::TextDiff;
    let diff = TextDiff::from_lines(original, mutated);
    let mut output = String::new();
    for change in diff.iter_all_changes() {
        match change.tag() {
            similar::ChangeTag::Delete => {
                output.push_str(&format!("- {}", change));
            }
            similar::ChangeTag::Insert => {
                output.push_str(&format!("+ {}", change));
            }
            _ => {}
        }
    }
    output
}
