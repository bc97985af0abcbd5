use std::path::Path;

use tree_sitter::{Node, Parser, Tree};

use crate::error::MutationError;
use crate::operators::{OperatorRegistry, node_text};

/// Sentinel function name for nodes outside any function definition.
pub const MODULE_LEVEL: &str = "module_level";

/// A location eligible for at least one mutation operator.
#[derive(Debug, Clone)]
pub struct MutationPoint<'t> {
    pub node: Node<'t>,
    pub function: String,
    pub line: usize,
    pub column: usize,
    pub operators: Vec<&'static str>,
}

pub(crate) fn parse_raw(source: &str) -> Option<Tree> {
    let mut parser = Parser::new();
    let language = tree_sitter_python::LANGUAGE;
    parser
        .set_language(&language.into())
        .expect("Failed to set Python grammar");
    parser.parse(source, None)
}

/// Parse a source string, failing loudly on invalid syntax. A file that
/// does not parse must abort the session rather than yield zero mutants.
pub fn parse(source: &str, path: &Path) -> Result<Tree, MutationError> {
    let tree = parse_raw(source).ok_or_else(|| MutationError::Parse {
        path: path.to_path_buf(),
        line: 0,
        column: 0,
    })?;
    if tree.root_node().has_error() {
        let (line, column) = first_error_position(tree.root_node());
        return Err(MutationError::Parse {
            path: path.to_path_buf(),
            line,
            column,
        });
    }
    Ok(tree)
}

fn first_error_position(node: Node) -> (usize, usize) {
    if node.is_error() || node.is_missing() {
        let position = node.start_position();
        return (position.row + 1, position.column + 1);
    }
    for i in 0..node.child_count() {
        if let Some(child) = node.child(i) {
            if child.has_error() {
                return first_error_position(child);
            }
        }
    }
    let position = node.start_position();
    (position.row + 1, position.column + 1)
}

/// Walk the tree in source order and record every operator x node pair.
/// Nodes with zero applicable operators are discarded; when an allow-list
/// is given, nodes outside the listed functions are skipped.
pub fn find_mutation_points<'t>(
    root: Node<'t>,
    source: &str,
    registry: &OperatorRegistry,
    target_functions: Option<&[String]>,
) -> Vec<MutationPoint<'t>> {
    let mut points = Vec::new();
    walk(root, source, registry, target_functions, None, &mut points);
    points
}

fn walk<'t>(
    node: Node<'t>,
    source: &str,
    registry: &OperatorRegistry,
    target_functions: Option<&[String]>,
    enclosing: Option<&str>,
    points: &mut Vec<MutationPoint<'t>>,
) {
    let own_name;
    let enclosing = if node.kind() == "function_definition" {
        own_name = node
            .child_by_field_name("name")
            .map(|name| node_text(name, source).to_string());
        own_name.as_deref().or(enclosing)
    } else {
        enclosing
    };

    let function = enclosing.unwrap_or(MODULE_LEVEL);
    let in_scope = target_functions.is_none_or(|list| list.iter().any(|f| f == function));
    if in_scope {
        let operators = registry.applicable_names(node, source);
        if !operators.is_empty() {
            let position = node.start_position();
            points.push(MutationPoint {
                node,
                function: function.to_string(),
                line: position.row + 1,
                column: position.column + 1,
                operators,
            });
        }
    }

    for i in 0..node.child_count() {
        if let Some(child) = node.child(i) {
            walk(child, source, registry, target_functions, enclosing, points);
        }
    }
}

/// List all function names defined in the source, for callers that want
/// to validate a target-function allow-list up front.
pub fn list_functions(source: &str, path: &Path) -> Result<Vec<String>, MutationError> {
    let tree = parse(source, path)?;
    let mut names = Vec::new();
    collect_function_names(tree.root_node(), source, &mut names);
    Ok(names)
}

fn collect_function_names(node: Node, source: &str, names: &mut Vec<String>) {
    if node.kind() == "function_definition" {
        if let Some(name) = node.child_by_field_name("name") {
            names.push(node_text(name, source).to_string());
        }
    }
    for i in 0..node.child_count() {
        if let Some(child) = node.child(i) {
            collect_function_names(child, source, names);
        }
    }
}
