/// Mutation operator definitions for Python.
/// Each operator recognizes a category of tree-sitter node and produces
/// full replacement texts for that node's span.
use tree_sitter::Node;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    Arithmetic,
    Comparison,
    Logical,
    Unary,
    Boolean,
    NumericConstant,
    StringConstant,
    ConditionalBoundary,
    StatementDeletion,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Arithmetic => "arithmetic",
            Category::Comparison => "comparison",
            Category::Logical => "logical",
            Category::Unary => "unary",
            Category::Boolean => "boolean",
            Category::NumericConstant => "numeric_constant",
            Category::StringConstant => "string_constant",
            Category::ConditionalBoundary => "conditional_boundary",
            Category::StatementDeletion => "statement_deletion",
        }
    }
}

pub trait MutationOperator {
    fn name(&self) -> &'static str;
    fn description(&self) -> &'static str;
    fn category(&self) -> Category;
    /// Structural predicate: node kind and, for operator nodes, the
    /// specific operator token. Must not look outside the node.
    fn can_mutate(&self, node: Node, source: &str) -> bool;
    /// Replacement texts for the node's span. Never touches the input.
    fn mutate(&self, node: Node, source: &str) -> Vec<String>;
}

pub(crate) fn node_text<'a>(node: Node, source: &'a str) -> &'a str {
    &source[node.start_byte()..node.end_byte()]
}

// --- Arithmetic ---

const ARITHMETIC_TABLE: &[(&str, &[&str])] = &[
    ("+", &["-", "*"]),
    ("-", &["+", "*"]),
    ("*", &["+", "-", "/"]),
    ("/", &["*", "//"]),
    ("//", &["/", "%"]),
    ("%", &["//", "*"]),
    ("**", &["*", "/"]),
];

fn arithmetic_alternatives(op: &str) -> Option<&'static [&'static str]> {
    ARITHMETIC_TABLE
        .iter()
        .find(|(token, _)| *token == op)
        .map(|(_, alts)| *alts)
}

pub struct ArithmeticOperator;

impl MutationOperator for ArithmeticOperator {
    fn name(&self) -> &'static str {
        "arithmetic"
    }

    fn description(&self) -> &'static str {
        "Swaps arithmetic operators (+, -, *, /, //, %, **)"
    }

    fn category(&self) -> Category {
        Category::Arithmetic
    }

    fn can_mutate(&self, node: Node, _source: &str) -> bool {
        node.kind() == "binary_operator"
            && node
                .child_by_field_name("operator")
                .is_some_and(|op| arithmetic_alternatives(op.kind()).is_some())
    }

    fn mutate(&self, node: Node, source: &str) -> Vec<String> {
        let (Some(left), Some(op), Some(right)) = (
            node.child_by_field_name("left"),
            node.child_by_field_name("operator"),
            node.child_by_field_name("right"),
        ) else {
            return vec![];
        };
        let Some(alternatives) = arithmetic_alternatives(op.kind()) else {
            return vec![];
        };
        alternatives
            .iter()
            .map(|alt| {
                format!(
                    "{} {} {}",
                    node_text(left, source),
                    alt,
                    node_text(right, source)
                )
            })
            .collect()
    }
}

// --- Comparison ---

const ALL_COMPARATORS: &[&str] = &[
    "==", "!=", "<", "<=", ">", ">=", "<>", "in", "not in", "is", "is not",
];

const COMPARISON_TABLE: &[(&str, &[&str])] = &[
    ("==", &["!=", "<", ">"]),
    ("!=", &["=="]),
    ("<", &["<=", ">", "=="]),
    ("<=", &["<", ">=", "!="]),
    (">", &[">=", "<", "=="]),
    (">=", &[">", "<=", "!="]),
];

/// The single comparator token of a non-chained comparison, if any.
/// Chained comparisons (`a < b < c`) are left alone.
fn single_comparator(node: Node) -> Option<Node> {
    if node.kind() != "comparison_operator" {
        return None;
    }
    let mut comparators = (0..node.child_count())
        .filter_map(|i| node.child(i))
        .filter(|child| ALL_COMPARATORS.contains(&child.kind()));
    let first = comparators.next()?;
    if comparators.next().is_some() {
        return None;
    }
    Some(first)
}

fn rebuild_comparison(node: Node, source: &str, new_op: &str) -> Option<String> {
    let left = node.child(0)?;
    let right = node.child(node.child_count().checked_sub(1)?)?;
    Some(format!(
        "{} {} {}",
        node_text(left, source),
        new_op,
        node_text(right, source)
    ))
}

pub struct ComparisonOperator;

impl MutationOperator for ComparisonOperator {
    fn name(&self) -> &'static str {
        "comparison"
    }

    fn description(&self) -> &'static str {
        "Swaps comparison operators (==, !=, <, <=, >, >=)"
    }

    fn category(&self) -> Category {
        Category::Comparison
    }

    fn can_mutate(&self, node: Node, _source: &str) -> bool {
        single_comparator(node)
            .is_some_and(|op| COMPARISON_TABLE.iter().any(|(token, _)| *token == op.kind()))
    }

    fn mutate(&self, node: Node, source: &str) -> Vec<String> {
        let Some(op) = single_comparator(node) else {
            return vec![];
        };
        let Some((_, alternatives)) = COMPARISON_TABLE
            .iter()
            .find(|(token, _)| *token == op.kind())
        else {
            return vec![];
        };
        alternatives
            .iter()
            .filter_map(|alt| rebuild_comparison(node, source, alt))
            .collect()
    }
}

// --- Conditional boundary ---

const BOUNDARY_TABLE: &[(&str, &str)] = &[("<", "<="), ("<=", "<"), (">", ">="), (">=", ">")];

pub struct ConditionalBoundaryOperator;

impl MutationOperator for ConditionalBoundaryOperator {
    fn name(&self) -> &'static str {
        "boundary"
    }

    fn description(&self) -> &'static str {
        "Swaps conditional boundaries (< to <=, > to >=)"
    }

    fn category(&self) -> Category {
        Category::ConditionalBoundary
    }

    fn can_mutate(&self, node: Node, _source: &str) -> bool {
        single_comparator(node)
            .is_some_and(|op| BOUNDARY_TABLE.iter().any(|(token, _)| *token == op.kind()))
    }

    fn mutate(&self, node: Node, source: &str) -> Vec<String> {
        let Some(op) = single_comparator(node) else {
            return vec![];
        };
        let Some((_, swapped)) = BOUNDARY_TABLE
            .iter()
            .find(|(token, _)| *token == op.kind())
        else {
            return vec![];
        };
        rebuild_comparison(node, source, swapped)
            .into_iter()
            .collect()
    }
}

// --- Logical ---

pub struct LogicalOperator;

impl MutationOperator for LogicalOperator {
    fn name(&self) -> &'static str {
        "logical"
    }

    fn description(&self) -> &'static str {
        "Swaps logical operators (and, or)"
    }

    fn category(&self) -> Category {
        Category::Logical
    }

    fn can_mutate(&self, node: Node, _source: &str) -> bool {
        node.kind() == "boolean_operator"
            && node
                .child_by_field_name("operator")
                .is_some_and(|op| op.kind() == "and" || op.kind() == "or")
    }

    fn mutate(&self, node: Node, source: &str) -> Vec<String> {
        let (Some(left), Some(op), Some(right)) = (
            node.child_by_field_name("left"),
            node.child_by_field_name("operator"),
            node.child_by_field_name("right"),
        ) else {
            return vec![];
        };
        let swapped = match op.kind() {
            "and" => "or",
            "or" => "and",
            _ => return vec![],
        };
        vec![format!(
            "{} {} {}",
            node_text(left, source),
            swapped,
            node_text(right, source)
        )]
    }
}

// --- Unary ---

pub struct UnaryOperator;

impl MutationOperator for UnaryOperator {
    fn name(&self) -> &'static str {
        "unary"
    }

    fn description(&self) -> &'static str {
        "Removes unary operators (not, +, -) and flips signs"
    }

    fn category(&self) -> Category {
        Category::Unary
    }

    fn can_mutate(&self, node: Node, _source: &str) -> bool {
        match node.kind() {
            "not_operator" => true,
            "unary_operator" => node
                .child_by_field_name("operator")
                .is_some_and(|op| op.kind() == "+" || op.kind() == "-"),
            _ => false,
        }
    }

    fn mutate(&self, node: Node, source: &str) -> Vec<String> {
        let Some(operand) = node.child_by_field_name("argument") else {
            return vec![];
        };
        let operand_text = node_text(operand, source).to_string();
        // Removing the operator is the primary mutation for all three.
        let mut variants = vec![operand_text.clone()];
        if node.kind() == "unary_operator" {
            if let Some(op) = node.child_by_field_name("operator") {
                let flipped = match op.kind() {
                    "+" => Some("-"),
                    "-" => Some("+"),
                    _ => None,
                };
                if let Some(flipped) = flipped {
                    variants.push(format!("{flipped}{operand_text}"));
                }
            }
        }
        variants
    }
}

// --- Boolean constants ---

pub struct BooleanLiteralOperator;

impl MutationOperator for BooleanLiteralOperator {
    fn name(&self) -> &'static str {
        "bool_literal"
    }

    fn description(&self) -> &'static str {
        "Flips boolean constants (True <-> False)"
    }

    fn category(&self) -> Category {
        Category::Boolean
    }

    fn can_mutate(&self, node: Node, _source: &str) -> bool {
        node.kind() == "true" || node.kind() == "false"
    }

    fn mutate(&self, node: Node, _source: &str) -> Vec<String> {
        match node.kind() {
            "true" => vec!["False".to_string()],
            "false" => vec!["True".to_string()],
            _ => vec![],
        }
    }
}

// --- Numeric constants ---

enum NumberValue {
    Int(i64),
    Float(f64),
}

fn parse_number(text: &str) -> Option<NumberValue> {
    let cleaned = text.replace('_', "");
    if let Ok(value) = cleaned.parse::<i64>() {
        return Some(NumberValue::Int(value));
    }
    cleaned.parse::<f64>().ok().map(NumberValue::Float)
}

fn format_float(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{value:.1}")
    } else {
        format!("{value}")
    }
}

pub struct NumericLiteralOperator;

impl MutationOperator for NumericLiteralOperator {
    fn name(&self) -> &'static str {
        "number"
    }

    fn description(&self) -> &'static str {
        "Mutates numeric constants (increment, decrement, zero, one)"
    }

    fn category(&self) -> Category {
        Category::NumericConstant
    }

    fn can_mutate(&self, node: Node, source: &str) -> bool {
        (node.kind() == "integer" || node.kind() == "float")
            && parse_number(node_text(node, source)).is_some()
    }

    fn mutate(&self, node: Node, source: &str) -> Vec<String> {
        let text = node_text(node, source);
        let formatted = match parse_number(text) {
            Some(NumberValue::Int(value)) => {
                let candidates = match value {
                    0 => vec![1, -1],
                    1 => vec![0, 2, -1],
                    -1 => vec![0, 1, -2],
                    _ => vec![value + 1, value - 1, 0, 1, -1],
                };
                candidates
                    .into_iter()
                    .filter(|c| *c != value)
                    .map(|c| c.to_string())
                    .collect::<Vec<_>>()
            }
            Some(NumberValue::Float(value)) => {
                let candidates = if value == 0.0 {
                    vec![1.0, -1.0]
                } else if value == 1.0 {
                    vec![0.0, 2.0, -1.0]
                } else if value == -1.0 {
                    vec![0.0, 1.0, -2.0]
                } else {
                    vec![value + 1.0, value - 1.0, 0.0, 1.0, -1.0]
                };
                candidates
                    .into_iter()
                    .filter(|c| *c != value)
                    .map(format_float)
                    .collect::<Vec<_>>()
            }
            None => return vec![],
        };
        let mut variants: Vec<String> = Vec::new();
        for candidate in formatted {
            if !variants.contains(&candidate) {
                variants.push(candidate);
            }
        }
        variants
    }
}

// --- String constants ---

/// Quote char and raw inner content of a plain string literal.
/// f-strings, raw/byte strings, and triple-quoted strings are excluded.
fn plain_string_parts(node: Node, source: &str) -> Option<(char, String)> {
    if node.kind() != "string" {
        return None;
    }
    let start = node.child(0)?;
    if start.kind() != "string_start" {
        return None;
    }
    let start_text = node_text(start, source);
    if start_text != "\"" && start_text != "'" {
        return None;
    }
    let quote = start_text.chars().next()?;
    let end = node.child(node.child_count().checked_sub(1)?)?;
    if end.kind() != "string_end" {
        return None;
    }
    let content = source[start.end_byte()..end.start_byte()].to_string();
    Some((quote, content))
}

pub struct StringLiteralOperator;

impl MutationOperator for StringLiteralOperator {
    fn name(&self) -> &'static str {
        "string"
    }

    fn description(&self) -> &'static str {
        "Mutates string constants (empty string, different content)"
    }

    fn category(&self) -> Category {
        Category::StringConstant
    }

    fn can_mutate(&self, node: Node, source: &str) -> bool {
        plain_string_parts(node, source).is_some()
    }

    fn mutate(&self, node: Node, source: &str) -> Vec<String> {
        let Some((quote, content)) = plain_string_parts(node, source) else {
            return vec![];
        };
        let candidates: Vec<String> = if content.is_empty() {
            vec!["mutant".to_string(), "X".to_string(), " ".to_string()]
        } else if content.chars().count() == 1 {
            vec![
                String::new(),
                "XX".to_string(),
                content.to_uppercase(),
                content.to_lowercase(),
            ]
        } else {
            let case_flipped = if content.chars().any(|c| c.is_lowercase()) {
                content.to_uppercase()
            } else {
                content.to_lowercase()
            };
            let mut dropped = content.clone();
            dropped.pop();
            vec![
                String::new(),
                "mutant".to_string(),
                dropped,
                format!("{content}X"),
                case_flipped,
            ]
        };
        let mut variants: Vec<String> = Vec::new();
        for candidate in candidates {
            if candidate != content && !variants.contains(&candidate) {
                variants.push(candidate);
            }
        }
        variants.truncate(3);
        variants
            .into_iter()
            .map(|v| format!("{quote}{v}{quote}"))
            .collect()
    }
}

// --- Statement deletion ---

pub struct StatementDeletionOperator;

impl MutationOperator for StatementDeletionOperator {
    fn name(&self) -> &'static str {
        "stmt_delete"
    }

    fn description(&self) -> &'static str {
        "Replaces a statement with pass to test its necessity"
    }

    fn category(&self) -> Category {
        Category::StatementDeletion
    }

    fn can_mutate(&self, node: Node, _source: &str) -> bool {
        // expression_statement covers assignments, augmented assignments,
        // and bare expressions.
        node.kind() == "expression_statement" || node.kind() == "return_statement"
    }

    fn mutate(&self, _node: Node, _source: &str) -> Vec<String> {
        vec!["pass".to_string()]
    }
}

// --- Registry ---

/// Explicit operator registry, constructed once by the engine entry point.
/// No process-wide mutable state.
pub struct OperatorRegistry {
    operators: Vec<Box<dyn MutationOperator>>,
}

impl OperatorRegistry {
    pub fn with_defaults() -> Self {
        Self {
            operators: vec![
                Box::new(ArithmeticOperator),
                Box::new(ComparisonOperator),
                Box::new(LogicalOperator),
                Box::new(UnaryOperator),
                Box::new(BooleanLiteralOperator),
                Box::new(NumericLiteralOperator),
                Box::new(StringLiteralOperator),
                Box::new(ConditionalBoundaryOperator),
                Box::new(StatementDeletionOperator),
            ],
        }
    }

    /// Keep only operators whose name appears in `names`.
    pub fn retain_named(&mut self, names: &[String]) {
        self.operators
            .retain(|op| names.iter().any(|n| n == op.name()));
    }

    pub fn get(&self, name: &str) -> Option<&dyn MutationOperator> {
        self.operators
            .iter()
            .find(|op| op.name() == name)
            .map(|op| op.as_ref())
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.operators.iter().map(|op| op.name()).collect()
    }

    pub fn applicable_names(&self, node: Node, source: &str) -> Vec<&'static str> {
        self.operators
            .iter()
            .filter(|op| op.can_mutate(node, source))
            .map(|op| op.name())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.operators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operators.is_empty()
    }
}

impl Default for OperatorRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}
