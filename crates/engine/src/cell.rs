use rustc_hash::FxHashSet;

use crate::formula::eval::Value;
use crate::formula::parser::{self, Expr};
use crate::formula::refs;
use crate::name::CellName;

/// A cell's stored content: a numeric literal or a formula.
///
/// The formula variant keeps both the raw source (so the user's input
/// survives verbatim, even when it fails to parse) and the cached AST.
/// `ast: None` means the content is unparsable and the cell evaluates to a
/// syntax error.
#[derive(Debug, Clone, PartialEq)]
pub enum CellContent {
    Number(f64),
    Formula { source: String, ast: Option<Expr> },
}

impl CellContent {
    /// Classify raw input. `=`-prefixed input is a formula; input that
    /// parses as a number is a literal; anything else is committed as-is
    /// and will evaluate to a syntax error.
    pub fn from_input(input: &str) -> Self {
        let trimmed = input.trim();

        if trimmed.starts_with('=') {
            let ast = parser::parse(trimmed).ok();
            return CellContent::Formula {
                source: trimmed.to_string(),
                ast,
            };
        }

        if let Ok(num) = trimmed.parse::<f64>() {
            return CellContent::Number(num);
        }

        CellContent::Formula {
            source: trimmed.to_string(),
            ast: None,
        }
    }

    pub fn is_formula(&self) -> bool {
        matches!(self, CellContent::Formula { .. })
    }

    pub fn formula_ast(&self) -> Option<&Expr> {
        match self {
            CellContent::Formula { ast, .. } => ast.as_ref(),
            CellContent::Number(_) => None,
        }
    }

    /// The cell names this content reads. Empty for literals and for
    /// unparsable content (no derivable references).
    pub fn refs(&self) -> FxHashSet<CellName> {
        match self.formula_ast() {
            Some(ast) => refs::extract_refs(ast),
            None => FxHashSet::default(),
        }
    }

    /// The content as the user entered it.
    pub fn raw_display(&self) -> String {
        match self {
            CellContent::Number(n) => {
                if n.fract() == 0.0 && n.abs() < 1e15 {
                    format!("{}", *n as i64)
                } else {
                    format!("{}", n)
                }
            }
            CellContent::Formula { source, .. } => source.clone(),
        }
    }
}

/// One cell of the canvas: its content plus the last computed result.
#[derive(Debug, Clone)]
pub struct Cell {
    pub content: CellContent,
    /// Last computed result. Placeholder until the first recalculation,
    /// which happens within the same edit that creates the cell.
    pub value: Value,
}

impl Cell {
    pub fn new(content: CellContent) -> Self {
        Self {
            content,
            value: Value::Number(0.0),
        }
    }
}
