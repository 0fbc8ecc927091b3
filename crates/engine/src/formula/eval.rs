// Formula evaluator - evaluates expression trees against a value snapshot

use serde::{Deserialize, Serialize};

use crate::name::CellName;

use super::functions;
use super::parser::{Expr, Op};

/// The closed set of cell-local error kinds.
///
/// Every error is recoverable: it is stored as the cell's value and shown
/// with a spreadsheet-style marker. Nothing here ever aborts recalculation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CellError {
    /// Content could not be parsed
    Syntax,
    /// Formula references a cell that does not exist or was deleted
    UndefinedRef,
    /// Cell participates in a dependency cycle
    CircularRef,
    DivByZero,
    /// Function argument outside its mathematical domain
    Domain,
    /// Unknown function name or wrong argument count
    InvalidFunction,
}

impl CellError {
    /// Display marker, in the familiar spreadsheet style.
    pub fn marker(&self) -> &'static str {
        match self {
            CellError::Syntax => "#SYNTAX!",
            CellError::UndefinedRef => "#REF!",
            CellError::CircularRef => "#CYCLE!",
            CellError::DivByZero => "#DIV/0!",
            CellError::Domain => "#NUM!",
            CellError::InvalidFunction => "#NAME?",
        }
    }
}

impl std::fmt::Display for CellError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.marker())
    }
}

/// A cell's evaluation result: a number or an error kind, never both.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Number(f64),
    Error(CellError),
}

impl Value {
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            Value::Error(_) => None,
        }
    }

    pub fn error(&self) -> Option<CellError> {
        match self {
            Value::Number(_) => None,
            Value::Error(e) => Some(*e),
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Value::Error(_))
    }

    /// Change detection that treats NaN as equal to itself, so a NaN-valued
    /// cell does not report as changed on every recalculation.
    pub fn same_as(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Number(a), Value::Number(b)) => {
                a == b || (a.is_nan() && b.is_nan())
            }
            (Value::Error(a), Value::Error(b)) => a == b,
            _ => false,
        }
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Number(n) => {
                if n.fract() == 0.0 && n.abs() < 1e15 {
                    write!(f, "{}", *n as i64)
                } else {
                    write!(f, "{}", n)
                }
            }
            Value::Error(e) => f.write_str(e.marker()),
        }
    }
}

/// Read-only snapshot of cell values, as seen during one recalculation.
///
/// `None` means the cell does not exist (which evaluates to
/// `UndefinedRef`, not zero).
pub trait ValueLookup {
    fn value(&self, name: &CellName) -> Option<Value>;
}

impl ValueLookup for rustc_hash::FxHashMap<CellName, Value> {
    fn value(&self, name: &CellName) -> Option<Value> {
        self.get(name).copied()
    }
}

/// Evaluate an expression tree against a snapshot.
///
/// Error propagation: operands and arguments are evaluated left to right
/// and the first error wins; any error flowing into an operation becomes
/// the operation's result unchanged.
pub fn evaluate<L: ValueLookup>(expr: &Expr, lookup: &L) -> Result<f64, CellError> {
    match expr {
        Expr::Number(n) => Ok(*n),
        Expr::Ref(name) => match lookup.value(name) {
            None => Err(CellError::UndefinedRef),
            Some(Value::Error(e)) => Err(e),
            Some(Value::Number(n)) => Ok(n),
        },
        Expr::BinaryOp { op, left, right } => {
            let lhs = evaluate(left, lookup)?;
            let rhs = evaluate(right, lookup)?;
            match op {
                Op::Add => Ok(lhs + rhs),
                Op::Sub => Ok(lhs - rhs),
                Op::Mul => Ok(lhs * rhs),
                Op::Div => {
                    if rhs == 0.0 {
                        Err(CellError::DivByZero)
                    } else {
                        Ok(lhs / rhs)
                    }
                }
                Op::Pow => Ok(lhs.powf(rhs)),
            }
        }
        Expr::Call { name, args } => {
            let mut values = Vec::with_capacity(args.len());
            for arg in args {
                values.push(evaluate(arg, lookup)?);
            }
            functions::call(name, &values)
        }
    }
}
