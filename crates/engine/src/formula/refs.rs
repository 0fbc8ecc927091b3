//! Reference extraction from formula AST.
//!
//! Extracts the set of cell names a formula reads, for dependency graph
//! construction. Constants were already folded to literals by the parser
//! and function names live only on `Call` nodes, so every `Ref` leaf is a
//! genuine cell reference.

use rustc_hash::FxHashSet;

use crate::name::CellName;

use super::parser::Expr;

/// Extract all cell references from an expression.
///
/// Duplicate references collapse to one set membership - the graph has no
/// multi-edges.
pub fn extract_refs(expr: &Expr) -> FxHashSet<CellName> {
    let mut refs = FxHashSet::default();
    collect_refs(expr, &mut refs);
    refs
}

fn collect_refs(expr: &Expr, refs: &mut FxHashSet<CellName>) {
    match expr {
        Expr::Number(_) => {}
        Expr::Ref(name) => {
            refs.insert(name.clone());
        }
        Expr::Call { args, .. } => {
            for arg in args {
                collect_refs(arg, refs);
            }
        }
        Expr::BinaryOp { left, right, .. } => {
            collect_refs(left, refs);
            collect_refs(right, refs);
        }
    }
}
