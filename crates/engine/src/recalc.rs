//! Recalculation types and reporting.
//!
//! This module defines the types used for ordered recomputation and cycle
//! detection: the evaluation plan produced by the dependency graph, and
//! the per-edit report handed back to front ends for redrawing.

use serde::Serialize;

use crate::formula::eval::Value;
use crate::name::CellName;

/// Evaluation plan for one recalculation.
///
/// Produced by [`DepGraph::recalc_plan`](crate::dep_graph::DepGraph::recalc_plan)
/// for an edit, or [`DepGraph::plan_for`](crate::dep_graph::DepGraph::plan_for)
/// for a full pass.
#[derive(Debug, Clone, Default)]
pub struct RecalcPlan {
    /// Cells to evaluate, in topological order: every cell appears after
    /// all cells it depends on. Includes cells downstream of a cycle
    /// (they evaluate normally and propagate the cycle error).
    pub order: Vec<CellName>,

    /// Cells on a dependency cycle, sorted by name. These are never
    /// evaluated; they are assigned the circular-reference error directly.
    pub cycle: Vec<CellName>,
}

/// One entry in a recalculation report: a cell and its new result.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CellChange {
    pub name: CellName,
    pub value: Value,
}

/// Report from one edit-and-recalculate cycle.
///
/// `changes` is what a front end needs to redraw: the edited cell first
/// (always present, even if its value is unchanged), then every affected
/// cell whose value actually changed, in evaluation order.
#[derive(Debug, Clone, Default)]
pub struct RecalcReport {
    /// Ordered value changes for redrawing.
    pub changes: Vec<CellChange>,

    /// Number of cells that were recomputed (changed or not).
    pub cells_recomputed: usize,

    /// True if a dependency cycle was present during this recalculation.
    pub had_cycles: bool,

    /// Cells participating in cycles, sorted by name.
    pub cycle_cells: Vec<CellName>,

    /// Time taken for the full edit-and-recalculate cycle in milliseconds.
    pub duration_ms: u64,
}

impl RecalcReport {
    /// Create a new empty report.
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up the reported value for a cell, if it changed.
    pub fn value_of(&self, name: &CellName) -> Option<Value> {
        self.changes
            .iter()
            .find(|c| &c.name == name)
            .map(|c| c.value)
    }

    /// Format as a concise one-line summary for diagnostics.
    pub fn summary(&self) -> String {
        format!(
            "{} cells in {}ms, changed={}, cycles={}",
            self.cells_recomputed,
            self.duration_ms,
            self.changes.len(),
            self.had_cycles,
        )
    }

    /// Format as a one-line log entry.
    ///
    /// Format: `[recalc] 14ms  628 cells  changed=12  cycles=0`
    pub fn log_line(&self) -> String {
        format!(
            "[recalc] {:>4}ms  {} cells  changed={}  cycles={}",
            self.duration_ms,
            self.cells_recomputed,
            self.changes.len(),
            self.cycle_cells.len(),
        )
    }
}

/// Report when cycle detection finds a circular reference.
#[derive(Debug, Clone)]
pub struct CycleReport {
    /// Cells participating in the cycle.
    /// May be a subset for large cycles.
    pub cells: Vec<CellName>,

    /// Human-readable description of the cycle.
    pub message: String,
}

impl CycleReport {
    /// Create a new cycle report.
    pub fn new(cells: Vec<CellName>, message: impl Into<String>) -> Self {
        Self {
            cells,
            message: message.into(),
        }
    }

    /// Create a cycle report for a self-referencing cell.
    pub fn self_reference(cell: CellName) -> Self {
        let message = format!("Cell {} references itself", cell);
        Self {
            cells: vec![cell],
            message,
        }
    }

    /// Create a cycle report for a multi-cell cycle.
    pub fn cycle(cells: Vec<CellName>) -> Self {
        let names: Vec<&str> = cells.iter().map(|c| c.as_str()).collect();
        let message = if cells.len() <= 5 {
            format!("Circular reference: {}", names.join(" -> "))
        } else {
            format!(
                "Circular reference involving {} cells: {} -> ... -> {}",
                cells.len(),
                names[0],
                names.last().unwrap()
            )
        };
        Self { cells, message }
    }
}

impl std::fmt::Display for CycleReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CycleReport {}
