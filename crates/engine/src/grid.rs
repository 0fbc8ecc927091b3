//! The recalculation controller.
//!
//! [`Grid`] owns the cell table and the dependency graph, and processes
//! one edit at a time: parse, extract references, commit edges, plan, then
//! evaluate exactly the affected closure in dependency order. Errors are
//! cell-local and recoverable; an edit never fails and never leaves other
//! cells unrecalculated.
//!
//! Single-threaded by design: an edit is fully processed before the next
//! is accepted, so every recalculation observes a consistent graph and a
//! consistent value table.

use std::collections::hash_map::Entry;
use std::time::Instant;

use rustc_hash::{FxHashMap, FxHashSet};

use crate::cell::{Cell, CellContent};
use crate::dep_graph::DepGraph;
use crate::formula::eval::{self, CellError, Value, ValueLookup};
use crate::formula::parser;
use crate::formula::refs::extract_refs;
use crate::name::CellName;
use crate::recalc::{CellChange, CycleReport, RecalcPlan, RecalcReport};

/// A canvas of named cells with reactive recalculation.
///
/// Explicitly owned: construct with [`Grid::new`], reset with
/// [`Grid::clear`]. There is no process-wide instance.
#[derive(Debug, Clone)]
pub struct Grid {
    cells: FxHashMap<CellName, Cell>,
    graph: DepGraph,
    /// Next candidate for `E<n>` auto-naming.
    auto_counter: u64,
}

impl Default for Grid {
    fn default() -> Self {
        Self::new()
    }
}

impl ValueLookup for Grid {
    fn value(&self, name: &CellName) -> Option<Value> {
        self.cells.get(name).map(|c| c.value)
    }
}

impl Grid {
    /// Create an empty grid.
    pub fn new() -> Self {
        Self {
            cells: FxHashMap::default(),
            graph: DepGraph::new(),
            auto_counter: 1,
        }
    }

    /// Remove every cell and all edges.
    pub fn clear(&mut self) {
        self.cells.clear();
        self.graph = DepGraph::new();
        self.auto_counter = 1;
    }

    /// Define or redefine a cell.
    ///
    /// Content is committed unconditionally - a syntax error or a cycle
    /// still stores the user's input; the error shows up as the cell's
    /// value instead. A syntax error clears the cell's outgoing edges
    /// (an unparsable formula has no derivable references), and the
    /// cell's dependents recompute against its new error value.
    pub fn define(&mut self, name: CellName, input: &str) -> RecalcReport {
        let start = Instant::now();

        let content = CellContent::from_input(input);
        let new_refs = content.refs();

        self.note_name(&name);

        // Replace content, keeping the previous value until the plan runs
        // so change detection sees the old result.
        match self.cells.entry(name.clone()) {
            Entry::Occupied(mut entry) => entry.get_mut().content = content,
            Entry::Vacant(entry) => {
                entry.insert(Cell::new(content));
            }
        }

        // Commit edges even when this forms a cycle: the plan marks cycle
        // members and they evaluate to the circular-reference error.
        self.graph.replace_edges(&name, new_refs);

        let plan = self.graph.recalc_plan(&name);
        self.run_plan(plan, Some(&name), start)
    }

    /// Delete a cell.
    ///
    /// The cell's own edges are severed; former dependents keep their
    /// reference (their content did not change) and recompute to an
    /// undefined-reference error.
    pub fn remove(&mut self, name: &CellName) -> RecalcReport {
        let start = Instant::now();

        if self.cells.remove(name).is_none() {
            return RecalcReport::new();
        }
        self.graph.clear_cell(name);

        let plan = self.graph.recalc_plan(name);
        self.run_plan(plan, None, start)
    }

    /// Recompute every formula cell in dependency order.
    ///
    /// Used after replaying a document load, where per-record reports are
    /// meaningless and only the final state matters. The result does not
    /// depend on the order records were replayed in.
    pub fn recompute_all(&mut self) -> RecalcReport {
        let start = Instant::now();

        let members: FxHashSet<CellName> = self
            .cells
            .iter()
            .filter(|(_, cell)| cell.content.is_formula())
            .map(|(name, _)| name.clone())
            .collect();

        let plan = self.graph.plan_for(members);
        self.run_plan(plan, None, start)
    }

    /// Pre-flight check: would committing `input` at `name` create a
    /// dependency cycle?
    ///
    /// Purely advisory - [`Grid::define`] commits regardless. Front ends
    /// can use this to warn before an edit.
    pub fn check_cycle(&self, name: &CellName, input: &str) -> Result<(), CycleReport> {
        let trimmed = input.trim();
        if !trimmed.starts_with('=') {
            return Ok(());
        }
        let ast = parser::parse(trimmed)
            .map_err(|e| CycleReport::new(vec![], format!("Parse error: {}", e)))?;
        match self.graph.would_create_cycle(name, &extract_refs(&ast)) {
            Some(report) => Err(report),
            None => Ok(()),
        }
    }

    /// The cell's last computed value, or `None` if it does not exist.
    pub fn value(&self, name: &CellName) -> Option<Value> {
        self.cells.get(name).map(|c| c.value)
    }

    /// Full cell state (content and value).
    pub fn cell(&self, name: &CellName) -> Option<&Cell> {
        self.cells.get(name)
    }

    pub fn contains(&self, name: &CellName) -> bool {
        self.cells.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// All cells, unordered.
    pub fn cells(&self) -> impl Iterator<Item = (&CellName, &Cell)> {
        self.cells.iter()
    }

    /// All cell names, sorted.
    pub fn names(&self) -> Vec<CellName> {
        let mut names: Vec<CellName> = self.cells.keys().cloned().collect();
        names.sort();
        names
    }

    /// The cells `name` reads, sorted. For drawing connection lines.
    pub fn dependencies(&self, name: &CellName) -> Vec<CellName> {
        let mut deps: Vec<CellName> = self.graph.dependencies(name).cloned().collect();
        deps.sort();
        deps
    }

    /// The cells reading `name`, sorted. For drawing connection lines.
    pub fn dependents(&self, name: &CellName) -> Vec<CellName> {
        let mut readers: Vec<CellName> = self.graph.dependents(name).cloned().collect();
        readers.sort();
        readers
    }

    /// First free `E<n>` name, for front ends that create unnamed cells.
    ///
    /// The counter seeds past any `E<n>` cell ever defined, so loaded
    /// documents continue numbering where they left off.
    pub fn next_auto_name(&mut self) -> CellName {
        loop {
            let candidate = CellName::from_normalized(format!("E{}", self.auto_counter));
            self.auto_counter += 1;
            if !self.cells.contains_key(&candidate) {
                return candidate;
            }
        }
    }

    fn note_name(&mut self, name: &CellName) {
        if let Some(digits) = name.as_str().strip_prefix('E') {
            if !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()) {
                if let Ok(n) = digits.parse::<u64>() {
                    if n >= self.auto_counter {
                        self.auto_counter = n + 1;
                    }
                }
            }
        }
    }

    /// Execute an evaluation plan against the live value table.
    ///
    /// Cycle members are assigned the circular-reference error up front
    /// (never evaluated, so recalculation does not recurse into the
    /// cycle); ordered cells then evaluate top-down, each seeing the fresh
    /// values of everything it reads. Each affected cell is evaluated
    /// exactly once.
    fn run_plan(
        &mut self,
        plan: RecalcPlan,
        edited: Option<&CellName>,
        start: Instant,
    ) -> RecalcReport {
        let mut report = RecalcReport::new();
        report.had_cycles = !plan.cycle.is_empty();
        report.cycle_cells = plan.cycle.clone();

        let mut changes: Vec<CellChange> = Vec::new();

        for name in &plan.cycle {
            if let Some(cell) = self.cells.get_mut(name) {
                let old = cell.value;
                cell.value = Value::Error(CellError::CircularRef);
                report.cells_recomputed += 1;
                if !old.same_as(&cell.value) || edited == Some(name) {
                    changes.push(CellChange {
                        name: name.clone(),
                        value: cell.value,
                    });
                }
            }
        }

        for name in &plan.order {
            // A deleted cell can appear in a plan computed from its former
            // dependents' edges; there is nothing to evaluate.
            let Some(old) = self.cells.get(name).map(|c| c.value) else {
                continue;
            };

            let value = self.evaluate_cell(name);
            if let Some(cell) = self.cells.get_mut(name) {
                cell.value = value;
            }
            report.cells_recomputed += 1;

            if !old.same_as(&value) || edited == Some(name) {
                changes.push(CellChange {
                    name: name.clone(),
                    value,
                });
            }
        }

        // The edited cell leads the report, whatever the evaluation order
        if let Some(edited) = edited {
            if let Some(idx) = changes.iter().position(|c| &c.name == edited) {
                let change = changes.remove(idx);
                changes.insert(0, change);
            }
        }

        report.changes = changes;
        report.duration_ms = start.elapsed().as_millis() as u64;
        report
    }

    fn evaluate_cell(&self, name: &CellName) -> Value {
        let Some(cell) = self.cells.get(name) else {
            return Value::Error(CellError::UndefinedRef);
        };
        match &cell.content {
            CellContent::Number(n) => Value::Number(*n),
            CellContent::Formula { ast: Some(ast), .. } => match eval::evaluate(ast, self) {
                Ok(n) => Value::Number(n),
                Err(e) => Value::Error(e),
            },
            CellContent::Formula { ast: None, .. } => Value::Error(CellError::Syntax),
        }
    }
}
