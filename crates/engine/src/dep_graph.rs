//! Dependency graph for cells.
//!
//! Tracks dependencies (cells a formula reads) and dependents (cells that
//! read a given cell) for efficient queries and ordered recomputation.
//!
//! # Edge Direction
//!
//! ```text
//! B reads A  means  A ∈ deps[B]  and  B ∈ rdeps[A]
//! ```
//!
//! This makes "what breaks if I change A?" trivial: follow `rdeps`.

use rustc_hash::{FxHashMap, FxHashSet};

use crate::name::CellName;
use crate::recalc::{CycleReport, RecalcPlan};

/// Persistent dependency graph for formula cells.
///
/// Maintains bidirectional adjacency for O(1) lookups:
/// - `deps[B]` = cells that B reads
/// - `rdeps[A]` = cells that read A
///
/// # Invariants
///
/// 1. **Bidirectional consistency:** If A ∈ deps[B] then B ∈ rdeps[A], and vice versa.
/// 2. **No dangling entries:** Empty sets are removed, not stored.
/// 3. **No duplicate edges:** Set semantics enforced by FxHashSet.
/// 4. **Atomic updates:** `replace_edges` is the only mutator that touches both maps.
///
/// The graph is exactly the union of the reference sets extracted from
/// every cell's current content; the controller re-commits a cell's row on
/// every edit so it never goes stale.
#[derive(Default, Debug, Clone)]
pub struct DepGraph {
    /// For each formula cell B, the cells it reads. B -> {A1, A2, ...}
    deps: FxHashMap<CellName, FxHashSet<CellName>>,

    /// For each referenced cell A, the formula cells reading it. A -> {B1, B2, ...}
    rdeps: FxHashMap<CellName, FxHashSet<CellName>>,
}

impl DepGraph {
    /// Create an empty dependency graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cells this cell reads (its dependencies).
    pub fn dependencies<'a>(&'a self, cell: &CellName) -> impl Iterator<Item = &'a CellName> + 'a {
        self.deps.get(cell).into_iter().flat_map(|s| s.iter())
    }

    /// Returns the cells that read this cell (its dependents).
    pub fn dependents<'a>(&'a self, cell: &CellName) -> impl Iterator<Item = &'a CellName> + 'a {
        self.rdeps.get(cell).into_iter().flat_map(|s| s.iter())
    }

    /// Returns true if this cell has dependencies tracked in the graph.
    pub fn is_tracked(&self, cell: &CellName) -> bool {
        self.deps.contains_key(cell)
    }

    /// Returns the number of cells with at least one outgoing edge.
    pub fn tracked_cell_count(&self) -> usize {
        self.deps.len()
    }

    /// Returns the number of cells referenced by at least one formula.
    pub fn referenced_cell_count(&self) -> usize {
        self.rdeps.len()
    }

    /// Replace all edges for a cell atomically.
    ///
    /// This is the primary mutation API. It:
    /// 1. Removes the cell from all its old dependencies' dependent sets
    /// 2. Clears the cell's dependency set
    /// 3. Adds the cell to all new dependencies' dependent sets
    /// 4. Sets the cell's new dependency set
    ///
    /// Pass an empty set to clear all edges for this cell.
    pub fn replace_edges(&mut self, cell: &CellName, new_deps: FxHashSet<CellName>) {
        // Step 1: Remove old edges
        if let Some(old_deps) = self.deps.remove(cell) {
            for dep in old_deps {
                if let Some(readers) = self.rdeps.get_mut(&dep) {
                    readers.remove(cell);
                    // Clean up empty entries (invariant: no dangling)
                    if readers.is_empty() {
                        self.rdeps.remove(&dep);
                    }
                }
            }
        }

        // Step 2: If no new dependencies, we're done
        if new_deps.is_empty() {
            return;
        }

        // Step 3: Add new edges
        for dep in &new_deps {
            self.rdeps
                .entry(dep.clone())
                .or_default()
                .insert(cell.clone());
        }

        // Step 4: Store new dependencies
        self.deps.insert(cell.clone(), new_deps);
    }

    /// Clear all edges for a cell (content became a literal, a syntax
    /// error, or the cell was deleted).
    ///
    /// Incoming edges are untouched: cells still referencing this name keep
    /// their edge, which is how a deleted reference surfaces as an
    /// undefined-reference error.
    pub fn clear_cell(&mut self, cell: &CellName) {
        self.replace_edges(cell, FxHashSet::default());
    }

    /// Check if giving `cell` the dependency set `new_deps` would create a
    /// cycle.
    ///
    /// Does not modify the graph. Returns `Some(CycleReport)` if a cycle
    /// would be introduced, `None` otherwise.
    ///
    /// # Algorithm
    ///
    /// A cycle is created if any of `new_deps` can reach `cell` by
    /// following dependent edges. We do a DFS from `cell` following
    /// dependents and check if we can reach any of `new_deps`.
    pub fn would_create_cycle(
        &self,
        cell: &CellName,
        new_deps: &FxHashSet<CellName>,
    ) -> Option<CycleReport> {
        // Self-reference check
        if new_deps.contains(cell) {
            return Some(CycleReport::self_reference(cell.clone()));
        }

        let mut visited: FxHashSet<&CellName> = FxHashSet::default();
        let mut stack: Vec<&CellName> = vec![cell];

        while let Some(current) = stack.pop() {
            if !visited.insert(current) {
                continue;
            }

            if let Some(readers) = self.rdeps.get(current) {
                for reader in readers {
                    if new_deps.contains(reader) {
                        // reader -> ... -> cell -> reader would close a loop
                        return Some(CycleReport::cycle(vec![reader.clone(), cell.clone()]));
                    }
                    stack.push(reader);
                }
            }
        }

        None
    }

    /// The affected closure of a cell: itself plus all transitive
    /// dependents.
    pub fn closure_of(&self, start: &CellName) -> FxHashSet<CellName> {
        let mut closure: FxHashSet<CellName> = FxHashSet::default();
        let mut stack: Vec<CellName> = vec![start.clone()];

        while let Some(current) = stack.pop() {
            if !closure.insert(current.clone()) {
                continue;
            }
            if let Some(readers) = self.rdeps.get(&current) {
                for reader in readers {
                    if !closure.contains(reader) {
                        stack.push(reader.clone());
                    }
                }
            }
        }

        closure
    }

    /// Build the evaluation plan for an edit to `start`: the affected
    /// closure, split into a topological order plus cycle members.
    pub fn recalc_plan(&self, start: &CellName) -> RecalcPlan {
        self.plan_for(self.closure_of(start))
    }

    /// Build an evaluation plan for an arbitrary set of cells.
    ///
    /// The order contains every member that is not on a cycle, arranged so
    /// each cell appears after all cells it reads (dependencies outside
    /// `members` are considered up to date and ignored). Cells downstream
    /// of a cycle are still ordered and evaluated; they surface the cycle
    /// through normal error propagation. Uses Kahn's algorithm with sorted
    /// tie-breaking for deterministic output.
    pub fn plan_for(&self, members: FxHashSet<CellName>) -> RecalcPlan {
        if members.is_empty() {
            return RecalcPlan::default();
        }

        let cycle_set = self.cycle_members(&members);

        // In-degree per member, counting only edges from acyclic members:
        // cycle cells are excluded from the order, so edges from them must
        // not hold their dependents back.
        let mut in_degree: FxHashMap<&CellName, usize> = FxHashMap::default();
        for cell in &members {
            if cycle_set.contains(cell) {
                continue;
            }
            let count = self
                .deps
                .get(cell)
                .map(|deps| {
                    deps.iter()
                        .filter(|d| members.contains(*d) && !cycle_set.contains(*d))
                        .count()
                })
                .unwrap_or(0);
            in_degree.insert(cell, count);
        }

        // Seed with zero in-degree cells, sorted in DESCENDING order so the
        // smallest name is at the end (popped first).
        let mut queue: Vec<&CellName> = in_degree
            .iter()
            .filter(|(_, &deg)| deg == 0)
            .map(|(&cell, _)| cell)
            .collect();
        queue.sort_by(|a, b| b.cmp(a));

        let mut order: Vec<CellName> = Vec::with_capacity(in_degree.len());

        while let Some(cell) = queue.pop() {
            order.push(cell.clone());

            if let Some(readers) = self.rdeps.get(cell) {
                let mut new_zero_degree: Vec<&CellName> = Vec::new();

                for reader in readers {
                    if let Some(deg) = in_degree.get_mut(reader) {
                        *deg = deg.saturating_sub(1);
                        if *deg == 0 {
                            new_zero_degree.push(reader);
                        }
                    }
                }

                // Sort then push in reverse so the smallest is popped first
                new_zero_degree.sort();
                for cell in new_zero_degree.into_iter().rev() {
                    queue.push(cell);
                }
            }
        }

        let mut cycle: Vec<CellName> = cycle_set.into_iter().collect();
        cycle.sort();

        RecalcPlan { order, cycle }
    }

    // =========================================================================
    // Cycle Membership (Tarjan's SCC)
    // =========================================================================

    /// Find the members of `within` that sit on a true cycle (SCC size > 1
    /// or self-loop).
    ///
    /// Uses iterative Tarjan's algorithm restricted to the induced
    /// subgraph, walking `deps` edges. Any cycle touching a member of
    /// `within` lies entirely inside it: the closure walk that produced
    /// `within` follows dependent edges, and every cycle participant is a
    /// transitive dependent of every other.
    fn cycle_members(&self, within: &FxHashSet<CellName>) -> FxHashSet<CellName> {
        if within.is_empty() {
            return FxHashSet::default();
        }

        // Sorted iteration order for determinism
        let mut sorted_cells: Vec<&CellName> = within.iter().collect();
        sorted_cells.sort();

        // Tarjan's state
        let mut index_counter: u32 = 0;
        let mut stack: Vec<&CellName> = Vec::new();
        let mut on_stack: FxHashSet<&CellName> = FxHashSet::default();
        let mut indices: FxHashMap<&CellName, u32> = FxHashMap::default();
        let mut lowlinks: FxHashMap<&CellName, u32> = FxHashMap::default();
        let mut result: FxHashSet<CellName> = FxHashSet::default();

        // Helper: collect sorted neighbours (dependencies inside `within`)
        let sorted_neighbours = |cell: &CellName| -> Vec<&CellName> {
            let mut neighbours: Vec<&CellName> = self
                .deps
                .get(cell)
                .into_iter()
                .flat_map(|s| s.iter())
                .filter(|d| within.contains(*d))
                .collect();
            neighbours.sort();
            neighbours
        };

        // Iterative Tarjan's to avoid stack overflow on deep graphs.
        struct DfsFrame<'a> {
            cell: &'a CellName,
            neighbours: Vec<&'a CellName>,
            next_idx: usize,
        }

        for &root in &sorted_cells {
            if indices.contains_key(root) {
                continue;
            }

            let mut dfs_stack: Vec<DfsFrame> = Vec::new();

            // Start visiting root
            let idx = index_counter;
            index_counter += 1;
            indices.insert(root, idx);
            lowlinks.insert(root, idx);
            stack.push(root);
            on_stack.insert(root);

            dfs_stack.push(DfsFrame {
                cell: root,
                neighbours: sorted_neighbours(root),
                next_idx: 0,
            });

            while let Some(frame) = dfs_stack.last_mut() {
                if frame.next_idx < frame.neighbours.len() {
                    let w = frame.neighbours[frame.next_idx];
                    frame.next_idx += 1;

                    if !indices.contains_key(w) {
                        // Recurse into w
                        let w_idx = index_counter;
                        index_counter += 1;
                        indices.insert(w, w_idx);
                        lowlinks.insert(w, w_idx);
                        stack.push(w);
                        on_stack.insert(w);

                        dfs_stack.push(DfsFrame {
                            cell: w,
                            neighbours: sorted_neighbours(w),
                            next_idx: 0,
                        });
                    } else if on_stack.contains(w) {
                        let w_idx = indices[w];
                        let v_low = lowlinks.get_mut(frame.cell).unwrap();
                        if w_idx < *v_low {
                            *v_low = w_idx;
                        }
                    }
                } else {
                    // All neighbours explored - pop and propagate lowlink
                    let finished = dfs_stack.pop().unwrap();
                    let v = finished.cell;
                    let v_low = lowlinks[v];
                    let v_idx = indices[v];

                    if let Some(parent) = dfs_stack.last() {
                        let parent_low = lowlinks.get_mut(parent.cell).unwrap();
                        if v_low < *parent_low {
                            *parent_low = v_low;
                        }
                    }

                    // SCC root check
                    if v_low == v_idx {
                        // Pop SCC from stack
                        let mut scc: Vec<&CellName> = Vec::new();
                        loop {
                            let w = stack.pop().unwrap();
                            on_stack.remove(w);
                            scc.push(w);
                            if w == v {
                                break;
                            }
                        }

                        // Include SCC if size > 1, or size == 1 with self-loop
                        if scc.len() > 1 {
                            result.extend(scc.into_iter().cloned());
                        } else if scc.len() == 1 {
                            let cell = scc[0];
                            if self.deps.get(cell).map_or(false, |d| d.contains(cell)) {
                                result.insert(cell.clone());
                            }
                        }
                    }
                }
            }
        }

        result
    }

    /// Check all invariants. Panics if any are violated.
    ///
    /// Only available in test builds.
    #[cfg(test)]
    pub fn assert_consistent(&self) {
        // Invariant 1: Bidirectional consistency (deps -> rdeps)
        for (cell, deps) in &self.deps {
            for dep in deps {
                assert!(
                    self.rdeps.get(dep).map_or(false, |s| s.contains(cell)),
                    "Missing rdeps edge: {} should have {} in dependents",
                    dep,
                    cell
                );
            }
        }

        // Invariant 1: Bidirectional consistency (rdeps -> deps)
        for (cell, readers) in &self.rdeps {
            for reader in readers {
                assert!(
                    self.deps.get(reader).map_or(false, |s| s.contains(cell)),
                    "Missing deps edge: {} should have {} in dependencies",
                    reader,
                    cell
                );
            }
        }

        // Invariant 2: No empty sets stored
        for (cell, deps) in &self.deps {
            assert!(!deps.is_empty(), "Empty deps set stored for {}", cell);
        }
        for (cell, readers) in &self.rdeps {
            assert!(!readers.is_empty(), "Empty rdeps set stored for {}", cell);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn name(s: &str) -> CellName {
        s.parse().unwrap()
    }

    fn set(cells: &[&str]) -> FxHashSet<CellName> {
        cells.iter().map(|s| name(s)).collect()
    }

    #[test]
    fn test_empty_graph() {
        let graph = DepGraph::new();

        assert_eq!(graph.tracked_cell_count(), 0);
        assert_eq!(graph.referenced_cell_count(), 0);
        assert!(!graph.is_tracked(&name("A1")));
        assert_eq!(graph.dependencies(&name("A1")).count(), 0);
        assert_eq!(graph.dependents(&name("A1")).count(), 0);

        graph.assert_consistent();
    }

    #[test]
    fn test_single_edge() {
        // B1 = A1
        let mut graph = DepGraph::new();

        graph.replace_edges(&name("B1"), set(&["A1"]));
        graph.assert_consistent();

        assert!(graph.is_tracked(&name("B1")));
        assert!(!graph.is_tracked(&name("A1")));

        let deps: Vec<_> = graph.dependencies(&name("B1")).collect();
        assert_eq!(deps, vec![&name("A1")]);

        let readers: Vec<_> = graph.dependents(&name("A1")).collect();
        assert_eq!(readers, vec![&name("B1")]);

        assert_eq!(graph.tracked_cell_count(), 1);
        assert_eq!(graph.referenced_cell_count(), 1);
    }

    #[test]
    fn test_multiple_dependencies() {
        // C1 = A1 + B1
        let mut graph = DepGraph::new();

        graph.replace_edges(&name("C1"), set(&["A1", "B1"]));
        graph.assert_consistent();

        let mut deps: Vec<_> = graph.dependencies(&name("C1")).collect();
        deps.sort();
        assert_eq!(deps, vec![&name("A1"), &name("B1")]);

        assert_eq!(
            graph.dependents(&name("A1")).collect::<Vec<_>>(),
            vec![&name("C1")]
        );
        assert_eq!(
            graph.dependents(&name("B1")).collect::<Vec<_>>(),
            vec![&name("C1")]
        );
    }

    #[test]
    fn test_rewiring() {
        // B1 = A1, then change to B1 = A2
        let mut graph = DepGraph::new();

        graph.replace_edges(&name("B1"), set(&["A1"]));
        graph.assert_consistent();

        graph.replace_edges(&name("B1"), set(&["A2"]));
        graph.assert_consistent();

        assert_eq!(
            graph.dependencies(&name("B1")).collect::<Vec<_>>(),
            vec![&name("A2")]
        );
        assert_eq!(
            graph.dependents(&name("A2")).collect::<Vec<_>>(),
            vec![&name("B1")]
        );

        // A1 should have no dependents now
        assert_eq!(graph.dependents(&name("A1")).count(), 0);
        assert_eq!(graph.referenced_cell_count(), 1);
    }

    #[test]
    fn test_unwiring() {
        // B1 = A1, then clear B1
        let mut graph = DepGraph::new();

        graph.replace_edges(&name("B1"), set(&["A1"]));
        graph.clear_cell(&name("B1"));
        graph.assert_consistent();

        assert!(!graph.is_tracked(&name("B1")));
        assert_eq!(graph.dependencies(&name("B1")).count(), 0);
        assert_eq!(graph.dependents(&name("A1")).count(), 0);
        assert_eq!(graph.tracked_cell_count(), 0);
        assert_eq!(graph.referenced_cell_count(), 0);
    }

    #[test]
    fn test_clearing_preserves_incoming_edges() {
        // B1 = A1, C1 = B1; deleting B1 clears only B1's own row
        let mut graph = DepGraph::new();

        graph.replace_edges(&name("B1"), set(&["A1"]));
        graph.replace_edges(&name("C1"), set(&["B1"]));
        graph.clear_cell(&name("B1"));
        graph.assert_consistent();

        // C1 still reads B1 - its content did not change
        assert_eq!(
            graph.dependencies(&name("C1")).collect::<Vec<_>>(),
            vec![&name("B1")]
        );
        assert_eq!(
            graph.dependents(&name("B1")).collect::<Vec<_>>(),
            vec![&name("C1")]
        );
    }

    #[test]
    fn test_diamond_dependency() {
        //     A1
        //    /  \
        //   B1   C1
        //    \  /
        //     D1
        let mut graph = DepGraph::new();

        graph.replace_edges(&name("B1"), set(&["A1"]));
        graph.replace_edges(&name("C1"), set(&["A1"]));
        graph.replace_edges(&name("D1"), set(&["B1", "C1"]));
        graph.assert_consistent();

        let mut d1_deps: Vec<_> = graph.dependencies(&name("D1")).collect();
        d1_deps.sort();
        assert_eq!(d1_deps, vec![&name("B1"), &name("C1")]);

        let mut a1_readers: Vec<_> = graph.dependents(&name("A1")).collect();
        a1_readers.sort();
        assert_eq!(a1_readers, vec![&name("B1"), &name("C1")]);

        assert_eq!(graph.tracked_cell_count(), 3); // B1, C1, D1
        assert_eq!(graph.referenced_cell_count(), 3); // A1, B1, C1
    }

    // =========================================================================
    // Cycle pre-check (would_create_cycle)
    // =========================================================================

    #[test]
    fn test_cycle_self_reference() {
        let graph = DepGraph::new();

        let result = graph.would_create_cycle(&name("A1"), &set(&["A1"]));
        assert!(result.is_some());
        assert!(result.unwrap().message.contains("references itself"));
    }

    #[test]
    fn test_cycle_two_cell() {
        // A1 = B1, then B1 = A1 would close a loop
        let mut graph = DepGraph::new();
        graph.replace_edges(&name("A1"), set(&["B1"]));

        assert!(graph.would_create_cycle(&name("B1"), &set(&["A1"])).is_some());
    }

    #[test]
    fn test_cycle_indirect() {
        // B1 = A1, C1 = B1, then A1 = C1 would close a loop
        let mut graph = DepGraph::new();
        graph.replace_edges(&name("B1"), set(&["A1"]));
        graph.replace_edges(&name("C1"), set(&["B1"]));

        assert!(graph.would_create_cycle(&name("A1"), &set(&["C1"])).is_some());
    }

    #[test]
    fn test_no_cycle_valid_edit() {
        let mut graph = DepGraph::new();
        graph.replace_edges(&name("B1"), set(&["A1"]));
        graph.replace_edges(&name("C1"), set(&["B1"]));

        assert!(graph.would_create_cycle(&name("D1"), &set(&["C1"])).is_none());
    }

    // =========================================================================
    // Plans (closure + Kahn + Tarjan)
    // =========================================================================

    #[test]
    fn test_closure_of_leaf() {
        let mut graph = DepGraph::new();
        graph.replace_edges(&name("B1"), set(&["A1"]));

        // B1 has no dependents: closure is just itself
        let closure = graph.closure_of(&name("B1"));
        assert_eq!(closure, set(&["B1"]));
    }

    #[test]
    fn test_closure_transitive() {
        // A1 <- B1 <- C1, A1 <- D1
        let mut graph = DepGraph::new();
        graph.replace_edges(&name("B1"), set(&["A1"]));
        graph.replace_edges(&name("C1"), set(&["B1"]));
        graph.replace_edges(&name("D1"), set(&["A1"]));

        let closure = graph.closure_of(&name("A1"));
        assert_eq!(closure, set(&["A1", "B1", "C1", "D1"]));
    }

    #[test]
    fn test_plan_chain_order() {
        // A1 <- B1 <- C1 <- D1
        let mut graph = DepGraph::new();
        graph.replace_edges(&name("B1"), set(&["A1"]));
        graph.replace_edges(&name("C1"), set(&["B1"]));
        graph.replace_edges(&name("D1"), set(&["C1"]));

        let plan = graph.recalc_plan(&name("A1"));
        assert_eq!(plan.order, vec![name("A1"), name("B1"), name("C1"), name("D1")]);
        assert!(plan.cycle.is_empty());
    }

    #[test]
    fn test_plan_edit_in_middle_of_chain() {
        // Editing C1 must not touch A1/B1
        let mut graph = DepGraph::new();
        graph.replace_edges(&name("B1"), set(&["A1"]));
        graph.replace_edges(&name("C1"), set(&["B1"]));
        graph.replace_edges(&name("D1"), set(&["C1"]));

        let plan = graph.recalc_plan(&name("C1"));
        assert_eq!(plan.order, vec![name("C1"), name("D1")]);
    }

    #[test]
    fn test_plan_diamond_valid_order() {
        let mut graph = DepGraph::new();
        graph.replace_edges(&name("B1"), set(&["A1"]));
        graph.replace_edges(&name("C1"), set(&["A1"]));
        graph.replace_edges(&name("D1"), set(&["B1", "C1"]));

        let plan = graph.recalc_plan(&name("A1"));
        assert_eq!(plan.order.len(), 4);

        let pos = |n: &str| plan.order.iter().position(|c| c == &name(n)).unwrap();
        assert!(pos("A1") < pos("B1"));
        assert!(pos("A1") < pos("C1"));
        assert!(pos("B1") < pos("D1"));
        assert!(pos("C1") < pos("D1"));
    }

    #[test]
    fn test_plan_stable_order() {
        let mut graph = DepGraph::new();
        graph.replace_edges(&name("B3"), set(&["A1"]));
        graph.replace_edges(&name("B1"), set(&["A1"]));
        graph.replace_edges(&name("B2"), set(&["A1"]));

        let plan1 = graph.recalc_plan(&name("A1"));
        let plan2 = graph.recalc_plan(&name("A1"));
        assert_eq!(plan1.order, plan2.order);

        // Siblings come out sorted by name
        assert_eq!(
            plan1.order,
            vec![name("A1"), name("B1"), name("B2"), name("B3")]
        );
    }

    #[test]
    fn test_plan_two_cell_cycle() {
        // A1 = B1 + 1, B1 = A1 + 1
        let mut graph = DepGraph::new();
        graph.replace_edges(&name("A1"), set(&["B1"]));
        graph.replace_edges(&name("B1"), set(&["A1"]));

        let plan = graph.recalc_plan(&name("A1"));
        assert!(plan.order.is_empty());
        assert_eq!(plan.cycle, vec![name("A1"), name("B1")]);
    }

    #[test]
    fn test_plan_self_loop() {
        let mut graph = DepGraph::new();
        graph.replace_edges(&name("A1"), set(&["A1"]));

        let plan = graph.recalc_plan(&name("A1"));
        assert!(plan.order.is_empty());
        assert_eq!(plan.cycle, vec![name("A1")]);
    }

    #[test]
    fn test_plan_downstream_of_cycle_still_ordered() {
        // A1 <-> B1 (cycle), C1 reads A1, D1 reads C1
        let mut graph = DepGraph::new();
        graph.replace_edges(&name("A1"), set(&["B1"]));
        graph.replace_edges(&name("B1"), set(&["A1"]));
        graph.replace_edges(&name("C1"), set(&["A1"]));
        graph.replace_edges(&name("D1"), set(&["C1"]));

        let plan = graph.recalc_plan(&name("A1"));
        assert_eq!(plan.cycle, vec![name("A1"), name("B1")]);
        // Downstream cells are evaluated (and will propagate the error),
        // in dependency order
        assert_eq!(plan.order, vec![name("C1"), name("D1")]);
    }

    #[test]
    fn test_plan_three_cell_cycle() {
        // A1 -> B1 -> C1 -> A1
        let mut graph = DepGraph::new();
        graph.replace_edges(&name("A1"), set(&["C1"]));
        graph.replace_edges(&name("B1"), set(&["A1"]));
        graph.replace_edges(&name("C1"), set(&["B1"]));

        let plan = graph.recalc_plan(&name("B1"));
        assert_eq!(plan.cycle, vec![name("A1"), name("B1"), name("C1")]);
        assert!(plan.order.is_empty());
    }

    #[test]
    fn test_plan_cycle_and_separate_branch() {
        // A1 <-> B1 (cycle); A1 also read by X1 (acyclic branch)
        let mut graph = DepGraph::new();
        graph.replace_edges(&name("A1"), set(&["B1"]));
        graph.replace_edges(&name("B1"), set(&["A1"]));
        graph.replace_edges(&name("X1"), set(&["A1"]));

        let plan = graph.recalc_plan(&name("B1"));
        assert_eq!(plan.cycle, vec![name("A1"), name("B1")]);
        assert_eq!(plan.order, vec![name("X1")]);
    }

    #[test]
    fn test_plan_for_full_recompute() {
        // Two independent chains, one cycle
        let mut graph = DepGraph::new();
        graph.replace_edges(&name("B1"), set(&["A1"]));
        graph.replace_edges(&name("C1"), set(&["B1"]));
        graph.replace_edges(&name("Y1"), set(&["X1"]));
        graph.replace_edges(&name("P1"), set(&["Q1"]));
        graph.replace_edges(&name("Q1"), set(&["P1"]));

        let members = set(&["A1", "B1", "C1", "X1", "Y1", "P1", "Q1"]);
        let plan = graph.plan_for(members);

        assert_eq!(plan.cycle, vec![name("P1"), name("Q1")]);
        assert_eq!(plan.order.len(), 5);

        let pos = |n: &str| plan.order.iter().position(|c| c == &name(n)).unwrap();
        assert!(pos("A1") < pos("B1"));
        assert!(pos("B1") < pos("C1"));
        assert!(pos("X1") < pos("Y1"));
    }

    #[test]
    fn test_plan_valid_topological_order_property() {
        // Every cell appears after all cells it reads (within the order)
        let mut graph = DepGraph::new();
        graph.replace_edges(&name("B1"), set(&["A1"]));
        graph.replace_edges(&name("C1"), set(&["A1", "B1"]));
        graph.replace_edges(&name("D1"), set(&["C1", "A1"]));
        graph.replace_edges(&name("E1"), set(&["D1", "B1"]));

        let plan = graph.recalc_plan(&name("A1"));
        for (i, cell) in plan.order.iter().enumerate() {
            for later in &plan.order[i + 1..] {
                assert!(
                    !graph.dependencies(cell).any(|d| d == later),
                    "{} at position {} depends on {} which comes later",
                    cell,
                    i,
                    later
                );
            }
        }
    }
}
