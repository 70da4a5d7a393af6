//! Circular dependency detection for formula cells.
//!
//! When a formula is committed its edges are installed first and then the
//! graph is searched from the edited cell. Only a true back-edge (into a cell
//! still on the current search path) is a cycle; a diamond, where two paths
//! reach the same cell, is not.
//!
//! The search keeps an explicit stack so deep chains cannot exhaust the call
//! stack.

use std::collections::HashSet;

use super::cell_ref::CellId;
use super::graph::DependencyGraph;

impl DependencyGraph {
    /// Detect a cycle reachable from `start` along depends-on edges.
    /// Returns the cycle path (first and last element equal) if one exists.
    pub fn find_cycle(&self, start: &CellId) -> Option<Vec<CellId>> {
        let mut finished: HashSet<CellId> = HashSet::new();
        let mut on_path: HashSet<CellId> = HashSet::from([*start]);
        let mut path: Vec<CellId> = vec![*start];
        let mut stack: Vec<Vec<CellId>> = vec![self.children(start)];

        while let Some(pending) = stack.last_mut() {
            let Some(next) = pending.pop() else {
                stack.pop();
                if let Some(done) = path.pop() {
                    on_path.remove(&done);
                    finished.insert(done);
                }
                continue;
            };

            if on_path.contains(&next) {
                let pos = path.iter().position(|c| *c == next).unwrap_or(0);
                let mut cycle = path.split_off(pos);
                cycle.push(next);
                tracing::debug!(start = %start, len = cycle.len(), "dependency cycle found");
                return Some(cycle);
            }
            if finished.contains(&next) {
                continue;
            }

            on_path.insert(next);
            path.push(next);
            stack.push(self.children(&next));
        }
        None
    }

    pub fn has_cycle(&self, start: &CellId) -> bool {
        self.find_cycle(start).is_some()
    }

    /// The cells among `starts` from which a cycle is reachable.
    ///
    /// Same answer as [`has_cycle`](Self::has_cycle) on each start, but the
    /// searches share their visited cells, so every cell is expanded once.
    pub fn cells_reaching_cycle<I>(&self, starts: I) -> HashSet<CellId>
    where
        I: IntoIterator<Item = CellId>,
    {
        let starts: Vec<CellId> = starts.into_iter().collect();
        let mut finished: HashSet<CellId> = HashSet::new();
        let mut reaching: HashSet<CellId> = HashSet::new();

        for start in &starts {
            if finished.contains(start) {
                continue;
            }
            let mut on_path: HashSet<CellId> = HashSet::from([*start]);
            let mut path: Vec<CellId> = vec![*start];
            let mut stack: Vec<Vec<CellId>> = vec![self.children(start)];

            while let Some(pending) = stack.last_mut() {
                let Some(next) = pending.pop() else {
                    stack.pop();
                    if let Some(done) = path.pop() {
                        on_path.remove(&done);
                        finished.insert(done);
                        if reaching.contains(&done)
                            && let Some(parent) = path.last()
                        {
                            reaching.insert(*parent);
                        }
                    }
                    continue;
                };
                let Some(&current) = path.last() else {
                    break;
                };

                if on_path.contains(&next) {
                    reaching.insert(current);
                } else if finished.contains(&next) {
                    if reaching.contains(&next) {
                        reaching.insert(current);
                    }
                } else {
                    on_path.insert(next);
                    path.push(next);
                    stack.push(self.children(&next));
                }
            }
        }

        starts
            .into_iter()
            .filter(|id| reaching.contains(id))
            .collect()
    }

    /// Dependencies of `cell`, ordered so that popping yields ascending ids.
    fn children(&self, cell: &CellId) -> Vec<CellId> {
        let mut children: Vec<CellId> = self.depends_on(cell).copied().collect();
        children.sort_unstable_by(|a, b| b.cmp(a));
        children
    }
}
