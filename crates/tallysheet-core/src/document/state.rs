use std::collections::HashSet;

use crate::config::Config;
use crate::recompute::{RecomputeStats, recompute_cells};
use crate::sheet::{CellRecord, Sheet};
use tallysheet_engine::engine::{
    CellId, CellValue, DependencyGraph, ErrorCode, extract_references,
};

/// UI-agnostic document state: one sheet and the dependency graph that
/// mirrors its formulas.
#[derive(Clone, Debug, Default)]
pub struct Document {
    /// Cell records keyed by identifier
    pub sheet: Sheet,
    /// Which cells read which
    pub graph: DependencyGraph,
    pub config: Config,
}

impl Document {
    /// Create an empty document with the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: Config) -> Self {
        Document {
            config,
            ..Self::default()
        }
    }

    pub fn cell(&self, id: &CellId) -> Option<&CellRecord> {
        self.sheet.get(id)
    }

    /// The value formulas see when they read `id`.
    pub fn value(&self, id: &CellId) -> CellValue {
        self.sheet.value_of(id)
    }

    /// Bring the whole document to a consistent state.
    ///
    /// Graph edges are rebuilt from every cell's raw text, cells that reach a
    /// cycle are marked `#CYCLE!`, and everything else goes through fixpoint
    /// recomputation. Counts in the returned stats cover the whole sheet.
    pub fn recalculate(&mut self) -> RecomputeStats {
        let edges: Vec<(CellId, HashSet<CellId>)> = self
            .sheet
            .iter()
            .map(|(id, record)| (*id, extract_references(&record.raw)))
            .collect();
        for (id, refs) in edges {
            self.graph.update_dependencies(id, refs);
        }

        let reaching = self.graph.cells_reaching_cycle(self.sheet.ids().copied());
        let (cyclic, acyclic): (Vec<CellId>, Vec<CellId>) = self
            .sheet
            .ids()
            .copied()
            .partition(|id| reaching.contains(id));
        for id in &cyclic {
            if let Some(record) = self.sheet.get_mut(id) {
                record.set_error(ErrorCode::Cycle);
            }
        }
        if !cyclic.is_empty() {
            tracing::debug!(count = cyclic.len(), "cells on or behind a cycle");
        }

        let mut stats = recompute_cells(
            &mut self.sheet,
            &acyclic,
            self.config.max_iterations,
            self.config.tokenizer,
        );
        (stats.valid_count, stats.error_count) = self.sheet.count_states();
        stats
    }

    /// Write many cells at once and recalculate.
    ///
    /// Blank entries are skipped. Unlike [`Document::set_cell_from_input`],
    /// nothing is evaluated until every cell is in place, so input order does
    /// not matter.
    pub fn load_cells<I, S>(&mut self, cells: I) -> RecomputeStats
    where
        I: IntoIterator<Item = (CellId, S)>,
        S: AsRef<str>,
    {
        let mut loaded = 0usize;
        for (id, raw) in cells {
            let raw = raw.as_ref();
            if raw.trim().is_empty() {
                continue;
            }
            self.sheet.set_raw(id, raw);
            loaded += 1;
        }
        tracing::debug!(loaded, "bulk load");
        self.recalculate()
    }
}
