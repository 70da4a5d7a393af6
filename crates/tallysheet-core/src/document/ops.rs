use std::collections::HashSet;

use super::Document;
use crate::recompute::recompute_cells;
use tallysheet_engine::engine::{CellId, ErrorCode, evaluate_formula, extract_references};

/// Dimension for row/column deletion
#[derive(Copy, Clone, Debug)]
enum Dimension {
    Row,
    Column,
}

impl Dimension {
    fn get_coord(&self, id: &CellId) -> u32 {
        match self {
            Dimension::Row => id.row,
            Dimension::Column => id.col,
        }
    }
}

impl Document {
    /// Commit raw text typed into a cell.
    ///
    /// The cell's references are installed in the graph before the cycle
    /// check, and stay installed when a cycle is found; the cell then shows
    /// `#CYCLE!` with its raw text kept. Otherwise the cell is evaluated.
    /// Either way its transitive dependents are brought up to date.
    ///
    /// Whitespace-only input clears the cell. Returns the cell's error, if any.
    pub fn set_cell_from_input(&mut self, id: CellId, input: &str) -> Option<ErrorCode> {
        if input.trim().is_empty() {
            self.clear_cell(&id);
            return None;
        }

        if self.sheet.is_deleted(&id) {
            self.reattach_readers(id);
        }
        self.graph.update_dependencies(id, extract_references(input));
        let cyclic = self.graph.has_cycle(&id);
        let record = self.sheet.set_raw(id, input);
        if cyclic {
            tracing::debug!(cell = %id, "formula rejected: circular reference");
            record.set_error(ErrorCode::Cycle);
        } else {
            let raw = record.raw.clone();
            let result = evaluate_formula(&raw, &self.sheet, self.config.tokenizer);
            if let Some(record) = self.sheet.get_mut(&id) {
                record.apply(result);
            }
        }

        self.propagate_from(id);
        self.sheet.get(&id).and_then(|record| record.error)
    }

    /// Clear the specified cell.
    ///
    /// The cell keeps its place in the graph as a referenced cell, so formulas
    /// that read it see it as empty and pick up any later value.
    pub fn clear_cell(&mut self, id: &CellId) {
        self.graph.update_dependencies(*id, HashSet::new());
        if self.sheet.remove(id).is_some() {
            self.propagate_from(*id);
        }
    }

    /// Structurally delete cells.
    ///
    /// Each cell is removed from the graph and the sheet, and every cell that
    /// read it, directly or transitively, shows `#REF!` with its raw text
    /// kept. Reading a deleted cell keeps yielding `#REF!` until it is written
    /// again. Returns the invalidated cells.
    pub fn delete_cells<I>(&mut self, ids: I) -> HashSet<CellId>
    where
        I: IntoIterator<Item = CellId>,
    {
        let mut deleted = HashSet::new();
        let mut former = HashSet::new();
        for id in ids {
            former.extend(self.graph.remove_cell(&id));
            self.sheet.delete(id);
            deleted.insert(id);
        }

        let mut invalid = self.graph.transitive_dependents(former.iter().copied());
        invalid.extend(former);
        invalid.retain(|id| !deleted.contains(id));

        for id in &invalid {
            if let Some(record) = self.sheet.get_mut(id) {
                record.set_error(ErrorCode::Ref);
            }
        }
        tracing::debug!(
            deleted = deleted.len(),
            invalidated = invalid.len(),
            "deleted cells"
        );
        invalid
    }

    fn delete_dimension(&mut self, dim: Dimension, at: u32) -> HashSet<CellId> {
        let mut targets: Vec<CellId> = self
            .sheet
            .ids()
            .chain(self.graph.cells())
            .filter(|id| dim.get_coord(id) == at)
            .copied()
            .collect();
        targets.sort_unstable();
        targets.dedup();
        tracing::debug!(?dim, at, cells = targets.len(), "delete dimension");
        self.delete_cells(targets)
    }

    /// Delete every cell in the specified row. Other rows keep their
    /// positions.
    pub fn delete_row(&mut self, row: u32) -> HashSet<CellId> {
        self.delete_dimension(Dimension::Row, row)
    }

    /// Delete every cell in the specified column (1 = `A`).
    pub fn delete_column(&mut self, col: u32) -> HashSet<CellId> {
        self.delete_dimension(Dimension::Column, col)
    }

    /// Restore the edges of every formula that still reads `target`.
    ///
    /// Deleting a cell detaches its readers from the graph; their formulas
    /// keep the reference, so writing the cell again must reconnect them
    /// before the cycle check and propagation.
    fn reattach_readers(&mut self, target: CellId) {
        let readers: Vec<(CellId, HashSet<CellId>)> = self
            .sheet
            .iter()
            .filter(|(reader, _)| **reader != target)
            .map(|(reader, record)| (*reader, extract_references(&record.raw)))
            .filter(|(_, refs)| refs.contains(&target))
            .collect();
        tracing::debug!(cell = %target, readers = readers.len(), "reattaching readers of deleted cell");
        for (reader, refs) in readers {
            self.graph.update_dependencies(reader, refs);
        }
    }

    /// Re-evaluate everything that reads `changed`, directly or transitively.
    fn propagate_from(&mut self, changed: CellId) {
        let dependents = self.graph.transitive_dependents([changed]);
        if dependents.is_empty() {
            return;
        }

        let reaching = self.graph.cells_reaching_cycle(dependents.iter().copied());
        let (cyclic, acyclic): (Vec<CellId>, Vec<CellId>) = dependents
            .into_iter()
            .partition(|id| reaching.contains(id));
        for id in &cyclic {
            if let Some(record) = self.sheet.get_mut(id) {
                record.set_error(ErrorCode::Cycle);
            }
        }
        recompute_cells(
            &mut self.sheet,
            &acyclic,
            self.config.max_iterations,
            self.config.tokenizer,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::Document;
    use tallysheet_engine::engine::{CellId, ErrorCode};

    fn id(s: &str) -> CellId {
        CellId::parse(s).unwrap()
    }

    fn value(doc: &Document, cell: &str) -> String {
        doc.cell(&id(cell)).map(|r| r.value.clone()).unwrap_or_default()
    }

    #[test]
    fn test_edit_reaches_transitive_dependents() {
        let mut doc = Document::new();
        doc.set_cell_from_input(id("A1"), "2");
        doc.set_cell_from_input(id("B1"), "=A1*10");
        doc.set_cell_from_input(id("C1"), "=B1+A1");
        assert_eq!(value(&doc, "C1"), "22");

        doc.set_cell_from_input(id("A1"), "3");
        assert_eq!(value(&doc, "B1"), "30");
        assert_eq!(value(&doc, "C1"), "33");
    }

    #[test]
    fn test_rewriting_formula_replaces_edges() {
        let mut doc = Document::new();
        doc.set_cell_from_input(id("B1"), "=A1+1");
        doc.set_cell_from_input(id("B1"), "=C1+1");
        assert_eq!(doc.graph.dependents(&id("A1")).count(), 0);
        assert!(!doc.graph.contains(&id("A1")));

        doc.set_cell_from_input(id("C1"), "4");
        assert_eq!(value(&doc, "B1"), "5");
    }

    #[test]
    fn test_self_reference_is_a_cycle() {
        let mut doc = Document::new();
        assert_eq!(doc.set_cell_from_input(id("A1"), "=A1"), Some(ErrorCode::Cycle));
        let record = doc.cell(&id("A1")).unwrap();
        assert_eq!(record.raw, "=A1");
        assert_eq!(record.value, "#CYCLE!");
        // The rejected edges stay installed.
        assert_eq!(doc.graph.depends_on(&id("A1")).count(), 1);
    }

    #[test]
    fn test_breaking_a_cycle_recovers() {
        let mut doc = Document::new();
        doc.set_cell_from_input(id("A1"), "=+B1");
        assert_eq!(doc.set_cell_from_input(id("B1"), "=+A1"), Some(ErrorCode::Cycle));
        assert_eq!(value(&doc, "A1"), "#CYCLE!");

        assert_eq!(doc.set_cell_from_input(id("B1"), "7"), None);
        assert_eq!(value(&doc, "A1"), "7");
        assert_eq!(doc.cell(&id("A1")).unwrap().error, None);
    }

    #[test]
    fn test_clear_cell_keeps_readers_attached() {
        let mut doc = Document::new();
        doc.set_cell_from_input(id("A1"), "5");
        doc.set_cell_from_input(id("B1"), "=A1+1");

        doc.set_cell_from_input(id("A1"), "  ");
        assert!(doc.cell(&id("A1")).is_none());
        assert_eq!(value(&doc, "B1"), "1");

        doc.set_cell_from_input(id("A1"), "9");
        assert_eq!(value(&doc, "B1"), "10");
    }

    #[test]
    fn test_delete_row_invalidates_readers() {
        let mut doc = Document::new();
        doc.set_cell_from_input(id("A1"), "5");
        doc.set_cell_from_input(id("A2"), "=A1*2");
        doc.set_cell_from_input(id("A3"), "=A2+1");
        doc.set_cell_from_input(id("B2"), "4");

        let invalid = doc.delete_row(1);
        assert_eq!(invalid.len(), 2);
        assert!(doc.cell(&id("A1")).is_none());
        for cell in ["A2", "A3"] {
            let record = doc.cell(&id(cell)).unwrap();
            assert_eq!(record.error, Some(ErrorCode::Ref));
            assert_eq!(record.value, "#REF!");
        }
        assert_eq!(doc.cell(&id("A2")).unwrap().raw, "=A1*2");
        assert_eq!(value(&doc, "B2"), "4");
    }

    #[test]
    fn test_rewriting_deleted_cell_revives_readers() {
        let mut doc = Document::new();
        doc.set_cell_from_input(id("A1"), "5");
        doc.set_cell_from_input(id("B1"), "=A1+1");
        doc.set_cell_from_input(id("C1"), "=B1*2");
        doc.delete_cells([id("A1")]);
        assert_eq!(value(&doc, "C1"), "#REF!");

        assert_eq!(doc.set_cell_from_input(id("A1"), "6"), None);
        assert_eq!(value(&doc, "B1"), "7");
        assert_eq!(value(&doc, "C1"), "14");
        assert_eq!(doc.cell(&id("B1")).unwrap().error, None);

        // The edit protocol and a full recalculation agree.
        let before: Vec<String> = doc.sheet.iter().map(|(_, r)| r.value.clone()).collect();
        assert_eq!(doc.recalculate().iterations, 1);
        let after: Vec<String> = doc.sheet.iter().map(|(_, r)| r.value.clone()).collect();
        assert_eq!(before, after);
    }

    #[test]
    fn test_rewriting_deleted_cell_detects_cycle() {
        let mut doc = Document::new();
        doc.set_cell_from_input(id("A1"), "5");
        doc.set_cell_from_input(id("B1"), "=A1+1");
        doc.delete_cells([id("A1")]);

        assert_eq!(doc.set_cell_from_input(id("A1"), "=B1"), Some(ErrorCode::Cycle));
        assert_eq!(value(&doc, "A1"), "#CYCLE!");
        assert_eq!(value(&doc, "B1"), "#CYCLE!");
    }

    #[test]
    fn test_deleting_an_empty_referenced_cell() {
        let mut doc = Document::new();
        doc.set_cell_from_input(id("B1"), "=C4+1");
        assert_eq!(value(&doc, "B1"), "1");

        let invalid = doc.delete_column(3);
        assert!(invalid.contains(&id("B1")));
        assert_eq!(value(&doc, "B1"), "#REF!");
    }

    #[test]
    fn test_ref_error_sticks_until_target_is_rewritten() {
        let mut doc = Document::new();
        doc.set_cell_from_input(id("A1"), "5");
        doc.set_cell_from_input(id("B1"), "=A1+1");
        doc.delete_cells([id("A1")]);

        // An unrelated edit does not resurrect B1.
        doc.set_cell_from_input(id("C1"), "1");
        assert_eq!(value(&doc, "B1"), "#REF!");

        // Rewriting the reader re-evaluates it against the deleted cell.
        doc.set_cell_from_input(id("B1"), "=A1+2");
        assert_eq!(value(&doc, "B1"), "#REF!");

        doc.set_cell_from_input(id("A1"), "6");
        assert_eq!(value(&doc, "B1"), "8");
    }
}
