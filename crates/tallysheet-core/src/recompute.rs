//! Fixpoint recomputation.
//!
//! Brings a sheet to a consistent state without consulting the dependency
//! graph: every pass re-evaluates every cell against the live sheet, and
//! passes repeat until one changes nothing or the pass cap is reached.
//! Cells are visited in descending identifier order; a chain of `k` cells
//! written top to bottom therefore needs at most `k` passes.
//!
//! Evaluation failures are stored on the failing cell and never abort a
//! pass.

use serde::Serialize;

use crate::sheet::Sheet;
use tallysheet_engine::engine::{CellId, TokenizePolicy, evaluate_formula};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct RecomputeStats {
    /// Passes performed, including the final pass that changed nothing.
    pub iterations: usize,
    /// Whether a pass completed without any change.
    pub stable: bool,
    pub valid_count: usize,
    pub error_count: usize,
}

/// Recompute every cell of `sheet` with the default tokenizer policy.
pub fn recompute_all(sheet: &mut Sheet, max_iterations: usize) -> RecomputeStats {
    recompute_all_with(sheet, max_iterations, TokenizePolicy::default())
}

pub fn recompute_all_with(
    sheet: &mut Sheet,
    max_iterations: usize,
    policy: TokenizePolicy,
) -> RecomputeStats {
    let ids: Vec<CellId> = sheet.ids().copied().collect();
    recompute_cells(sheet, &ids, max_iterations, policy)
}

/// Recompute only `ids`, reading every other cell as it stands.
///
/// Counts in the returned stats cover `ids` only. With `max_iterations == 0`
/// nothing is evaluated and the result is not stable.
pub fn recompute_cells(
    sheet: &mut Sheet,
    ids: &[CellId],
    max_iterations: usize,
    policy: TokenizePolicy,
) -> RecomputeStats {
    let _span = tracing::info_span!("recompute", cells = ids.len(), max_iterations).entered();

    let mut order = ids.to_vec();
    order.sort_unstable_by(|a, b| b.cmp(a));
    order.dedup();

    let mut iterations = 0;
    let mut stable = false;
    while iterations < max_iterations {
        iterations += 1;
        let mut changed = 0usize;

        for id in &order {
            let Some(record) = sheet.get(id) else {
                continue;
            };
            let result = evaluate_formula(&record.raw, &*sheet, policy);
            if let Some(record) = sheet.get_mut(id)
                && record.apply(result)
            {
                changed += 1;
            }
        }

        tracing::trace!(iteration = iterations, changed, "recompute pass");
        if changed == 0 {
            stable = true;
            break;
        }
    }
    if !stable {
        tracing::warn!(iterations, "recompute stopped before reaching a fixed point");
    }

    let (valid_count, error_count) = order
        .iter()
        .filter_map(|id| sheet.get(id))
        .fold((0, 0), |(valid, errors), record| match record.error {
            Some(_) => (valid, errors + 1),
            None => (valid + 1, errors),
        });

    RecomputeStats {
        iterations,
        stable,
        valid_count,
        error_count,
    }
}
