//! Whole-sheet recomputation over randomly filled sparse sheets.
//!
//! Sheets are mostly numbers, with some arithmetic and `SUM` range formulas
//! over earlier cells and a sprinkling of malformed formulas.

use proptest::prelude::*;
use proptest::strategy::ValueTree;
use proptest::test_runner::TestRunner;

use tallysheet_core::{CellId, RecomputeStats, Sheet, recompute_all};

const MAX_ITERATIONS: usize = 500;

const MALFORMED: &[&str] = &["=A1++B2", "=SUM()", "=UNKNOWN(1,2)", "=A9#999#99+1"];

#[derive(Clone, Debug)]
enum Entry {
    Number(u32),
    /// Sum of one or two earlier cells, picked by index.
    Arithmetic(Vec<usize>),
    /// `SUM` over a block spanned by two earlier cells.
    Range(usize, usize),
    Malformed(usize),
}

fn entry() -> impl Strategy<Value = Entry> {
    prop_oneof![
        80 => (0u32..=1000).prop_map(Entry::Number),
        9 => prop::collection::vec(any::<usize>(), 1..=2).prop_map(Entry::Arithmetic),
        6 => (any::<usize>(), any::<usize>()).prop_map(|(a, b)| Entry::Range(a, b)),
        5 => (0..MALFORMED.len()).prop_map(Entry::Malformed),
    ]
}

fn placed_entry(cols: u32, rows: u32) -> impl Strategy<Value = (CellId, Entry)> {
    (1..=cols, 1..=rows, entry())
        .prop_map(|(col, row, entry)| (CellId::new(col, row).unwrap(), entry))
}

/// Fill a sheet in order. Formulas only name cells placed before them, and
/// a repeated position keeps its first entry.
fn build_sheet(entries: &[(CellId, Entry)]) -> Sheet {
    let mut sheet = Sheet::new();
    let mut placed: Vec<CellId> = Vec::new();

    for (id, entry) in entries {
        if sheet.get(id).is_some() {
            continue;
        }
        let pick = |i: &usize| placed[i % placed.len()];
        let raw = match entry {
            Entry::Number(n) => n.to_string(),
            Entry::Arithmetic(_) if placed.is_empty() => "=3+4".to_string(),
            Entry::Arithmetic(picks) => {
                let refs: Vec<String> = picks.iter().map(|i| pick(i).to_string()).collect();
                format!("={}", refs.join("+"))
            }
            Entry::Range(..) if placed.len() < 2 => "=SUM(A1:A3)".to_string(),
            Entry::Range(a, b) => {
                let (a, b) = (pick(a), pick(b));
                // Keep blocks small: at most 3 columns by 21 rows.
                let end_col = b.col.clamp(a.col, a.col + 2);
                let start_row = a.row.min(b.row);
                let end_row = a.row.max(b.row).min(start_row + 20);
                let start = CellId::new(a.col, start_row).unwrap();
                let end = CellId::new(end_col, end_row).unwrap();
                format!("=SUM({}:{})", start, end)
            }
            Entry::Malformed(i) => MALFORMED[*i].to_string(),
        };
        sheet.set_raw(*id, &raw);
        placed.push(*id);
    }
    sheet
}

fn values(sheet: &Sheet) -> Vec<String> {
    sheet.iter().map(|(_, record)| record.value.clone()).collect()
}

fn check_recompute(sheet: &mut Sheet) -> RecomputeStats {
    let stats = recompute_all(sheet, MAX_ITERATIONS);
    assert!((1..=MAX_ITERATIONS).contains(&stats.iterations));
    assert_eq!(stats.valid_count + stats.error_count, sheet.len());

    for (id, record) in sheet.iter() {
        match record.error {
            Some(code) => assert_eq!(record.value, code.to_string(), "{}", id),
            None if !record.is_formula() => assert_eq!(record.value, record.raw, "{}", id),
            None => {}
        }
    }

    if stats.stable {
        let snapshot = values(sheet);
        let again = recompute_all(sheet, MAX_ITERATIONS);
        assert_eq!(again.iterations, 1);
        assert!(again.stable);
        assert_eq!(again.valid_count, stats.valid_count);
        assert_eq!(values(sheet), snapshot);
    }
    stats
}

fn run_scales(scales: &[usize], cols: u32, rows: u32) {
    let mut runner = TestRunner::deterministic();
    for &scale in scales {
        let entries = prop::collection::vec(placed_entry(cols, rows), scale)
            .new_tree(&mut runner)
            .unwrap()
            .current();
        let mut sheet = build_sheet(&entries);
        let stats = check_recompute(&mut sheet);
        assert!(sheet.len() <= scale);
        assert!(stats.valid_count > 0);
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn random_sheets_recompute_consistently(
        entries in prop::collection::vec(placed_entry(26, 40), 10..=300)
    ) {
        let mut sheet = build_sheet(&entries);
        check_recompute(&mut sheet);
    }
}

#[test]
fn test_scale_smoke() {
    run_scales(&[10, 100, 1000], 100, 100);
}

#[test]
#[ignore = "large sheets; run with --ignored"]
fn test_scale_smoke_large() {
    run_scales(&[5000, 10_000], 200, 200);
}
