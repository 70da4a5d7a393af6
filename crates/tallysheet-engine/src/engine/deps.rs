//! Dependency extraction from raw cell text.
//!
//! Scans formula text for every cell reference (e.g., `A1`, `B2:C5`) the
//! formula reads. The result feeds [`DependencyGraph::update_dependencies`]
//! on every edit, before the cycle check.
//!
//! Handles:
//! - Simple cell references: `A1`, `B2`
//! - Ranges, expanded to every cell they cover: `SUM(A1:A3)` reads `A2` too
//! - Literal (non-formula) text, which reads nothing
//!
//! [`DependencyGraph::update_dependencies`]: super::DependencyGraph::update_dependencies

use regex::Regex;
use std::collections::HashSet;
use std::sync::OnceLock;

use super::cell_ref::{CellId, expand_range};

/// Extract the set of cells a raw cell text depends on.
pub fn extract_references(raw: &str) -> HashSet<CellId> {
    let mut refs = HashSet::new();
    let Some(formula) = raw.strip_prefix('=') else {
        return refs;
    };

    for caps in reference_re().captures_iter(formula) {
        let Some(start) = CellId::parse(&caps["start"]) else {
            continue;
        };
        match caps.name("end").and_then(|m| CellId::parse(m.as_str())) {
            Some(end) => {
                // Oversized ranges contribute nothing; evaluation reports them.
                if let Some(cells) = expand_range(start, end) {
                    refs.extend(cells);
                }
            }
            None => {
                refs.insert(start);
            }
        }
    }
    refs
}

fn reference_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?<start>[A-Z]+[0-9]+)(?::(?<end>[A-Z]+[0-9]+))?")
            .expect("reference regex must compile")
    })
}
