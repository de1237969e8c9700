use std::collections::HashSet;

use crate::movement::Movement;

/// Key under which two rows count as the same movement: date and amounts
/// must match exactly, the description ignores case and outer whitespace.
fn row_key(m: &Movement) -> String {
    format!(
        "{}|{}|{}|{}|{}",
        m.date.trim(),
        m.description.trim().to_lowercase(),
        m.withdrawal,
        m.deposit,
        m.balance
    )
}

/// Drop exact repeats, keeping the first occurrence and the original order.
///
/// Extraction batches overlap in practice (the oracle re-reads rows that
/// straddle a page break), so the same movement often arrives twice.
pub fn dedupe(movements: Vec<Movement>) -> Vec<Movement> {
    let mut seen = HashSet::new();
    let mut kept = Vec::with_capacity(movements.len());
    for m in movements {
        if seen.insert(row_key(&m)) {
            kept.push(m);
        }
    }
    kept
}
