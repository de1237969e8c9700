use serde::Serialize;

use crate::config::Tuning;
use crate::movement::Movement;

/// Repairs withdrawal/deposit columns against the running balance.
///
/// Statement tables are read by an image model, and the two amount columns
/// are the thing it most often gets wrong: whole documents come back with
/// the columns swapped, single rows land in the wrong column, and some rows
/// carry a value in both. The balance column is rarely misread, so the
/// delta between consecutive balances acts as the referee.
pub struct BalanceReconciler {
    /// How far a flow may sit from the balance delta and still count as
    /// matching it.
    pub tolerance: f64,
    /// Column-swap evidence must beat as-given evidence by this margin.
    pub swap_margin: usize,
    /// And needs at least this many swapped-consistent pairs outright.
    pub swap_min_matches: usize,
}

impl Default for BalanceReconciler {
    fn default() -> Self {
        Self::from_tuning(&Tuning::default())
    }
}

/// Outcome summary of one repair run, for logging and diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Reconciliation {
    /// Adjacent pairs whose as-given flow already matched the balance delta.
    pub consistent_pairs: usize,
    /// Pairs that only matched with withdrawal and deposit swapped.
    pub swapped_pairs: usize,
    /// Whether the whole-table column swap fired.
    pub global_swap: bool,
}

impl BalanceReconciler {
    pub fn from_tuning(cfg: &Tuning) -> Self {
        Self {
            tolerance: cfg.balance_tolerance,
            swap_margin: cfg.swap_margin,
            swap_min_matches: cfg.swap_min_matches,
        }
    }

    /// Repair the rows in place. Balances are never modified; only the two
    /// flow columns move. Rows are expected in statement order.
    pub fn repair(&self, movements: &mut [Movement]) -> Reconciliation {
        // Flows are magnitudes; direction is decided by the balance column.
        for m in movements.iter_mut() {
            m.withdrawal = m.withdrawal.abs();
            m.deposit = m.deposit.abs();
        }

        // 1. Score the whole table: does the evidence say the two columns
        //    were transposed wholesale?
        let (consistent, swapped) = self.score_swap(movements);

        // 2. Swap every row only on strong, unambiguous evidence.
        let global_swap =
            swapped >= self.swap_min_matches && swapped >= consistent + self.swap_margin;
        if global_swap {
            for m in movements.iter_mut() {
                std::mem::swap(&mut m.withdrawal, &mut m.deposit);
            }
        }

        // 3. Per-row repair against the running balance.
        self.repair_rows(movements);

        // 4. A row books a withdrawal or a deposit, never both.
        enforce_exclusive(movements);

        Reconciliation {
            consistent_pairs: consistent,
            swapped_pairs: swapped,
            global_swap,
        }
    }

    /// Count adjacent pairs whose balance delta matches the as-given flow
    /// versus pairs that only match with the columns swapped. Pairs with a
    /// non-finite balance on either side are skipped.
    fn score_swap(&self, movements: &[Movement]) -> (usize, usize) {
        let mut consistent = 0;
        let mut swapped = 0;
        for pair in movements.windows(2) {
            let (prev, row) = (&pair[0], &pair[1]);
            if !prev.balance.is_finite() || !row.balance.is_finite() {
                continue;
            }
            let delta = row.balance - prev.balance;
            let as_given = row.deposit - row.withdrawal;
            let as_swapped = row.withdrawal - row.deposit;
            if (delta - as_given).abs() <= self.tolerance {
                consistent += 1;
            } else if (delta - as_swapped).abs() <= self.tolerance {
                swapped += 1;
            }
        }
        (consistent, swapped)
    }

    /// Walk the rows front to back carrying the previous balance; the sign
    /// of each delta decides ambiguous or misplaced amounts. The first row
    /// has no delta and is left alone here.
    fn repair_rows(&self, movements: &mut [Movement]) {
        let mut prev_balance: Option<f64> = None;
        for m in movements.iter_mut() {
            if let Some(prev) = prev_balance {
                if prev.is_finite() && m.balance.is_finite() {
                    let delta = m.balance - prev;
                    let (w, d) = (m.withdrawal, m.deposit);
                    if w > 0.0 && d > 0.0 {
                        // Both columns set: the delta sign picks the real one.
                        if delta > 0.0 {
                            m.deposit = w.max(d);
                            m.withdrawal = 0.0;
                        } else if delta < 0.0 {
                            m.withdrawal = w.max(d);
                            m.deposit = 0.0;
                        }
                        // delta == 0 falls through to the exclusivity pass.
                    } else if w > 0.0 && delta > 0.0 {
                        // A withdrawal that made the balance rise is a deposit.
                        m.deposit = w;
                        m.withdrawal = 0.0;
                    } else if d > 0.0 && delta < 0.0 {
                        m.withdrawal = d;
                        m.deposit = 0.0;
                    }
                }
            }
            prev_balance = Some(m.balance);
        }
    }
}

fn enforce_exclusive(movements: &mut [Movement]) {
    for m in movements.iter_mut() {
        if m.withdrawal > 0.0 && m.deposit > 0.0 {
            if m.withdrawal > m.deposit {
                m.deposit = 0.0;
            } else {
                m.withdrawal = 0.0;
            }
        }
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────
