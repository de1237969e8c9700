pub mod classify;
pub mod config;
pub mod dedupe;
pub mod movement;
pub mod normalize;
pub mod reconcile;

pub use classify::is_scanned_like;
pub use config::Tuning;
pub use dedupe::dedupe;
pub use movement::{Movement, RawAmount, RawMovement};
pub use reconcile::{BalanceReconciler, Reconciliation};
