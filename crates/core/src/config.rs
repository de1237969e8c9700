use serde::{Deserialize, Serialize};

/// Every heuristic constant in the pipeline, named in one place.
///
/// Defaults reproduce the tuned production values; tests and callers with
/// unusual documents can override individual fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    // Page batching and rendering
    /// Pages per thumbnail batch when asking which pages hold the table.
    pub relevance_batch_pages: usize,
    /// Pages per high-resolution batch during row extraction.
    pub extraction_batch_pages: usize,
    /// When selection finds nothing, try pages `1..=min(this, total)`.
    pub fallback_pages: u32,
    /// Render resolution for relevance thumbnails.
    pub thumb_dpi: u32,
    /// Render resolution for extraction pages.
    pub page_dpi: u32,

    // Scanned-document classifier
    /// Text layers shorter than this are presumed scans.
    pub min_text_len: usize,
    /// File size above which a thin text layer is suspicious.
    pub large_file_bytes: u64,
    /// "Thin" threshold used together with `large_file_bytes`.
    pub large_file_text_len: usize,
    /// Minimum fraction of letters and digits in the text layer.
    pub min_printable_ratio: f64,
    /// Minimum count of date-shaped substrings a statement should show.
    pub min_date_matches: usize,

    // Balance reconciliation
    /// How far a flow may sit from the balance delta and still match.
    pub balance_tolerance: f64,
    /// Swapped-consistent pairs must beat consistent pairs by this margin.
    pub swap_margin: usize,
    /// And there must be at least this many of them.
    pub swap_min_matches: usize,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            relevance_batch_pages: 6,
            extraction_batch_pages: 2,
            fallback_pages: 6,
            thumb_dpi: 140,
            page_dpi: 260,
            min_text_len: 800,
            large_file_bytes: 3 * 1024 * 1024 / 2, // 1.5 MiB
            large_file_text_len: 3000,
            min_printable_ratio: 0.25,
            min_date_matches: 3,
            balance_tolerance: 0.5,
            swap_margin: 3,
            swap_min_matches: 5,
        }
    }
}
