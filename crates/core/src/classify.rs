use std::sync::OnceLock;

use regex::Regex;

use crate::config::Tuning;

// ── Compiled regex cache ─────────────────────────────────────────────────────

macro_rules! re {
    ($name:ident, $pat:expr) => {
        fn $name() -> &'static Regex {
            static R: OnceLock<Regex> = OnceLock::new();
            R.get_or_init(|| Regex::new($pat).expect("invalid regex"))
        }
    };
}

re!(re_printable, r"[A-Za-zÁÉÍÓÚÜÑáéíóúüñ0-9]");
re!(re_date_like, r"\b(20\d{2}[-/]\d{2}[-/]\d{2}|\d{2}[-/]\d{2}[-/]20\d{2})\b");

/// Decide whether a document's text layer is too thin or too noisy to have
/// come from a digitally produced PDF. Such an upload is likely a scan or a
/// phone photo, and every page must be read as an image.
///
/// Signals, any of which flags the document:
/// - no text at all, or less than `min_text_len` characters;
/// - a large file with disproportionately little text (image-heavy);
/// - too few recognizable letters/digits relative to the length;
/// - fewer date-shaped substrings than a statement table would show.
pub fn is_scanned_like(text: &str, file_size: u64, cfg: &Tuning) -> bool {
    let t = text.trim();
    if t.is_empty() {
        return true;
    }

    let len = t.chars().count();
    let printable = re_printable().find_iter(t).count();
    let printable_ratio = printable as f64 / len.max(1) as f64;
    let big_file = file_size > cfg.large_file_bytes;
    let dates = re_date_like().find_iter(t).count();

    len < cfg.min_text_len
        || (big_file && len < cfg.large_file_text_len)
        || printable_ratio < cfg.min_printable_ratio
        || dates < cfg.min_date_matches
}
