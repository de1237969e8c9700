use std::collections::BTreeSet;
use std::path::Path;

use saldo_core::Tuning;
use saldo_oracle::{PngImage, VisionOracle};
use saldo_pdf::PdfToolkit;

use crate::pipeline::PipelineError;
use crate::prompts;

/// One relevance batch that produced nothing usable: the pages it covered
/// and what went wrong.
#[derive(Debug, Clone)]
pub struct ChunkFailure {
    pub pages: Vec<u32>,
    pub detail: String,
}

/// Outcome of the relevance pass: the table-bearing pages found, plus any
/// batches that failed along the way. Failures never abort the scan.
#[derive(Debug, Clone, Default)]
pub struct PageScan {
    /// Sorted, deduplicated 1-indexed page numbers.
    pub pages: Vec<u32>,
    pub failures: Vec<ChunkFailure>,
}

/// Walk the whole document in batches of low-res thumbnails and ask the
/// oracle which pages hold a movements table.
///
/// Per batch: render each page (a page that will not render is dropped
/// from the batch), send the survivors with an instruction naming their
/// real page numbers, keep only replies that point back at a submitted
/// page. Thumbnails live in a per-batch scratch directory that is removed
/// when the batch ends, on every path.
pub async fn find_table_pages<P, O>(
    pdf: &P,
    oracle: &O,
    document: &Path,
    total_pages: u32,
    cfg: &Tuning,
    scratch: &Path,
) -> Result<PageScan, PipelineError>
where
    P: PdfToolkit,
    O: VisionOracle,
{
    let mut found = BTreeSet::new();
    let mut failures = Vec::new();
    let all: Vec<u32> = (1..=total_pages).collect();

    for chunk in all.chunks(cfg.relevance_batch_pages.max(1)) {
        let dir = tempfile::tempdir_in(scratch)?;

        let mut images = Vec::with_capacity(chunk.len());
        for &page in chunk {
            let thumb = dir.path().join(format!("thumb-{page}.png"));
            match pdf.rasterize(document, page, cfg.thumb_dpi, &thumb).await {
                Ok(()) => images.push(PngImage::new(page, tokio::fs::read(&thumb).await?)),
                Err(e) => tracing::warn!("skipping page {page} thumbnail: {e}"),
            }
        }
        if images.is_empty() {
            failures.push(ChunkFailure {
                pages: chunk.to_vec(),
                detail: "no page in this batch could be rendered".to_string(),
            });
            continue;
        }

        let submitted: Vec<u32> = images.iter().map(|i| i.page).collect();
        match oracle.relevant_pages(&prompts::relevance(&submitted), &images).await {
            Ok(reply) => {
                for n in reply.pages {
                    if n < 1 || n > i64::from(total_pages) {
                        continue;
                    }
                    let n = n as u32;
                    // The oracle may only pick pages it was actually shown.
                    if submitted.contains(&n) {
                        found.insert(n);
                    }
                }
            }
            Err(e) => failures.push(ChunkFailure {
                pages: chunk.to_vec(),
                detail: e.to_string(),
            }),
        }
    }

    Ok(PageScan {
        pages: found.into_iter().collect(),
        failures,
    })
}
