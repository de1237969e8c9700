use std::path::Path;

use saldo_core::{dedupe, normalize, Movement, Tuning};
use saldo_oracle::{PngImage, VisionOracle};
use saldo_pdf::PdfToolkit;

use crate::pipeline::PipelineError;
use crate::prompts;

/// Read statement rows off the selected pages.
///
/// Pages go to the oracle in small high-resolution groups; every group's
/// renders live in a scratch directory that is dropped when the group
/// ends. Unlike the relevance pass, a failure here aborts: a page that
/// was selected but cannot be read means the result would be incomplete.
pub async fn read_movements<P, O>(
    pdf: &P,
    oracle: &O,
    document: &Path,
    pages: &[u32],
    cfg: &Tuning,
    scratch: &Path,
) -> Result<Vec<Movement>, PipelineError>
where
    P: PdfToolkit,
    O: VisionOracle,
{
    let mut rows: Vec<Movement> = Vec::new();

    for group in pages.chunks(cfg.extraction_batch_pages.max(1)) {
        let dir = tempfile::tempdir_in(scratch)?;

        let mut images = Vec::with_capacity(group.len());
        for &page in group {
            let render = dir.path().join(format!("page-{page}.png"));
            pdf.rasterize(document, page, cfg.page_dpi, &render).await?;
            images.push(PngImage::new(page, tokio::fs::read(&render).await?));
        }

        let reply = oracle.extract_movements(prompts::EXTRACTION, &images).await?;
        tracing::debug!("pages {group:?} produced {} raw rows", reply.movimientos.len());
        rows.extend(normalize::movements(&reply.movimientos));
    }

    Ok(dedupe(rows))
}
