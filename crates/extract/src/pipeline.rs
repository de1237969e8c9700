use std::path::{Path, PathBuf};

use thiserror::Error;

use saldo_core::{is_scanned_like, BalanceReconciler, Movement, Reconciliation, Tuning};
use saldo_oracle::{OracleError, VisionOracle};
use saldo_pdf::{PdfError, PdfToolkit};

use crate::extract;
use crate::select::{self, ChunkFailure};

#[derive(Debug, Error)]
pub enum PipelineError {
    /// The document is encrypted and no password came with the upload.
    #[error("the document is password-protected")]
    PasswordRequired,
    #[error("PDF handling failed: {0}")]
    Pdf(#[from] PdfError),
    #[error("oracle call failed: {0}")]
    Oracle(#[from] OracleError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Everything one processed statement produced.
#[derive(Debug)]
pub struct StatementReport {
    /// Whether the upload was encrypted (and therefore decrypted here).
    pub encrypted: bool,
    /// Classifier verdict: text layer too thin/noisy to be digital.
    pub scanned: bool,
    /// The pages rows were extracted from, sorted.
    pub pages: Vec<u32>,
    /// Normalized, deduplicated, balance-repaired rows.
    pub movements: Vec<Movement>,
    /// Relevance batches that failed (oracle errors, unrenderable pages).
    pub selection_failures: Vec<ChunkFailure>,
    /// What the balance repair did.
    pub reconciliation: Reconciliation,
}

/// Orchestrates: probe → decrypt → inspect → classify → select pages →
/// fallback → extract rows → reconcile.
pub struct StatementPipeline<P: PdfToolkit, O: VisionOracle> {
    pdf: P,
    oracle: O,
    tuning: Tuning,
    scratch_root: PathBuf,
}

impl<P: PdfToolkit, O: VisionOracle> StatementPipeline<P, O> {
    /// `scratch_root` must exist; every batch renders into its own
    /// temp directory underneath it.
    pub fn new(pdf: P, oracle: O, tuning: Tuning, scratch_root: impl Into<PathBuf>) -> Self {
        Self {
            pdf,
            oracle,
            tuning,
            scratch_root: scratch_root.into(),
        }
    }

    /// Process one uploaded statement on disk.
    pub async fn process(
        &self,
        document: &Path,
        password: Option<&str>,
    ) -> Result<StatementReport, PipelineError> {
        // 1. Size of the upload feeds the scanned-document classifier.
        let file_size = tokio::fs::metadata(document).await?.len();

        // 2. Encrypted documents are decrypted to a scratch copy that the
        //    guard deletes when processing ends.
        let encrypted = self.pdf.is_encrypted(document).await?;
        let mut decrypted = None;
        if encrypted {
            let password = password
                .filter(|p| !p.is_empty())
                .ok_or(PipelineError::PasswordRequired)?;
            let copy = tempfile::Builder::new()
                .suffix(".pdf")
                .tempfile_in(&self.scratch_root)?;
            self.pdf.decrypt(document, password, copy.path()).await?;
            decrypted = Some(copy);
        }
        let doc: &Path = decrypted
            .as_ref()
            .map(|f| f.path())
            .unwrap_or(document);

        // 3. Page count and raw text layer.
        let summary = self.pdf.inspect(doc).await?;
        if summary.pages == 0 {
            return Err(PdfError::NoPages.into());
        }

        // 4. Classify. Both verdicts take the same vision path; the verdict
        //    is reported as the processing mode.
        let scanned = is_scanned_like(&summary.text, file_size, &self.tuning);
        tracing::info!(
            "{} pages, {} chars of text, scanned={scanned}, encrypted={encrypted}",
            summary.pages,
            summary.text.len(),
        );

        // 5. Which pages hold the table?
        let scan = select::find_table_pages(
            &self.pdf,
            &self.oracle,
            doc,
            summary.pages,
            &self.tuning,
            &self.scratch_root,
        )
        .await?;
        for failure in &scan.failures {
            tracing::warn!("relevance batch {:?} failed: {}", failure.pages, failure.detail);
        }

        // 6. Nothing found → read the leading pages instead.
        let mut pages = scan.pages;
        if pages.is_empty() {
            pages = (1..=summary.pages.min(self.tuning.fallback_pages)).collect();
            tracing::info!("no table pages detected, falling back to {pages:?}");
        }

        // 7. Extract, normalize, dedupe.
        let mut movements = extract::read_movements(
            &self.pdf,
            &self.oracle,
            doc,
            &pages,
            &self.tuning,
            &self.scratch_root,
        )
        .await?;

        // 8. Repair the flow columns against the running balance.
        let reconciliation = BalanceReconciler::from_tuning(&self.tuning).repair(&mut movements);

        Ok(StatementReport {
            encrypted,
            scanned,
            pages,
            movements,
            selection_failures: scan.failures,
            reconciliation,
        })
    }
}
