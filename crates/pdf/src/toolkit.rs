use std::path::Path;

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PdfError {
    #[error("{tool} is not installed or not on PATH")]
    ToolMissing { tool: String },
    #[error("could not render page {page}: {detail}")]
    Render { page: u32, detail: String },
    #[error("wrong password or the document could not be decrypted")]
    WrongPassword,
    #[error("decryption failed: {0}")]
    Decrypt(String),
    #[error("encryption probe failed: {0}")]
    Probe(String),
    #[error("could not read the page count")]
    NoPages,
    #[error("could not inspect the document: {0}")]
    Inspect(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// What a quick look at a document yields: how many pages it has and
/// whatever text layer it carries (empty for pure scans).
#[derive(Debug, Clone, PartialEq)]
pub struct PdfSummary {
    pub pages: u32,
    pub text: String,
}

/// Abstraction over the external PDF binaries.
/// One implementation shells out to mutool and qpdf; tests use an
/// in-memory stub so no binaries are needed.
#[async_trait]
pub trait PdfToolkit: Send + Sync {
    /// Render one page to a PNG at the given resolution.
    async fn rasterize(&self, pdf: &Path, page: u32, dpi: u32, out: &Path)
        -> Result<(), PdfError>;

    /// Is the document password-protected?
    async fn is_encrypted(&self, pdf: &Path) -> Result<bool, PdfError>;

    /// Write a decrypted copy of `pdf` to `out`.
    async fn decrypt(&self, pdf: &Path, password: &str, out: &Path) -> Result<(), PdfError>;

    /// Page count plus the document's text layer.
    async fn inspect(&self, pdf: &Path) -> Result<PdfSummary, PdfError>;
}

// Shared toolkits delegate through the Arc.
#[async_trait]
impl<T: PdfToolkit + ?Sized> PdfToolkit for std::sync::Arc<T> {
    async fn rasterize(
        &self,
        pdf: &Path,
        page: u32,
        dpi: u32,
        out: &Path,
    ) -> Result<(), PdfError> {
        (**self).rasterize(pdf, page, dpi, out).await
    }

    async fn is_encrypted(&self, pdf: &Path) -> Result<bool, PdfError> {
        (**self).is_encrypted(pdf).await
    }

    async fn decrypt(&self, pdf: &Path, password: &str, out: &Path) -> Result<(), PdfError> {
        (**self).decrypt(pdf, password, out).await
    }

    async fn inspect(&self, pdf: &Path) -> Result<PdfSummary, PdfError> {
        (**self).inspect(pdf).await
    }
}
