use std::collections::HashSet;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;

use crate::toolkit::{PdfError, PdfSummary, PdfToolkit};

/// In-memory toolkit for tests: canned page count and text layer, no
/// external binaries. Rendered "images" are small marker payloads that
/// carry the page number.
pub struct StubToolkit {
    pages: u32,
    text: String,
    encrypted: bool,
    password: Option<String>,
    failing: HashSet<u32>,
    rendered: Mutex<Vec<(u32, u32)>>,
}

impl StubToolkit {
    pub fn plain(pages: u32, text: impl Into<String>) -> Self {
        Self {
            pages,
            text: text.into(),
            encrypted: false,
            password: None,
            failing: HashSet::new(),
            rendered: Mutex::new(Vec::new()),
        }
    }

    pub fn encrypted(pages: u32, text: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            encrypted: true,
            password: Some(password.into()),
            ..Self::plain(pages, text)
        }
    }

    /// Make `rasterize` fail for the given pages.
    pub fn failing_pages(mut self, pages: &[u32]) -> Self {
        self.failing.extend(pages.iter().copied());
        self
    }

    /// Every successful render so far, as `(page, dpi)` pairs.
    pub fn rendered(&self) -> Vec<(u32, u32)> {
        lock(&self.rendered).clone()
    }
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|e| e.into_inner())
}

#[async_trait]
impl PdfToolkit for StubToolkit {
    async fn rasterize(
        &self,
        _pdf: &Path,
        page: u32,
        dpi: u32,
        out: &Path,
    ) -> Result<(), PdfError> {
        if self.failing.contains(&page) {
            return Err(PdfError::Render {
                page,
                detail: "stub render failure".into(),
            });
        }
        tokio::fs::write(out, format!("stub-png-page-{page}")).await?;
        lock(&self.rendered).push((page, dpi));
        Ok(())
    }

    async fn is_encrypted(&self, _pdf: &Path) -> Result<bool, PdfError> {
        Ok(self.encrypted)
    }

    async fn decrypt(&self, _pdf: &Path, password: &str, out: &Path) -> Result<(), PdfError> {
        if self.password.as_deref() == Some(password) {
            tokio::fs::write(out, b"stub-decrypted-pdf").await?;
            Ok(())
        } else {
            Err(PdfError::WrongPassword)
        }
    }

    async fn inspect(&self, _pdf: &Path) -> Result<PdfSummary, PdfError> {
        Ok(PdfSummary {
            pages: self.pages,
            text: self.text.clone(),
        })
    }
}
