use std::path::{Path, PathBuf};
use std::process::Output;

use async_trait::async_trait;
use tokio::process::Command;

use crate::toolkit::{PdfError, PdfSummary, PdfToolkit};

/// Production toolkit: mutool does rendering and inspection, qpdf handles
/// encryption. Both are resolved from PATH unless an override points at a
/// bundled binary.
pub struct ShellTools {
    mutool: PathBuf,
    qpdf: PathBuf,
}

impl ShellTools {
    pub fn new(mutool: impl Into<PathBuf>, qpdf: impl Into<PathBuf>) -> Self {
        Self {
            mutool: mutool.into(),
            qpdf: qpdf.into(),
        }
    }

    /// Resolve binaries from `MUTOOL_PATH` / `QPDF_PATH`, defaulting to the
    /// bare names on PATH.
    pub fn from_env() -> Self {
        Self::new(env_or("MUTOOL_PATH", "mutool"), env_or("QPDF_PATH", "qpdf"))
    }
}

#[async_trait]
impl PdfToolkit for ShellTools {
    async fn rasterize(
        &self,
        pdf: &Path,
        page: u32,
        dpi: u32,
        out: &Path,
    ) -> Result<(), PdfError> {
        tracing::debug!("rendering page {page} at {dpi} dpi -> {}", out.display());
        // mutool draw -o out.png -r 140 -F png in.pdf 3
        let output = Command::new(&self.mutool)
            .arg("draw")
            .arg("-o")
            .arg(out)
            .args(["-r", &dpi.to_string(), "-F", "png"])
            .arg(pdf)
            .arg(page.to_string())
            .output()
            .await
            .map_err(|e| spawn_err(&self.mutool, e))?;

        if output.status.success() && out.exists() {
            Ok(())
        } else {
            Err(PdfError::Render {
                page,
                detail: stderr_text(&output),
            })
        }
    }

    async fn is_encrypted(&self, pdf: &Path) -> Result<bool, PdfError> {
        // Exit status 0 means encrypted, 2 means not.
        let output = Command::new(&self.qpdf)
            .arg("--is-encrypted")
            .arg(pdf)
            .output()
            .await
            .map_err(|e| spawn_err(&self.qpdf, e))?;

        match output.status.code() {
            Some(0) => Ok(true),
            Some(2) => Ok(false),
            _ => Err(PdfError::Probe(stderr_text(&output))),
        }
    }

    async fn decrypt(&self, pdf: &Path, password: &str, out: &Path) -> Result<(), PdfError> {
        tracing::debug!("decrypting {} with qpdf", pdf.display());
        let output = Command::new(&self.qpdf)
            .arg(format!("--password={password}"))
            .arg("--decrypt")
            .arg(pdf)
            .arg(out)
            .output()
            .await
            .map_err(|e| spawn_err(&self.qpdf, e))?;

        // qpdf exits 3 when it completed with warnings; the copy is usable.
        match output.status.code() {
            Some(0) | Some(3) => Ok(()),
            _ => {
                let stderr = stderr_text(&output);
                if stderr.to_lowercase().contains("invalid password") {
                    Err(PdfError::WrongPassword)
                } else {
                    Err(PdfError::Decrypt(stderr))
                }
            }
        }
    }

    async fn inspect(&self, pdf: &Path) -> Result<PdfSummary, PdfError> {
        let info = Command::new(&self.mutool)
            .arg("info")
            .arg(pdf)
            .output()
            .await
            .map_err(|e| spawn_err(&self.mutool, e))?;
        if !info.status.success() {
            return Err(PdfError::Inspect(stderr_text(&info)));
        }
        let pages = parse_page_count(&String::from_utf8_lossy(&info.stdout))
            .ok_or(PdfError::NoPages)?;

        // mutool draw -F txt -o - renders the whole text layer to stdout.
        let txt = Command::new(&self.mutool)
            .arg("draw")
            .args(["-F", "txt", "-o", "-"])
            .arg(pdf)
            .output()
            .await
            .map_err(|e| spawn_err(&self.mutool, e))?;
        if !txt.status.success() {
            return Err(PdfError::Inspect(stderr_text(&txt)));
        }

        Ok(PdfSummary {
            pages,
            text: String::from_utf8_lossy(&txt.stdout).into_owned(),
        })
    }
}

fn env_or(var: &str, default: &str) -> PathBuf {
    std::env::var_os(var)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(default))
}

fn tool_name(p: &Path) -> String {
    p.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| p.display().to_string())
}

fn spawn_err(tool: &Path, e: std::io::Error) -> PdfError {
    if e.kind() == std::io::ErrorKind::NotFound {
        PdfError::ToolMissing {
            tool: tool_name(tool),
        }
    } else {
        PdfError::Io(e)
    }
}

fn stderr_text(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).trim().to_string()
}

/// Pull the page count out of `mutool info` output, which carries a line
/// like `Pages: 12`.
fn parse_page_count(stdout: &str) -> Option<u32> {
    stdout
        .lines()
        .find_map(|line| line.trim().strip_prefix("Pages:"))
        .and_then(|rest| rest.trim().parse().ok())
        .filter(|n| *n > 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_count_parses_from_info_output() {
        let out = "file.pdf:\nPDF-1.7\nPages: 12\nEncrypted: no\n";
        assert_eq!(parse_page_count(out), Some(12));
    }

    #[test]
    fn page_count_tolerates_indentation() {
        assert_eq!(parse_page_count("   Pages:   3  \n"), Some(3));
    }

    #[test]
    fn missing_or_zero_page_count_is_none() {
        assert_eq!(parse_page_count("no page line here"), None);
        assert_eq!(parse_page_count("Pages: 0"), None);
        assert_eq!(parse_page_count("Pages: many"), None);
    }

    #[test]
    fn tool_name_prefers_the_file_name() {
        assert_eq!(tool_name(Path::new("/opt/bin/mutool")), "mutool");
        assert_eq!(tool_name(Path::new("qpdf")), "qpdf");
    }

    #[test]
    fn env_override_beats_default() {
        std::env::set_var("SALDO_TEST_TOOL", "/custom/mutool");
        assert_eq!(
            env_or("SALDO_TEST_TOOL", "mutool"),
            PathBuf::from("/custom/mutool")
        );
        std::env::remove_var("SALDO_TEST_TOOL");
        assert_eq!(env_or("SALDO_TEST_TOOL", "mutool"), PathBuf::from("mutool"));
    }
}
