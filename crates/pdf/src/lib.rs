//! PDF collaborators: rasterization and inspection via mutool, encryption
//! probing and decryption via qpdf. `StubToolkit` stands in for both in
//! tests.

pub mod shell;
pub mod stub;
pub mod toolkit;

pub use shell::ShellTools;
pub use stub::StubToolkit;
pub use toolkit::{PdfError, PdfSummary, PdfToolkit};
