//! Rasterizing PDF pages so scanned statements can go through OCR.

use crate::extract::ExtractError;

/// Three times PDF user space (72 dpi).
pub const RENDER_DPI: u32 = 216;

/// Turns page `index` of a PDF into encoded image bytes.
pub trait PageRenderer: Send + Sync {
    fn render(&self, pdf: &[u8], index: usize) -> Result<Vec<u8>, ExtractError>;
}

/// No rasterizer compiled in.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoRender;

impl PageRenderer for NoRender {
    fn render(&self, _pdf: &[u8], _index: usize) -> Result<Vec<u8>, ExtractError> {
        Err(ExtractError::RenderUnavailable)
    }
}

// ── pdftoppm backend (optional, gated behind `pdftoppm` feature) ──────────────

#[cfg(feature = "pdftoppm")]
pub mod pdftoppm_backend {
    use std::fs;
    use std::process::Command;

    use tracing::debug;

    use super::{PageRenderer, RENDER_DPI};
    use crate::extract::ExtractError;

    /// Renders through poppler's `pdftoppm`, one PNG per call.
    #[derive(Debug, Clone)]
    pub struct PdftoppmRenderer {
        program: String,
        dpi: u32,
    }

    impl PdftoppmRenderer {
        pub fn new(program: impl Into<String>, dpi: u32) -> Self {
            Self { program: program.into(), dpi }
        }
    }

    impl Default for PdftoppmRenderer {
        fn default() -> Self {
            Self::new("pdftoppm", RENDER_DPI)
        }
    }

    fn io_failure(e: std::io::Error) -> ExtractError {
        ExtractError::Render(e.to_string())
    }

    impl PageRenderer for PdftoppmRenderer {
        fn render(&self, pdf: &[u8], index: usize) -> Result<Vec<u8>, ExtractError> {
            let dir = tempfile::tempdir().map_err(io_failure)?;
            let input = dir.path().join("statement.pdf");
            fs::write(&input, pdf).map_err(io_failure)?;
            let root = dir.path().join("page");

            let page = (index + 1).to_string();
            let dpi = self.dpi.to_string();
            let output = Command::new(&self.program)
                .args(["-png", "-singlefile", "-r", dpi.as_str()])
                .args(["-f", page.as_str(), "-l", page.as_str()])
                .arg(&input)
                .arg(&root)
                .output()
                .map_err(|e| ExtractError::Render(format!("failed to run {}: {e}", self.program)))?;

            if !output.status.success() {
                let stderr = String::from_utf8_lossy(&output.stderr);
                return Err(ExtractError::Render(format!(
                    "{} failed (exit {}): {}",
                    self.program,
                    output.status.code().unwrap_or(-1),
                    stderr.trim(),
                )));
            }

            let image = fs::read(root.with_extension("png")).map_err(io_failure)?;
            debug!(page = index + 1, bytes = image.len(), "rendered pdf page");
            Ok(image)
        }
    }
}

/// `pdftoppm` when the feature is on, otherwise [`NoRender`].
pub fn default_renderer() -> Box<dyn PageRenderer> {
    #[cfg(feature = "pdftoppm")]
    {
        Box::new(pdftoppm_backend::PdftoppmRenderer::default())
    }
    #[cfg(not(feature = "pdftoppm"))]
    {
        Box::new(NoRender)
    }
}
