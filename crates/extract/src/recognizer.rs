use std::collections::HashMap;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum OcrError {
    #[error("Page image decode error: {0}")]
    ImageDecode(String),
    #[error("OCR engine error: {0}")]
    Engine(String),
    #[error("Tesseract not available, build with the `tesseract` feature")]
    NotAvailable,
}

/// Abstraction over an OCR engine.
/// Implementations take one rendered page (PNG bytes) and return its text.
pub trait OcrBackend: Send + Sync {
    fn recognize(&self, page_image: &[u8]) -> Result<String, OcrError>;
}

// ── Scripted backend (always available, used for tests) ───────────────────────

/// Answers from a fixed table keyed by page image bytes. Unknown images fail,
/// which makes per-page OCR failures easy to stage.
#[derive(Debug, Default, Clone)]
pub struct ScriptedRecognizer {
    pages: HashMap<Vec<u8>, String>,
}

impl ScriptedRecognizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page(mut self, image: impl Into<Vec<u8>>, text: impl Into<String>) -> Self {
        self.pages.insert(image.into(), text.into());
        self
    }
}

impl OcrBackend for ScriptedRecognizer {
    fn recognize(&self, page_image: &[u8]) -> Result<String, OcrError> {
        self.pages
            .get(page_image)
            .cloned()
            .ok_or_else(|| OcrError::Engine(format!("no text staged for {}-byte image", page_image.len())))
    }
}

/// Backend used when no engine is configured; every page fails.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoOcr;

impl OcrBackend for NoOcr {
    fn recognize(&self, _page_image: &[u8]) -> Result<String, OcrError> {
        Err(OcrError::NotAvailable)
    }
}

// ── Tesseract backend (optional, gated behind `tesseract` feature) ─────────────

#[cfg(feature = "tesseract")]
pub mod tesseract_backend {
    use super::{OcrBackend, OcrError};
    use leptess::{LepTess, Variable};

    /// PSM 6, a single uniform block of text.
    pub(crate) const PAGE_SEG_MODE: &str = "6";

    pub struct TesseractRecognizer {
        data_path: Option<String>,
        lang: String,
    }

    impl TesseractRecognizer {
        pub fn new(data_path: Option<String>, lang: &str) -> Self {
            Self { data_path, lang: lang.to_string() }
        }
    }

    impl OcrBackend for TesseractRecognizer {
        fn recognize(&self, page_image: &[u8]) -> Result<String, OcrError> {
            // LepTess is not Sync; one instance per page.
            let mut lt = LepTess::new(self.data_path.as_deref(), &self.lang)
                .map_err(|e| OcrError::Engine(e.to_string()))?;
            lt.set_variable(Variable::TesseditPagesegMode, PAGE_SEG_MODE)
                .map_err(|e| OcrError::Engine(e.to_string()))?;
            lt.set_image_from_mem(page_image)
                .map_err(|e| OcrError::ImageDecode(e.to_string()))?;
            lt.get_utf8_text().map_err(|e| OcrError::Engine(e.to_string()))
        }
    }
}

/// The engine compiled into this build: Tesseract (`eng`) when the feature is
/// on, otherwise [`NoOcr`].
pub fn default_backend() -> Box<dyn OcrBackend> {
    #[cfg(feature = "tesseract")]
    {
        Box::new(tesseract_backend::TesseractRecognizer::new(None, "eng"))
    }
    #[cfg(not(feature = "tesseract"))]
    {
        Box::new(NoOcr)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scripted_returns_staged_text() {
        let r = ScriptedRecognizer::new().page(b"page-1".to_vec(), "01-04-2024 NEFT CR 1.00 2.00");
        assert_eq!(r.recognize(b"page-1").unwrap(), "01-04-2024 NEFT CR 1.00 2.00");
    }

    #[test]
    fn scripted_fails_unknown_pages() {
        let r = ScriptedRecognizer::new().page(b"page-1".to_vec(), "x");
        assert!(matches!(r.recognize(b"page-2"), Err(OcrError::Engine(_))));
    }

    #[test]
    fn no_ocr_always_fails() {
        assert!(matches!(NoOcr.recognize(b""), Err(OcrError::NotAvailable)));
    }

    #[cfg(feature = "tesseract")]
    #[test]
    fn tesseract_accepts_block_segmentation_and_rejects_garbage_image() {
        use leptess::{LepTess, Variable};

        let mut lt = LepTess::new(None, "eng").unwrap();
        assert!(lt
            .set_variable(Variable::TesseditPagesegMode, tesseract_backend::PAGE_SEG_MODE)
            .is_ok());

        let r = tesseract_backend::TesseractRecognizer::new(None, "eng");
        assert!(matches!(r.recognize(b"not an image"), Err(OcrError::ImageDecode(_))));
    }
}
