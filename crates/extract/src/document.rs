//! Page-oriented views over statement documents.
//!
//! A [`StatementDocument`] yields per-page text (the text layer, possibly
//! empty for scans) and, when it can, a rendered image of each page for OCR.

use std::panic;
use std::sync::Arc;

use tracing::debug;

use crate::extract::ExtractError;
use crate::render::PageRenderer;

/// Form feed, used by text extractors as a page separator.
pub const PAGE_BREAK: char = '\u{000C}';

pub trait StatementDocument: Send + Sync {
    fn page_count(&self) -> usize;

    /// Text layer of page `index`; empty when the page has none.
    fn page_text(&self, index: usize) -> Result<String, ExtractError>;

    /// Page `index` as encoded image bytes, for documents that can be rasterized.
    fn render_page(&self, index: usize) -> Result<Vec<u8>, ExtractError> {
        let _ = index;
        Err(ExtractError::RenderUnavailable)
    }
}

fn page_out_of_range(index: usize, count: usize) -> ExtractError {
    ExtractError::PageOutOfRange { index, count }
}

// ── Plain text ────────────────────────────────────────────────────────────────

/// Already-extracted statement text, split into pages on form feeds.
#[derive(Debug, Clone, Default)]
pub struct TextDocument {
    pages: Vec<String>,
}

impl TextDocument {
    pub fn new(pages: Vec<String>) -> Self {
        Self { pages }
    }

    pub fn from_text(text: &str) -> Self {
        Self::new(text.split(PAGE_BREAK).map(str::to_string).collect())
    }
}

impl StatementDocument for TextDocument {
    fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn page_text(&self, index: usize) -> Result<String, ExtractError> {
        self.pages
            .get(index)
            .cloned()
            .ok_or_else(|| page_out_of_range(index, self.pages.len()))
    }
}

// ── PDF ───────────────────────────────────────────────────────────────────────

/// A PDF: per-page text layer from `pdf-extract`, plus the raw bytes so
/// blank (scanned) pages can be handed to a [`PageRenderer`].
#[derive(Clone)]
pub struct PdfDocument {
    data: Arc<[u8]>,
    text: TextDocument,
    renderer: Arc<dyn PageRenderer>,
}

impl PdfDocument {
    pub fn from_bytes(data: Vec<u8>, renderer: Arc<dyn PageRenderer>) -> Result<Self, ExtractError> {
        let text = TextDocument::new(read_text_layer(&data)?);
        debug!(pages = text.page_count(), "loaded pdf text layer");
        Ok(Self {
            data: Arc::from(data),
            text,
            renderer,
        })
    }
}

fn read_text_layer(data: &[u8]) -> Result<Vec<String>, ExtractError> {
    // pdf-extract panics on some malformed files.
    match panic::catch_unwind(|| pdf_extract::extract_text_from_mem_by_pages(data)) {
        Ok(Ok(pages)) => Ok(pages),
        Ok(Err(e)) => Err(ExtractError::Pdf(e.to_string())),
        Err(_) => Err(ExtractError::Pdf("text extraction panicked".to_string())),
    }
}

impl StatementDocument for PdfDocument {
    fn page_count(&self) -> usize {
        self.text.page_count()
    }

    fn page_text(&self, index: usize) -> Result<String, ExtractError> {
        self.text.page_text(index)
    }

    fn render_page(&self, index: usize) -> Result<Vec<u8>, ExtractError> {
        if index >= self.page_count() {
            return Err(page_out_of_range(index, self.page_count()));
        }
        self.renderer.render(&self.data, index)
    }
}

// ── Scanned images ────────────────────────────────────────────────────────────

/// Scanned pages with no text layer at all; each entry is one encoded image.
#[derive(Debug, Clone, Default)]
pub struct ScannedDocument {
    images: Vec<Vec<u8>>,
}

impl ScannedDocument {
    pub fn new(images: Vec<Vec<u8>>) -> Self {
        Self { images }
    }
}

impl StatementDocument for ScannedDocument {
    fn page_count(&self) -> usize {
        self.images.len()
    }

    fn page_text(&self, index: usize) -> Result<String, ExtractError> {
        if index < self.images.len() {
            Ok(String::new())
        } else {
            Err(page_out_of_range(index, self.images.len()))
        }
    }

    fn render_page(&self, index: usize) -> Result<Vec<u8>, ExtractError> {
        self.images
            .get(index)
            .cloned()
            .ok_or_else(|| page_out_of_range(index, self.images.len()))
    }
}
