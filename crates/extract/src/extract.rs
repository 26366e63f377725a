use std::sync::Arc;

use sorter_core::{AccountInfo, RawTransaction};
use sorter_import::{extract_account_info, parse_statement, Frame};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::document::StatementDocument;
use crate::preprocess::prepare_page_image;
use crate::recognizer::{OcrBackend, OcrError};
use crate::tables::{NoTables, TableExtractor};

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("PDF error: {0}")]
    Pdf(String),
    #[error("Page {index} out of range (document has {count})")]
    PageOutOfRange { index: usize, count: usize },
    #[error("Document cannot be rendered for OCR")]
    RenderUnavailable,
    #[error("Page rendering failed: {0}")]
    Render(String),
    #[error("OCR failed: {0}")]
    Ocr(#[from] OcrError),
    #[error("Document has no pages")]
    EmptyDocument,
    #[error("No page could be read: text layer empty and OCR failed on all {pages} pages")]
    Unreadable { pages: usize },
}

/// Which path produced the transactions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractionPath {
    TextLayer,
    Ocr,
    Table,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExtractedContent {
    /// Records from the statement line parser.
    Lines(Vec<RawTransaction>),
    /// A frame from the table-extraction collaborator.
    Table(Frame),
    Nothing,
}

#[derive(Debug, Clone)]
pub struct Extraction {
    /// Header fields found on the first page; bank is always blank.
    pub account: AccountInfo,
    pub content: ExtractedContent,
    pub path: ExtractionPath,
}

/// Text layer first, then per-page OCR, then table extraction.
#[derive(Clone)]
pub struct DocumentExtractor {
    ocr: Arc<dyn OcrBackend>,
    tables: Arc<dyn TableExtractor>,
}

impl DocumentExtractor {
    pub fn new(ocr: Arc<dyn OcrBackend>, tables: Arc<dyn TableExtractor>) -> Self {
        Self { ocr, tables }
    }

    pub fn with_ocr(ocr: Arc<dyn OcrBackend>) -> Self {
        Self::new(ocr, Arc::new(NoTables))
    }

    pub fn extract(&self, document: &dyn StatementDocument) -> Result<Extraction, ExtractError> {
        let pages = document.page_count();
        if pages == 0 {
            return Err(ExtractError::EmptyDocument);
        }

        let first_page = document.page_text(0).unwrap_or_else(|e| {
            warn!(error = %e, "could not read first page text layer");
            String::new()
        });

        let (text, header_text, path) = if !first_page.trim().is_empty() {
            let mut texts = vec![first_page.clone()];
            for index in 1..pages {
                match document.page_text(index) {
                    Ok(t) => texts.push(t),
                    Err(e) => warn!(page = index + 1, error = %e, "skipping unreadable page"),
                }
            }
            info!(pages, "using text layer");
            (texts.join("\n"), first_page, ExtractionPath::TextLayer)
        } else {
            info!(pages, "no text layer, running OCR");
            let texts = self.ocr_pages(document);
            if texts.is_empty() {
                // Nothing recognized; the table collaborator is all that is left.
                return match self.try_tables(document) {
                    Some(frame) => Ok(Extraction {
                        account: AccountInfo::new("", "", ""),
                        content: ExtractedContent::Table(frame),
                        path: ExtractionPath::Table,
                    }),
                    None => Err(ExtractError::Unreadable { pages }),
                };
            }
            let header = texts[0].clone();
            (texts.join("\n"), header, ExtractionPath::Ocr)
        };

        let account = extract_account_info(&header_text);
        let transactions = parse_statement(&text);
        debug!(count = transactions.len(), ?path, "parsed document text");

        if !transactions.is_empty() {
            return Ok(Extraction {
                account,
                content: ExtractedContent::Lines(transactions),
                path,
            });
        }

        Ok(match self.try_tables(document) {
            Some(frame) => Extraction {
                account,
                content: ExtractedContent::Table(frame),
                path: ExtractionPath::Table,
            },
            None => Extraction {
                account,
                content: ExtractedContent::Nothing,
                path,
            },
        })
    }

    /// Text of every page OCR could read, in page order. Failing pages are
    /// logged and dropped.
    fn ocr_pages(&self, document: &dyn StatementDocument) -> Vec<String> {
        (0..document.page_count())
            .filter_map(|index| match self.ocr_page(document, index) {
                Ok(text) => Some(text),
                Err(e) => {
                    warn!(page = index + 1, error = %e, "OCR failed, skipping page");
                    None
                }
            })
            .collect()
    }

    fn ocr_page(&self, document: &dyn StatementDocument, index: usize) -> Result<String, ExtractError> {
        let rendered = document.render_page(index)?;
        let image = prepare_page_image(&rendered).unwrap_or_else(|e| {
            debug!(page = index + 1, error = %e, "page preprocessing failed, using raw image");
            rendered
        });
        Ok(self.ocr.recognize(&image)?)
    }

    fn try_tables(&self, document: &dyn StatementDocument) -> Option<Frame> {
        match self.tables.extract_table(document) {
            Ok(Some(frame)) if !frame.is_empty() => {
                info!(rows = frame.len(), "using table extraction fallback");
                Some(frame)
            }
            Ok(_) => None,
            Err(e) => {
                warn!(error = %e, "table extraction failed");
                None
            }
        }
    }
}
