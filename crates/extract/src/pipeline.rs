use std::path::Path;
use std::sync::Arc;

use sorter_core::{AccountInfo, CanonicalTransaction};
use sorter_import::import::{import_csv, import_workbook};
use sorter_import::{CsvError, Frame, TransactionProcessor, WorkbookError};
use thiserror::Error;
use tracing::info;

use crate::document::{PdfDocument, ScannedDocument, StatementDocument, TextDocument};
use crate::extract::{DocumentExtractor, ExtractError, ExtractedContent, ExtractionPath};
use crate::recognizer::{default_backend, OcrBackend};
use crate::render::{default_renderer, PageRenderer};
use crate::tables::ColumnarTextExtractor;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Unsupported file type: {0}")]
    UnsupportedFile(String),
    #[error("CSV decode failed: {0}")]
    Csv(#[from] CsvError),
    #[error("Workbook decode failed: {0}")]
    Workbook(#[from] WorkbookError),
    #[error("Text extraction failed: {0}")]
    Extract(#[from] ExtractError),
    #[error("No transactions found in the document")]
    NoTransactions,
    #[error("{rows} rows found but none could be processed")]
    NothingProcessed { rows: usize },
}

/// Input formats, chosen by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKind {
    Pdf,
    Csv,
    Workbook,
    Text,
    Image,
}

impl InputKind {
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "pdf" => Some(InputKind::Pdf),
            "csv" => Some(InputKind::Csv),
            "xls" | "xlsx" => Some(InputKind::Workbook),
            "txt" => Some(InputKind::Text),
            "png" | "jpg" | "jpeg" | "tif" | "tiff" => Some(InputKind::Image),
            _ => None,
        }
    }

    pub fn from_path(path: &Path) -> Result<Self, PipelineError> {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(Self::from_extension)
            .ok_or_else(|| PipelineError::UnsupportedFile(path.display().to_string()))
    }
}

/// The result of converting one statement.
#[derive(Debug, Clone)]
pub struct Conversion {
    pub account: AccountInfo,
    pub transactions: Vec<CanonicalTransaction>,
    /// `None` for tabular inputs that need no extraction.
    pub path: Option<ExtractionPath>,
}

impl Conversion {
    pub fn transaction_count(&self) -> usize {
        self.transactions.len()
    }

    pub fn deposit_count(&self) -> usize {
        self.transactions.iter().filter(|t| t.is_deposit()).count()
    }

    pub fn withdrawal_count(&self) -> usize {
        self.transactions.iter().filter(|t| t.is_withdrawal()).count()
    }
}

/// Orchestrates: decode/extract → parse or normalize → classify.
///
/// Holds only shared, read-only state, so one pipeline can serve many
/// documents concurrently.
#[derive(Clone)]
pub struct ConversionPipeline {
    processor: TransactionProcessor,
    extractor: DocumentExtractor,
    renderer: Arc<dyn PageRenderer>,
    /// Fields set here take precedence over anything read from the document.
    account: AccountInfo,
}

impl ConversionPipeline {
    pub fn new(processor: TransactionProcessor, extractor: DocumentExtractor, account: AccountInfo) -> Self {
        Self {
            processor,
            extractor,
            renderer: Arc::from(default_renderer()),
            account,
        }
    }

    /// Rasterizer for PDF pages without a text layer.
    pub fn with_renderer(mut self, renderer: Arc<dyn PageRenderer>) -> Self {
        self.renderer = renderer;
        self
    }

    /// Builtin rules, the compiled-in OCR engine and renderer, and the
    /// text-table fallback.
    pub fn with_defaults(account: AccountInfo) -> Self {
        let ocr: Arc<dyn OcrBackend> = Arc::from(default_backend());
        Self::new(
            TransactionProcessor::default(),
            DocumentExtractor::new(ocr, Arc::new(ColumnarTextExtractor)),
            account,
        )
    }

    /// Read and convert a file on disk.
    pub async fn convert_file(&self, path: &Path) -> Result<Conversion, PipelineError> {
        let kind = InputKind::from_path(path)?;
        let bytes = tokio::fs::read(path).await?;
        info!(path = %path.display(), ?kind, bytes = bytes.len(), "converting statement");
        self.convert(kind, bytes)
    }

    pub fn convert(&self, kind: InputKind, bytes: Vec<u8>) -> Result<Conversion, PipelineError> {
        match kind {
            InputKind::Csv => self.convert_frame(import_csv(&bytes)?),
            InputKind::Workbook => self.convert_frame(import_workbook(bytes)?),
            InputKind::Pdf => {
                self.convert_document(&PdfDocument::from_bytes(bytes, Arc::clone(&self.renderer))?)
            }
            InputKind::Text => {
                self.convert_document(&TextDocument::from_text(&String::from_utf8_lossy(&bytes)))
            }
            InputKind::Image => self.convert_document(&ScannedDocument::new(vec![bytes])),
        }
    }

    pub fn convert_frame(&self, frame: Frame) -> Result<Conversion, PipelineError> {
        self.finish(frame_transactions(&self.processor, frame)?, AccountInfo::new("", "", ""), None)
    }

    pub fn convert_document(&self, document: &dyn StatementDocument) -> Result<Conversion, PipelineError> {
        let extraction = self.extractor.extract(document)?;
        let transactions = match extraction.content {
            ExtractedContent::Lines(raw) => {
                let rows = raw.len();
                let processed = self.processor.process_raw(&raw);
                if processed.is_empty() {
                    return Err(PipelineError::NothingProcessed { rows });
                }
                processed
            }
            ExtractedContent::Table(frame) => frame_transactions(&self.processor, frame)?,
            ExtractedContent::Nothing => return Err(PipelineError::NoTransactions),
        };
        self.finish(transactions, extraction.account, Some(extraction.path))
    }

    fn finish(
        &self,
        transactions: Vec<CanonicalTransaction>,
        extracted: AccountInfo,
        path: Option<ExtractionPath>,
    ) -> Result<Conversion, PipelineError> {
        let conversion = Conversion {
            account: self.account.clone().or(extracted),
            transactions,
            path,
        };
        info!(
            transactions = conversion.transaction_count(),
            deposits = conversion.deposit_count(),
            withdrawals = conversion.withdrawal_count(),
            "conversion complete"
        );
        Ok(conversion)
    }
}

fn frame_transactions(
    processor: &TransactionProcessor,
    frame: Frame,
) -> Result<Vec<CanonicalTransaction>, PipelineError> {
    if frame.is_empty() {
        return Err(PipelineError::NoTransactions);
    }
    let rows = frame.len();
    let processed = processor.process_frame(frame);
    if processed.is_empty() {
        return Err(PipelineError::NothingProcessed { rows });
    }
    Ok(processed)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
