pub mod document;
pub mod extract;
pub mod pipeline;
pub mod preprocess;
pub mod recognizer;
pub mod render;
pub mod tables;

#[cfg(test)]
mod test_pdf;

pub use document::{PdfDocument, ScannedDocument, StatementDocument, TextDocument};
pub use extract::{DocumentExtractor, ExtractError, ExtractedContent, Extraction, ExtractionPath};
pub use pipeline::{Conversion, ConversionPipeline, InputKind, PipelineError};
pub use preprocess::{prepare_page_image, PreprocessError};
pub use recognizer::{default_backend, NoOcr, OcrBackend, OcrError, ScriptedRecognizer};
pub use render::{default_renderer, NoRender, PageRenderer};
pub use tables::{ColumnarTextExtractor, NoTables, TableExtractor};
