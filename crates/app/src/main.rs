use anyhow::{bail, Context, Result};
use chrono::{DateTime, Local};
use clap::Parser;
use sorter_core::AccountInfo;
use sorter_extract::{
    default_backend, ColumnarTextExtractor, ConversionPipeline, DocumentExtractor, OcrBackend,
};
use sorter_import::{Classifier, TransactionProcessor};
use sorter_report::{CsvSink, JsonSink, ReportAssembler, ReportSink, XlsxSink};
use std::collections::HashMap;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::task::JoinSet;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

mod config;

use config::{load_config, load_rules, OutputFormat};

#[derive(Parser, Debug)]
#[command(
    name = "statement-sorter",
    version,
    about = "Sort bank statements into categorized deposit/withdrawal summaries"
)]
struct Cli {
    /// Statements to convert (pdf, csv, xls, xlsx, txt, or scanned png/jpg/tiff)
    #[arg(required_unless_present = "print_rules")]
    inputs: Vec<PathBuf>,

    /// Config file (default: <config dir>/statement-sorter/config.toml)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Category rules TOML replacing the builtin table
    #[arg(long)]
    rules: Option<PathBuf>,

    /// Bank name printed on every sheet
    #[arg(long)]
    bank: Option<String>,

    /// Account holder name (overrides the statement header)
    #[arg(long)]
    name: Option<String>,

    /// Account number (overrides the statement header)
    #[arg(long)]
    account_no: Option<String>,

    /// Directory reports are written to
    #[arg(long)]
    out_dir: Option<PathBuf>,

    #[arg(long, value_enum)]
    format: Option<OutputFormat>,

    /// Print the active category rules as TOML and exit
    #[arg(long)]
    print_rules: bool,
}

/// `Bank_Summary_<input stem>_<YYYYmmdd_HHMMSS>`
fn report_stem(input: &Path, now: DateTime<Local>) -> String {
    let stem = input
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("statement");
    format!("Bank_Summary_{stem}_{}", now.format("%Y%m%d_%H%M%S"))
}

async fn convert_one(
    pipeline: &ConversionPipeline,
    sink: &dyn ReportSink,
    out_dir: &Path,
    input: &Path,
) -> Result<Vec<PathBuf>> {
    let conversion = pipeline
        .convert_file(input)
        .await
        .with_context(|| format!("converting {}", input.display()))?;

    let report = ReportAssembler::new(conversion.account.clone()).assemble(&conversion.transactions);
    let base = out_dir.join(report_stem(input, Local::now()));
    let written = sink
        .write(&report, &base)
        .with_context(|| format!("writing report for {}", input.display()))?;

    info!(
        input = %input.display(),
        transactions = conversion.transaction_count(),
        deposits = conversion.deposit_count(),
        withdrawals = conversion.withdrawal_count(),
        "statement converted"
    );
    Ok(written)
}

/// Reports written per input, and how many inputs failed.
#[derive(Debug, Default)]
struct Batch {
    written: Vec<(PathBuf, Vec<PathBuf>)>,
    failures: usize,
}

/// Runs `convert` on every input concurrently. A run that errors or panics is
/// logged and counted; the rest still finish.
async fn run_all<F, Fut>(inputs: Vec<PathBuf>, convert: F) -> Batch
where
    F: Fn(PathBuf) -> Fut,
    Fut: Future<Output = Result<Vec<PathBuf>>> + Send + 'static,
{
    let mut runs = JoinSet::new();
    let mut inputs_by_task = HashMap::new();
    for input in inputs {
        let run = convert(input.clone());
        let tagged = input.clone();
        let handle = runs.spawn(async move { (tagged, run.await) });
        inputs_by_task.insert(handle.id(), input);
    }

    let mut batch = Batch::default();
    while let Some(joined) = runs.join_next().await {
        match joined {
            Ok((input, Ok(written))) => batch.written.push((input, written)),
            Ok((input, Err(e))) => {
                error!(input = %input.display(), "{e:#}");
                batch.failures += 1;
            }
            Err(e) => {
                let input = inputs_by_task.remove(&e.id()).unwrap_or_default();
                error!(input = %input.display(), "conversion task panicked: {e}");
                batch.failures += 1;
            }
        }
    }
    batch
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;

    let rules_file = cli.rules.clone().or(config.rules_file.clone());
    let rules = load_rules(rules_file.as_deref())?;

    if cli.print_rules {
        print!("{}", rules.to_toml().context("serialize category rules")?);
        return Ok(());
    }

    let account = AccountInfo {
        name: cli.name.unwrap_or_default(),
        bank: cli.bank.unwrap_or(config.bank_name),
        account_no: cli.account_no.unwrap_or_default(),
    };
    let out_dir = cli.out_dir.unwrap_or(config.output_dir);
    let format = cli.format.unwrap_or(config.format);

    let ocr: Arc<dyn OcrBackend> = Arc::from(default_backend());
    let pipeline = Arc::new(ConversionPipeline::new(
        TransactionProcessor::new(Classifier::new(rules)),
        DocumentExtractor::new(ocr, Arc::new(ColumnarTextExtractor)),
        account,
    ));
    let sink: Arc<dyn ReportSink> = match format {
        OutputFormat::Xlsx => Arc::new(XlsxSink),
        OutputFormat::Json => Arc::new(JsonSink),
        OutputFormat::Csv => Arc::new(CsvSink),
    };
    let out_dir = Arc::new(out_dir);

    // Each document is an independent run; only read-only state is shared.
    let total = cli.inputs.len();
    let batch = run_all(cli.inputs, move |input| {
        let pipeline = Arc::clone(&pipeline);
        let sink = Arc::clone(&sink);
        let out_dir = Arc::clone(&out_dir);
        async move { convert_one(&pipeline, sink.as_ref(), &out_dir, &input).await }
    })
    .await;

    for (input, written) in &batch.written {
        for path in written {
            println!("{} -> {}", input.display(), path.display());
        }
    }

    if batch.failures > 0 {
        bail!("{} of {total} statements failed", batch.failures);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn report_stem_format() {
        let now = Local.with_ymd_and_hms(2024, 4, 30, 9, 5, 7).unwrap();
        assert_eq!(
            report_stem(Path::new("/tmp/april statement.pdf"), now),
            "Bank_Summary_april statement_20240430_090507"
        );
    }

    #[test]
    fn cli_parses_flags() {
        let cli = Cli::try_parse_from([
            "statement-sorter",
            "a.pdf",
            "b.csv",
            "--bank",
            "HDFC",
            "--format",
            "csv",
            "--account-no",
            "42",
        ])
        .unwrap();
        assert_eq!(cli.inputs.len(), 2);
        assert_eq!(cli.bank.as_deref(), Some("HDFC"));
        assert_eq!(cli.format, Some(OutputFormat::Csv));
        assert_eq!(cli.account_no.as_deref(), Some("42"));
    }

    #[test]
    fn inputs_required_unless_printing_rules() {
        assert!(Cli::try_parse_from(["statement-sorter"]).is_err());
        assert!(Cli::try_parse_from(["statement-sorter", "--print-rules"]).is_ok());
    }

    #[test]
    fn xlsx_format_flag() {
        let cli = Cli::try_parse_from(["statement-sorter", "a.pdf", "--format", "xlsx"]).unwrap();
        assert_eq!(cli.format, Some(OutputFormat::Xlsx));
    }

    // ── batch runs ────────────────────────────────────────────────────────────

    #[tokio::test]
    async fn panicking_run_is_counted_and_others_finish() {
        let inputs = vec![
            PathBuf::from("a.pdf"),
            PathBuf::from("broken.pdf"),
            PathBuf::from("c.csv"),
        ];
        let batch = run_all(inputs, |input| async move {
            if input == Path::new("broken.pdf") {
                panic!("malformed xref table");
            }
            Ok::<_, anyhow::Error>(vec![input.with_extension("json")])
        })
        .await;

        assert_eq!(batch.failures, 1);
        let mut done: Vec<_> = batch.written.iter().map(|(input, _)| input.clone()).collect();
        done.sort();
        assert_eq!(done, vec![PathBuf::from("a.pdf"), PathBuf::from("c.csv")]);
    }

    #[tokio::test]
    async fn failed_run_is_counted() {
        let batch = run_all(vec![PathBuf::from("a.txt"), PathBuf::from("b.txt")], |input| async move {
            if input == Path::new("a.txt") {
                bail!("no transactions found");
            }
            Ok::<_, anyhow::Error>(Vec::new())
        })
        .await;
        assert_eq!(batch.failures, 1);
        assert_eq!(batch.written.len(), 1);
    }

    // ── end to end ────────────────────────────────────────────────────────────

    #[tokio::test]
    async fn converts_text_statement_to_csv_report() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("april.txt");
        std::fs::write(
            &input,
            "01-04-2024 01-04-2024 SAL TRF APRIL 50,000.00 60,000.00\n\
             02-04-2024 02-04-2024 ATM CASH WDL 2,000.00 58,000.00\n",
        )
        .unwrap();

        let pipeline = ConversionPipeline::with_defaults(AccountInfo::default());
        let written = convert_one(&pipeline, &CsvSink, dir.path(), &input).await.unwrap();
        assert_eq!(written.len(), 3);

        let summary = std::fs::read_to_string(&written[2]).unwrap();
        assert!(summary.contains("Salary"));
        assert!(summary.contains("ATM Withdrawal"));
        assert!(summary.contains("\"50,000.00\""));
    }
}
