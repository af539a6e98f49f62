//! CLI binary for mortgage-extract.
//!
//! A thin shim over the library crate that maps CLI flags
//! to `ExtractionConfig` and prints results.

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use mortgage_extract::{
    process_folder, process_to_file, ExtractionConfig, ExtractionProgressCallback, FieldMode,
    FixedTaxLookup, OutputFormat, ProgressCallback, TaxRate,
};
use std::io;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress callback: a live progress bar plus one log line per
/// image.
struct CliProgressCallback {
    bar: ProgressBar,
    /// Start time of the image currently being processed.
    started: Mutex<Option<Instant>>,
    records: AtomicUsize,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new(0); // length set in on_run_start

        let spinner_style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);

        bar.set_style(spinner_style);
        bar.set_prefix("Preparing");
        bar.set_message("Scanning folder…");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self {
            bar,
            started: Mutex::new(None),
            records: AtomicUsize::new(0),
        })
    }

    fn activate_bar(&self, total: usize) {
        let progress_style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {pos:>3}/{len} images  \
             ⏱ {elapsed_precise}  ETA {eta_precise}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);

        self.bar.set_length(total as u64);
        self.bar.set_style(progress_style);
        self.bar.set_prefix("Extracting");
        self.bar.reset_eta();
    }

    fn elapsed_secs(&self) -> f64 {
        self.started
            .lock()
            .ok()
            .and_then(|mut s| s.take())
            .map(|t| t.elapsed().as_secs_f64())
            .unwrap_or(0.0)
    }
}

impl ExtractionProgressCallback for CliProgressCallback {
    fn on_run_start(&self, total_images: usize) {
        self.activate_bar(total_images);
        self.bar.println(format!(
            "{} {}",
            cyan("◆"),
            bold(&format!("Extracting records from {total_images} images…"))
        ));
    }

    fn on_image_start(&self, _index: usize, _total: usize, file_name: &str) {
        if let Ok(mut s) = self.started.lock() {
            *s = Some(Instant::now());
        }
        self.bar.set_message(file_name.to_string());
    }

    fn on_image_complete(&self, index: usize, total: usize, file_name: &str, records: usize) {
        let secs = self.elapsed_secs();
        self.records.fetch_add(records, Ordering::SeqCst);
        self.bar.println(format!(
            "  {} {:>3}/{:<3}  {:<24}  {}  {}",
            green("✓"),
            index,
            total,
            file_name,
            dim(&format!("{records:>2} records")),
            dim(&format!("{secs:.1}s")),
        ));
        self.bar.inc(1);
    }

    fn on_image_error(&self, index: usize, total: usize, file_name: &str, error: &str) {
        let secs = self.elapsed_secs();

        // Truncate very long error messages to keep output tidy.
        let msg = if error.chars().count() > 80 {
            format!("{}\u{2026}", error.chars().take(79).collect::<String>())
        } else {
            error.to_string()
        };

        self.bar.println(format!(
            "  {} {:>3}/{:<3}  {:<24}  {}  {}",
            red("✗"),
            index,
            total,
            file_name,
            red(&msg),
            dim(&format!("{secs:.1}s")),
        ));
        self.bar.inc(1);
    }

    fn on_run_complete(&self, total_images: usize, success_count: usize) {
        let failed = total_images.saturating_sub(success_count);
        self.bar.finish_and_clear();

        if failed == 0 {
            eprintln!(
                "{} {} images processed, {} raw records",
                green("✔"),
                bold(&success_count.to_string()),
                self.records.load(Ordering::SeqCst)
            );
        } else {
            eprintln!(
                "{} {}/{} images processed  ({} failed)",
                if failed == total_images {
                    red("✘")
                } else {
                    cyan("⚠")
                },
                bold(&success_count.to_string()),
                total_images,
                red(&failed.to_string()),
            );
        }
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Extract every record in ./scans into ./output.xlsx
  mortgage-extract scans/

  # Write the report somewhere else
  mortgage-extract scans/ reports/march

  # Comma-joined text report instead of a spreadsheet
  mortgage-extract --format txt scans/ reports/

  # Ask the service for text only and convert numbers locally
  mortgage-extract --field-mode text scans/

  # Offline property tax (skip the Wikipedia lookup)
  mortgage-extract --tax-rate NA scans/

  # Full run result as JSON on stdout (no report file)
  mortgage-extract --json scans/ > run.json

INPUT:
  Every .png, .jpg and .jpeg file directly inside <INPUT_FOLDER> (any case),
  processed in file-name order. Name pages so they sort in page order
  (page_01.jpg, page_02.jpg, ...); records cut off at the bottom of one
  image are merged with their continuation at the top of the next.

ENVIRONMENT VARIABLES:
  AZURE_API_KEY                 API key for the OCR service
  MORTGAGE_EXTRACT_ENDPOINT     Override the OCR endpoint URL
  MORTGAGE_EXTRACT_MODEL        Override the document-AI model
  RUST_LOG                      Override log filtering (e.g. debug)
"#;

/// Extract mortgage records from scanned page images.
#[derive(Parser, Debug)]
#[command(
    name = "mortgage-extract",
    version,
    about = "Extract mortgage-document records from scanned page images",
    long_about = "Send each scanned page to a document-AI OCR service, merge records that \
continue across pages, compute loan figures, and write an xlsx or text report.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Folder containing the scanned page images.
    input_folder: PathBuf,

    /// Folder to write the report into (created if missing).
    #[arg(default_value = ".")]
    output_folder: PathBuf,

    /// Report format: xlsx or txt.
    #[arg(long, env = "MORTGAGE_EXTRACT_FORMAT", value_enum, default_value = "xlsx")]
    format: FormatArg,

    /// Field types requested from the service: numeric or text.
    #[arg(long, env = "MORTGAGE_EXTRACT_FIELD_MODE", value_enum, default_value = "numeric")]
    field_mode: FieldModeArg,

    /// OCR service endpoint URL.
    #[arg(long, env = "MORTGAGE_EXTRACT_ENDPOINT")]
    endpoint: Option<String>,

    /// Document-AI model ID.
    #[arg(long, env = "MORTGAGE_EXTRACT_MODEL")]
    model: Option<String>,

    /// Environment variable holding the API key.
    #[arg(long, default_value = "AZURE_API_KEY")]
    api_key_env: String,

    /// Pause after each successful image, in milliseconds.
    #[arg(long, env = "MORTGAGE_EXTRACT_PACING_MS", default_value_t = 2000)]
    pacing_ms: u64,

    /// Per-image OCR call timeout in seconds.
    #[arg(long, env = "MORTGAGE_EXTRACT_API_TIMEOUT", default_value_t = 60)]
    api_timeout: u64,

    /// Use a fixed property-tax figure (a number, or NA) instead of the web lookup.
    #[arg(long, env = "MORTGAGE_EXTRACT_TAX_RATE")]
    tax_rate: Option<String>,

    /// Print the full run result as JSON on stdout instead of writing a report.
    #[arg(long)]
    json: bool,

    /// Disable progress bar.
    #[arg(long, env = "MORTGAGE_EXTRACT_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long)]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long)]
    quiet: bool,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum FormatArg {
    Xlsx,
    Txt,
}

impl From<FormatArg> for OutputFormat {
    fn from(v: FormatArg) -> Self {
        match v {
            FormatArg::Xlsx => OutputFormat::Xlsx,
            FormatArg::Txt => OutputFormat::Text,
        }
    }
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum FieldModeArg {
    Numeric,
    Text,
}

impl From<FieldModeArg> for FieldMode {
    fn from(v: FieldModeArg) -> Self {
        match v {
            FieldModeArg::Numeric => FieldMode::Numeric,
            FieldModeArg::Text => FieldMode::Text,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // Suppress INFO-level library logs when the progress bar is active;
    // the bar provides all the feedback that matters to the user.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // ── Build config ─────────────────────────────────────────────────────
    let progress_cb: Option<ProgressCallback> = if show_progress {
        let cb = CliProgressCallback::new();
        Some(cb as Arc<dyn ExtractionProgressCallback>)
    } else {
        None
    };

    let config = build_config(&cli, progress_cb)?;

    // ── Run extraction ───────────────────────────────────────────────────
    if cli.json {
        let output = process_folder(&cli.input_folder, &config)
            .await
            .context("Extraction failed")?;
        let json = serde_json::to_string_pretty(&output).context("Failed to serialise output")?;
        println!("{json}");
        return Ok(());
    }

    let stats = process_to_file(&cli.input_folder, &cli.output_folder, &config)
        .await
        .context("Extraction failed")?;

    if cli.quiet {
        return Ok(());
    }
    match stats.output_path {
        Some(ref path) => eprintln!(
            "{}  {} records  {}/{} images  {}ms  →  {}",
            if stats.failed_images == 0 {
                green("✔")
            } else {
                cyan("⚠")
            },
            stats.records,
            stats.processed_images,
            stats.total_images,
            stats.total_duration_ms,
            bold(&path.display().to_string()),
        ),
        None => eprintln!("{} Could not process the data...", red("✘")),
    }
    if stats.incomplete_records > 0 {
        eprintln!(
            "   {}",
            dim(&format!(
                "{} records are missing fields",
                stats.incomplete_records
            ))
        );
    }

    Ok(())
}

/// Map CLI args to `ExtractionConfig`.
fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<ExtractionConfig> {
    let mut builder = ExtractionConfig::builder()
        .output_format(cli.format.into())
        .field_mode(cli.field_mode.into())
        .api_key_env(&cli.api_key_env)
        .pacing_ms(cli.pacing_ms)
        .api_timeout_secs(cli.api_timeout);

    if let Some(ref endpoint) = cli.endpoint {
        builder = builder.endpoint(endpoint);
    }
    if let Some(ref model) = cli.model {
        builder = builder.model(model);
    }
    if let Some(ref rate) = cli.tax_rate {
        let rate = parse_tax_rate(rate)?;
        builder = builder.tax_lookup(Arc::new(FixedTaxLookup(rate)));
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}

/// Parse `--tax-rate`: a number, or `NA`.
fn parse_tax_rate(s: &str) -> Result<TaxRate> {
    let s = s.trim();
    if s.eq_ignore_ascii_case("na") {
        return Ok(TaxRate::NotAvailable);
    }
    let value: f64 = s
        .parse()
        .with_context(|| format!("Invalid --tax-rate '{s}': expected a number or NA"))?;
    if !value.is_finite() {
        anyhow::bail!("Invalid --tax-rate '{s}': must be finite");
    }
    Ok(TaxRate::Rate(value))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tax_rate_parsing() {
        assert_eq!(parse_tax_rate("na").unwrap(), TaxRate::NotAvailable);
        assert_eq!(parse_tax_rate(" 12.5 ").unwrap(), TaxRate::Rate(12.5));
        assert!(parse_tax_rate("lots").is_err());
        assert!(parse_tax_rate("inf").is_err());
    }

    #[test]
    fn output_folder_defaults_to_cwd() {
        let cli = Cli::parse_from(["mortgage-extract", "scans"]);
        assert_eq!(cli.output_folder, PathBuf::from("."));
        assert!(matches!(cli.format, FormatArg::Xlsx));
    }
}
