//! CLI binary for docquote.
//!
//! A thin shim over the library crate that maps CLI flags
//! to `QuoteConfig` and prints the resulting quotations.

use anyhow::{Context, Result};
use clap::Parser;
use docquote::{
    build_quotations, read_input, write_output, CostingFactors, CostingMode, Currency, Quotation,
    QuoteConfig, RawResponse, ResponseFormat,
};
use std::io::{self, Write};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn yellow(s: &str) -> String {
    format!("\x1b[33m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Tables from a markdown response, with Total / VAT / Grand Total
  docquote response.md

  # Structure-recognition JSON, priced with margin and freight
  docquote --format regions --margin 10 --freight 5 regions.json

  # Convert from USD to AED and write atomically to a file
  docquote --from USD --to AED ai_tables.json -o quote.md

  # Mark up the amount column only, keeping the document's prices and currency
  docquote --markup --margin 15 response.md

  # Export layout (spacer row + Total:/VAT:/Grand Total: rows)
  docquote --export response.md

  # JSON output for further processing
  docquote --json response.md > quote.json

RESPONSE FORMATS:
  auto      Sniff the body (default)
  markdown  Pipe tables inside markdown text
  tuple     JSON array whose first element is markdown
  regions   {"result": [{"type": "table", "res": {"html" | "cells"}}]}
  ai        {"tables": [{"columnNames": [...], "rows": [[...]]}]}

CURRENCIES:
  USD (base), AED, SAR, EUR, GBP, INR

ENVIRONMENT VARIABLES:
  Every flag can be set through DOCQUOTE_<FLAG>, e.g. DOCQUOTE_MARGIN=10.
  RUST_LOG overrides the log filter chosen by --verbose / --quiet.
"#;

/// Turn OCR/AI table responses into priced quotations.
#[derive(Parser, Debug)]
#[command(
    name = "docquote",
    version,
    about = "Turn OCR/AI table responses into priced quotations",
    long_about = "Extract tables from document-extraction responses (markdown, HTML regions, \
cell grids, AI JSON), derive Total / VAT / Grand Total rows, and optionally apply cost \
factors and currency conversion.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Response file to read.
    input: PathBuf,

    /// Write the quotation to this file instead of stdout.
    #[arg(short, long, env = "DOCQUOTE_OUTPUT")]
    output: Option<PathBuf>,

    /// How to interpret the response body.
    #[arg(long, env = "DOCQUOTE_FORMAT", value_enum, default_value = "auto")]
    format: FormatArg,

    /// Net margin, percent.
    #[arg(long, env = "DOCQUOTE_MARGIN", default_value_t = 0.0)]
    margin: f64,

    /// Freight, percent.
    #[arg(long, env = "DOCQUOTE_FREIGHT", default_value_t = 0.0)]
    freight: f64,

    /// Customs, percent.
    #[arg(long, env = "DOCQUOTE_CUSTOMS", default_value_t = 0.0)]
    customs: f64,

    /// Installation, percent.
    #[arg(long, env = "DOCQUOTE_INSTALLATION", default_value_t = 0.0)]
    installation: f64,

    /// Currency the document is priced in.
    #[arg(long, env = "DOCQUOTE_FROM", default_value = "USD")]
    from: String,

    /// Currency of the quotation.
    #[arg(long, env = "DOCQUOTE_TO", default_value = "USD")]
    to: String,

    /// VAT rate, percent.
    #[arg(long, env = "DOCQUOTE_VAT", default_value_t = 5.0)]
    vat: f64,

    /// Scale the amount column by the cost factors instead of repricing rates.
    #[arg(long, env = "DOCQUOTE_MARKUP")]
    markup: bool,

    /// Do not append missing Total / VAT / Grand Total rows.
    #[arg(long, env = "DOCQUOTE_NO_SUMMARY")]
    no_summary: bool,

    /// Render the export layout instead of the plain table.
    #[arg(long, env = "DOCQUOTE_EXPORT")]
    export: bool,

    /// Output structured JSON instead of Markdown.
    #[arg(long, env = "DOCQUOTE_JSON")]
    json: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "DOCQUOTE_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "DOCQUOTE_QUIET")]
    quiet: bool,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum FormatArg {
    Auto,
    Markdown,
    Tuple,
    Regions,
    Ai,
}

impl From<FormatArg> for ResponseFormat {
    fn from(v: FormatArg) -> Self {
        match v {
            FormatArg::Auto => ResponseFormat::Auto,
            FormatArg::Markdown => ResponseFormat::Markdown,
            FormatArg::Tuple => ResponseFormat::Tuple,
            FormatArg::Regions => ResponseFormat::Regions,
            FormatArg::Ai => ResponseFormat::Ai,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "error"
    } else {
        "warn"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    let config = build_config(&cli)?;

    // ── Extract and price ────────────────────────────────────────────────
    let body = read_input(&cli.input)
        .await
        .context("Failed to read response")?;
    let extraction = RawResponse::parse_as(&body, cli.format.into())
        .context("Failed to decode response")?
        .extract();

    if !cli.quiet {
        for skipped in &extraction.skipped {
            eprintln!("{} {}", yellow("⚠"), skipped);
        }
    }

    if extraction.is_empty() {
        if !cli.quiet {
            eprintln!("{} no tables found in {}", yellow("⚠"), cli.input.display());
        }
        return Ok(());
    }

    let quotations = build_quotations(&extraction, &config);
    if !cli.quiet {
        for (i, q) in quotations.iter().enumerate() {
            let unnamed = q.table.unnamed_columns();
            if !unnamed.is_empty() {
                let names: Vec<String> =
                    unnamed.iter().map(|&c| q.table.display_name(c)).collect();
                eprintln!(
                    "{} table {} has unnamed columns: {}",
                    yellow("⚠"),
                    i + 1,
                    names.join(", ")
                );
            }
        }
    }
    let rendered = if cli.json {
        serde_json::to_string_pretty(&quotations).context("Failed to serialise quotations")?
    } else {
        render_markdown(&quotations, cli.export)
    };

    // ── Output ───────────────────────────────────────────────────────────
    if let Some(ref output_path) = cli.output {
        write_output(output_path, &rendered)
            .await
            .context("Failed to write quotation")?;
        if !cli.quiet {
            eprintln!(
                "{}  {} table(s)  →  {}",
                green("✔"),
                quotations.len(),
                output_path.display()
            );
        }
    } else {
        let stdout = io::stdout();
        let mut handle = stdout.lock();
        handle
            .write_all(rendered.as_bytes())
            .context("Failed to write to stdout")?;
        if !rendered.ends_with('\n') {
            handle.write_all(b"\n").ok();
        }
        if !cli.quiet {
            let costed = quotations.iter().filter(|q| q.costed).count();
            eprintln!(
                "{}",
                dim(&format!(
                    "{} table(s), {} costed, {} region(s) skipped",
                    quotations.len(),
                    costed,
                    extraction.skipped.len()
                ))
            );
        }
    }

    Ok(())
}

/// Map CLI args to `QuoteConfig`.
fn build_config(cli: &Cli) -> Result<QuoteConfig> {
    let source = Currency::lookup(&cli.from).context("Invalid --from currency")?;
    let target = Currency::lookup(&cli.to).context("Invalid --to currency")?;

    QuoteConfig::builder()
        .factors(CostingFactors::new(
            cli.margin,
            cli.freight,
            cli.customs,
            cli.installation,
        ))
        .source_currency(source)
        .target_currency(target)
        .vat_percent(cli.vat)
        .derive_summary(!cli.no_summary)
        .costing_mode(if cli.markup {
            CostingMode::Markup
        } else {
            CostingMode::Reprice
        })
        .build()
        .context("Invalid configuration")
}

/// Tables separated by a blank line, each preceded by its currency.
fn render_markdown(quotations: &[Quotation], export: bool) -> String {
    quotations
        .iter()
        .map(|q| {
            let table = if export {
                q.export_markdown()
            } else {
                q.to_markdown()
            };
            format!("<!-- currency: {} -->\n{}", q.currency.code, table)
        })
        .collect::<Vec<_>>()
        .join("\n")
}
