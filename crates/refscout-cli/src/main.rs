use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::{Parser, Subcommand};
use refscout_core::config_file::{self, ConfigFile};
use refscout_core::lookup::openalex::{DEFAULT_BASE_URL, DEFAULT_TIMEOUT_SECS, OpenAlexLookup};
use refscout_core::{
    ExtractionResult, PageSource, ParsedReference, PdfBackend, TextPages, WorkLookup,
};
use refscout_parsing::{ParsingConfig, ParsingConfigBuilder, ReferenceExtractor};
use refscout_pdf_mupdf::MupdfBackend;

mod output;

use output::ColorMode;

/// Candidates shown per reference when looking titles up.
const MAX_CANDIDATES: usize = 3;

/// Bibliography extractor - Split the numbered reference list of a PDF into fields
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Extract and print the references of a PDF (or a form-feed paged .txt)
    Extract {
        /// Path to the PDF or .txt file
        file_path: PathBuf,

        /// Emit the references as JSON instead of a listing
        #[arg(long)]
        json: bool,

        /// Disable colored output
        #[arg(long)]
        no_color: bool,

        /// Path to output file
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Look each parsed title up on OpenAlex
        #[arg(long)]
        lookup: bool,

        /// OpenAlex API base URL
        #[arg(long)]
        openalex_url: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Extract {
            file_path,
            json,
            no_color,
            output,
            lookup,
            openalex_url,
        } => extract(file_path, json, no_color, output, lookup, openalex_url).await,
    }
}

async fn extract(
    file_path: PathBuf,
    json: bool,
    no_color: bool,
    output: Option<PathBuf>,
    lookup: bool,
    openalex_url: Option<String>,
) -> anyhow::Result<()> {
    let file_config = config_file::load_config();

    let color_allowed = file_config
        .display
        .as_ref()
        .and_then(|d| d.color)
        .unwrap_or(true);
    let color = ColorMode(color_allowed && !no_color && !json && output.is_none());

    if !file_path.exists() {
        anyhow::bail!("File not found: {}", file_path.display());
    }

    let file_name = file_path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| file_path.display().to_string());

    let source = open_source(&file_path, &file_config)?;
    let extractor = ReferenceExtractor::with_config(parsing_config(&file_config)?);
    let result = extractor.extract(&*source)?;

    // Only create the output file once there is something to write
    let mut writer: Box<dyn Write> = if let Some(ref output_path) = output {
        Box::new(std::fs::File::create(output_path)?)
    } else {
        Box::new(std::io::stdout())
    };

    let lookup = if lookup {
        Some(build_lookup(openalex_url, &file_config))
    } else {
        None
    };

    if json {
        write_json(&mut writer, &result, lookup.as_ref()).await
    } else {
        write_listing(&mut writer, &file_name, &result, lookup.as_ref(), color).await
    }
}

/// `.txt` input is read as form-feed separated pages; anything else is
/// opened through MuPDF with the configured header/footer bands.
fn open_source(path: &Path, file_config: &ConfigFile) -> anyhow::Result<Box<dyn PageSource>> {
    let is_text = path
        .extension()
        .map(|e| e.eq_ignore_ascii_case("txt"))
        .unwrap_or(false);

    if is_text {
        Ok(Box::new(TextPages::from_path(path)?))
    } else {
        Ok(pdf_backend(file_config).open(path)?)
    }
}

fn pdf_backend(file_config: &ConfigFile) -> MupdfBackend {
    let mut backend = MupdfBackend::new();
    if let Some(ref pdf) = file_config.pdf {
        if let Some(ratio) = pdf.header_exclusion {
            backend = backend.with_header_exclusion(ratio);
        }
        if let Some(ratio) = pdf.footer_exclusion {
            backend = backend.with_footer_exclusion(ratio);
        }
    }
    backend
}

fn parsing_config(file_config: &ConfigFile) -> anyhow::Result<ParsingConfig> {
    let mut builder = ParsingConfigBuilder::new();
    if let Some(ref parsing) = file_config.parsing {
        for pattern in parsing.trailing_artifacts.iter().flatten() {
            builder = builder.add_trailing_artifact(pattern.clone());
        }
        if let Some(dehyphenate) = parsing.dehyphenate {
            builder = builder.dehyphenate(dehyphenate);
        }
        if let Some(ref pattern) = parsing.marker_pattern {
            builder = builder.marker_strip_regex(pattern);
        }
    }
    Ok(builder.build()?)
}

/// Resolve lookup settings: CLI flags > env vars > config file > defaults.
fn build_lookup(openalex_url: Option<String>, file_config: &ConfigFile) -> OpenAlexLookup {
    let section = file_config.lookup.clone().unwrap_or_default();

    let base_url = openalex_url
        .or_else(|| std::env::var("OPENALEX_URL").ok())
        .or(section.openalex_url)
        .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
    let mailto = std::env::var("OPENALEX_MAILTO").ok().or(section.mailto);
    let timeout_secs = section.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS);

    let lookup =
        OpenAlexLookup::new(base_url).with_timeout(Duration::from_secs(timeout_secs));
    match mailto {
        Some(mailto) => lookup.with_mailto(mailto),
        None => lookup,
    }
}

async fn write_listing(
    writer: &mut Box<dyn Write>,
    file_name: &str,
    result: &ExtractionResult,
    lookup: Option<&OpenAlexLookup>,
    color: ColorMode,
) -> anyhow::Result<()> {
    output::print_header(writer, file_name, &result.stats, color)?;

    for (i, reference) in result.references.iter().enumerate() {
        output::print_reference(writer, i, reference, color)?;

        if let Some(lookup) = lookup
            && !reference.title.is_empty()
        {
            match lookup.search(&reference.title).await {
                Ok(mut candidates) => {
                    candidates.truncate(MAX_CANDIDATES);
                    output::print_candidates(writer, lookup.name(), &candidates, color)?;
                }
                Err(e) => {
                    output::print_lookup_error(writer, lookup.name(), &e.to_string(), color)?
                }
            }
        }

        writeln!(writer)?;
    }

    output::print_summary(writer, &result.stats, color)?;
    Ok(())
}

async fn write_json(
    writer: &mut Box<dyn Write>,
    result: &ExtractionResult,
    lookup: Option<&OpenAlexLookup>,
) -> anyhow::Result<()> {
    let Some(lookup) = lookup else {
        serde_json::to_writer_pretty(&mut *writer, &result.references)?;
        writeln!(writer)?;
        return Ok(());
    };

    let mut entries = Vec::with_capacity(result.references.len());
    for reference in &result.references {
        entries.push(json_with_candidates(reference, lookup).await?);
    }
    serde_json::to_writer_pretty(&mut *writer, &entries)?;
    writeln!(writer)?;
    Ok(())
}

/// A reference object with a `candidates` array appended. Lookup failures
/// are logged and leave the array empty.
async fn json_with_candidates(
    reference: &ParsedReference,
    lookup: &OpenAlexLookup,
) -> anyhow::Result<serde_json::Value> {
    let mut value = serde_json::to_value(reference)?;

    let candidates = if reference.title.is_empty() {
        Vec::new()
    } else {
        match lookup.search(&reference.title).await {
            Ok(mut candidates) => {
                candidates.truncate(MAX_CANDIDATES);
                candidates
            }
            Err(e) => {
                tracing::warn!(title = %reference.title, error = %e, "title lookup failed");
                Vec::new()
            }
        }
    };

    if let serde_json::Value::Object(ref mut map) = value {
        map.insert("candidates".into(), serde_json::to_value(candidates)?);
    }
    Ok(value)
}
