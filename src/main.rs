//! # Catalogo CLI
//!
//! Usage:
//!   catalogo template -o referencia.csv
//!   catalogo lookup --reference referencia.csv A-100
//!   catalogo add --catalog catalogo.json --reference referencia.csv --image foto.jpg --code A-100
//!   catalogo list --catalog catalogo.json
//!   catalogo export-pdf --catalog catalogo.json --config export.json
//!
//! The catalog JSON file is the session state between invocations.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use catalogo::image_loader::{encode_data_uri, DataUriDecoder};
use catalogo::{codec, export_file_name, ExportConfig, Session};

#[derive(Parser, Debug)]
#[command(name = "catalogo", version, about = "Build product catalogs from field photos")]
struct Cli {
    /// Export configuration (JSON). Defaults apply when omitted.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Write the reference table CSV template
    Template {
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Look up a code in a reference table
    Lookup {
        #[arg(long)]
        reference: PathBuf,
        code: String,
    },
    /// Add a product photo to the catalog
    Add {
        #[arg(long)]
        catalog: PathBuf,
        #[arg(long)]
        image: PathBuf,
        #[arg(long)]
        code: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        reference: Option<PathBuf>,
    },
    /// Remove the product at a zero-based position
    Remove {
        #[arg(long)]
        catalog: PathBuf,
        index: usize,
    },
    /// List the products in a catalog
    List {
        #[arg(long)]
        catalog: PathBuf,
    },
    /// Validate a catalog document without changing anything
    Check { catalog: PathBuf },
    /// Write the catalog as portable JSON
    ExportJson {
        #[arg(long)]
        catalog: PathBuf,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Render the catalog as a PDF
    ExportPdf {
        #[arg(long)]
        catalog: PathBuf,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn init_tracing(debug: bool) {
    let filter = if debug {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.debug);

    if let Err(e) = run(cli).await {
        eprintln!("✗ {:#}", e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = match &cli.config {
        Some(path) => ExportConfig::load(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => ExportConfig::default(),
    };

    match cli.command {
        Command::Template { output } => {
            let template = codec::to_tabular_template();
            match output {
                Some(path) => write_file(&path, template.as_bytes())?,
                None => print!("{}", template),
            }
        }

        Command::Lookup { reference, code } => {
            let mut session = Session::new(config);
            session.load_reference(&read_text(&reference)?)?;
            match session.lookup(&code) {
                Some(record) => {
                    println!("{}\t{}\t{}\t{}", record.code, record.description, record.group, record.subgroup)
                }
                None => bail!("code '{}' is not in {}", code, reference.display()),
            }
        }

        Command::Add {
            catalog,
            image,
            code,
            description,
            reference,
        } => {
            let mut session = open_catalog(config, &catalog)?;
            if let Some(reference) = &reference {
                session.load_reference(&read_text(reference)?)?;
            }
            let bytes =
                fs::read(&image).with_context(|| format!("failed to read {}", image.display()))?;
            let data_uri = encode_data_uri(&bytes)?;
            let entry = session.add_product(&data_uri, code.as_deref(), description.as_deref())?;
            eprintln!("✓ Added {}", describe(entry.code(), &entry.description));
            save_catalog(&session, &catalog)?;
        }

        Command::Remove { catalog, index } => {
            let mut session = open_catalog(config, &catalog)?;
            let removed = session.remove_at(index)?;
            eprintln!("✓ Removed {}", describe(removed.code(), &removed.description));
            save_catalog(&session, &catalog)?;
        }

        Command::List { catalog } => {
            let session = open_catalog(config, &catalog)?;
            for (i, entry) in session.snapshot().iter().enumerate() {
                println!(
                    "{:>4}  {:<16} {}  [{} / {}]",
                    i,
                    entry.code().unwrap_or("-"),
                    entry.description,
                    entry.group.as_deref().unwrap_or(""),
                    entry.subgroup.as_deref().unwrap_or("")
                );
            }
        }

        Command::Check { catalog } => {
            let entries = codec::from_portable(&read_text(&catalog)?)?;
            eprintln!("✓ {} is a valid catalog with {} entries", catalog.display(), entries.len());
        }

        Command::ExportJson { catalog, output } => {
            let session = open_catalog(config, &catalog)?;
            let json = session.export_json()?;
            let path = output.unwrap_or_else(|| timestamped("json"));
            write_file(&path, json.as_bytes())?;
        }

        Command::ExportPdf { catalog, output } => {
            let session = open_catalog(config, &catalog)?;
            let export = session.export_pdf_with(DataUriDecoder).await?;
            if export.summary.failed_images > 0 {
                eprintln!("! {} photo(s) could not be decoded", export.summary.failed_images);
            }
            let path = output.unwrap_or_else(|| timestamped("pdf"));
            write_file(&path, &export.bytes)?;
        }
    }

    Ok(())
}

/// Load a catalog file into a new session. A missing file is an empty catalog.
fn open_catalog(config: ExportConfig, path: &Path) -> Result<Session> {
    let mut session = Session::new(config);
    if path.exists() {
        let text = read_text(path)?;
        if !text.trim().is_empty() {
            session
                .import_json(&text)
                .with_context(|| format!("failed to load catalog {}", path.display()))?;
        }
    }
    Ok(session)
}

fn save_catalog(session: &Session, path: &Path) -> Result<()> {
    let json = codec::to_portable(&session.snapshot())?;
    fs::write(path, json).with_context(|| format!("failed to write {}", path.display()))?;
    info!(entries = session.store().len(), path = %path.display(), "catalog saved");
    Ok(())
}

fn read_text(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
}

fn write_file(path: &Path, bytes: &[u8]) -> Result<()> {
    fs::write(path, bytes).with_context(|| format!("failed to write {}", path.display()))?;
    eprintln!("✓ Written {} bytes to {}", bytes.len(), path.display());
    Ok(())
}

fn timestamped(extension: &str) -> PathBuf {
    PathBuf::from(export_file_name(extension, &chrono::Local::now()))
}

fn describe(code: Option<&str>, description: &str) -> String {
    match code {
        Some(code) => format!("{} ({})", code, description),
        None => description.to_string(),
    }
}
