//! Maintdesk CLI - CSV import/export for the maintenance desk
//!
//! # Main Commands
//!
//! ```bash
//! maintdesk serve                            # Start HTTP server (port 3000)
//! maintdesk import customers input.csv       # Validate and import into the store
//! maintdesk export spare_parts               # Export stored records to CSV
//! maintdesk template inventory               # Write an example CSV
//! ```
//!
//! # Debug Commands
//!
//! ```bash
//! maintdesk parse input.csv                  # Just parse CSV to JSON
//! maintdesk validate devices input.csv       # Validation errors only
//! maintdesk preview devices input.csv        # Mapped records + validation as JSON
//! maintdesk entities                         # List entity kinds and columns
//! ```

use clap::{Parser, Subcommand};
use maintdesk::export::export_filename_today;
use maintdesk::{
    catalogue, export_entity, export_from_store, import_file, parse_file, prepare_file, schema_for,
    template_artifact, validate_entity, Config, EntityKind, ExportArtifact, MappedRecord, MemoryStore,
    ParseOptions, RestStore,
};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "maintdesk")]
#[command(about = "Import and export maintenance desk records as CSV", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse a CSV file and output JSON
    Parse {
        /// Input CSV file
        input: PathBuf,

        #[command(flatten)]
        csv: CsvArgs,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Validate a CSV file against an entity schema
    Validate {
        /// Entity kind (customers, spare_parts, inventory, devices, maintenance_requests)
        entity: EntityKind,

        /// Input CSV file
        input: PathBuf,

        #[command(flatten)]
        csv: CsvArgs,
    },

    /// Parse, validate and map a CSV file without importing it
    Preview {
        entity: EntityKind,

        input: PathBuf,

        #[command(flatten)]
        csv: CsvArgs,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Validate a CSV file and insert its records into the store
    Import {
        entity: EntityKind,

        input: PathBuf,

        #[command(flatten)]
        csv: CsvArgs,

        /// Run every step against an in-memory store
        #[arg(long)]
        dry_run: bool,
    },

    /// Export records to CSV
    Export {
        entity: EntityKind,

        /// JSON file with an array of records (default: fetch from the store)
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Output file (default: <entity>_export_<date>.csv)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Write the example CSV for an entity
    Template {
        entity: EntityKind,

        /// Output file (default: <entity>_template.csv)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// List entity kinds and their columns
    Entities,

    /// Start HTTP server
    Serve {
        /// Port to listen on (default: MAINTDESK_PORT or 3000)
        #[arg(short, long)]
        port: Option<u16>,
    },
}

#[derive(clap::Args)]
struct CsvArgs {
    /// CSV delimiter (default: comma)
    #[arg(short, long)]
    delimiter: Option<char>,

    /// Guess the delimiter from the header line
    #[arg(long, conflicts_with = "delimiter")]
    detect_delimiter: bool,
}

impl CsvArgs {
    fn options(&self) -> ParseOptions {
        match self.delimiter {
            Some(d) => ParseOptions::with_delimiter(d),
            None if self.detect_delimiter => ParseOptions::detecting(),
            None => ParseOptions::default(),
        }
    }
}

#[tokio::main]
async fn main() {
    // Load .env file (if present)
    dotenvy::dotenv().ok();

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp(None)
        .format_target(false)
        .init();

    let cli = Cli::parse();

    let result = match Config::from_env() {
        Ok(config) => run(cli.command, config).await,
        Err(e) => Err(e.into()),
    };

    if let Err(e) = result {
        eprintln!("❌ Error: {}", e);
        std::process::exit(1);
    }
}

async fn run(command: Commands, config: Config) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        Commands::Parse { input, csv, output } => cmd_parse(&input, &csv.options(), output.as_deref()).await,

        Commands::Validate { entity, input, csv } => cmd_validate(entity, &input, &csv.options()).await,

        Commands::Preview {
            entity,
            input,
            csv,
            output,
        } => cmd_preview(entity, &input, &csv.options(), output.as_deref()).await,

        Commands::Import {
            entity,
            input,
            csv,
            dry_run,
        } => cmd_import(entity, &input, &csv.options(), dry_run, &config).await,

        Commands::Export { entity, input, output } => {
            cmd_export(entity, input.as_deref(), output.as_deref(), &config).await
        }

        Commands::Template { entity, output } => cmd_template(entity, output.as_deref()),

        Commands::Entities => cmd_entities(),

        Commands::Serve { port } => cmd_serve(port, config).await,
    }
}

async fn cmd_parse(
    input: &Path,
    options: &ParseOptions,
    output: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    eprintln!("📄 Parsing CSV: {}", input.display());

    let result = parse_file(input, options).await?;

    eprintln!("   Encoding: {}", result.encoding);
    eprintln!(
        "   Delimiter: '{}'{}",
        format_delimiter(result.delimiter),
        if options.detect_delimiter { " (auto-detected)" } else { "" }
    );
    eprintln!("   Columns: {}", result.headers.join(", "));
    eprintln!("✅ Parsed {} records", result.records.len());

    let json = serde_json::to_string_pretty(&result.records)?;
    write_output(&json, output)?;

    Ok(())
}

async fn cmd_validate(
    entity: EntityKind,
    input: &Path,
    options: &ParseOptions,
) -> Result<(), Box<dyn std::error::Error>> {
    eprintln!("✔️  Validating {} as {}", input.display(), entity.label());

    let parsed = parse_file(input, options).await?;
    let result = validate_entity(&parsed.records, schema_for(entity));

    if result.is_valid {
        eprintln!("📊 All {} rows valid", parsed.records.len());
        return Ok(());
    }

    for err in &result.errors {
        eprintln!("   - {}", err);
    }
    eprintln!("\n📊 {} error(s) in {} rows", result.errors.len(), parsed.records.len());
    std::process::exit(1);
}

async fn cmd_preview(
    entity: EntityKind,
    input: &Path,
    options: &ParseOptions,
    output: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    let preview = prepare_file(input, entity, options).await?;
    eprintln!("📊 {} of {} rows valid", preview.valid_rows, preview.total_rows);

    let json = serde_json::to_string_pretty(&preview)?;
    write_output(&json, output)?;

    Ok(())
}

async fn cmd_import(
    entity: EntityKind,
    input: &Path,
    options: &ParseOptions,
    dry_run: bool,
    config: &Config,
) -> Result<(), Box<dyn std::error::Error>> {
    let report = if dry_run {
        eprintln!("🧪 Dry run: records are not sent to the store");
        import_file(&MemoryStore::new(), input, entity, options).await?
    } else {
        let store = RestStore::from_config(config)?;
        import_file(&store, input, entity, options).await?
    };

    eprintln!(
        "✨ Imported {} of {} {} rows",
        report.imported,
        report.total_rows,
        entity.label().to_lowercase()
    );
    Ok(())
}

async fn cmd_export(
    entity: EntityKind,
    input: Option<&Path>,
    output: Option<&Path>,
    config: &Config,
) -> Result<(), Box<dyn std::error::Error>> {
    let artifact = match input {
        Some(path) => {
            let content = fs::read_to_string(path)?;
            let records: Vec<MappedRecord> = serde_json::from_str(&content)?;
            export_entity(&records, entity, export_filename_today(entity))?
        }
        None => {
            let store = RestStore::from_config(config)?;
            export_from_store(&store, entity).await?
        }
    };

    save_artifact(&artifact, output)
}

fn cmd_template(entity: EntityKind, output: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    let artifact = template_artifact(entity)?;
    save_artifact(&artifact, output)
}

fn cmd_entities() -> Result<(), Box<dyn std::error::Error>> {
    for info in catalogue() {
        println!("📄 {} ({})", info.label, info.key);
        println!("   {}", info.description);
        println!("   Columns: {}", info.columns.join(", "));
        println!("   Required: {}", info.required_columns.join(", "));
        println!("   Import: {}", if info.importable { "yes" } else { "no" });
        println!();
    }
    Ok(())
}

async fn cmd_serve(port: Option<u16>, mut config: Config) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(port) = port {
        config.port = port;
    }
    maintdesk::server::start_server(&config).await?;
    Ok(())
}

fn format_delimiter(d: char) -> String {
    match d {
        '\t' => "\\t".to_string(),
        c => c.to_string(),
    }
}

/// Write an artifact to `path`, or to its own filename in the working directory.
fn save_artifact(artifact: &ExportArtifact, path: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    let target = path.unwrap_or_else(|| Path::new(&artifact.filename));
    fs::write(target, &artifact.content)?;
    eprintln!("💾 Output written to: {}", target.display());
    Ok(())
}

fn write_output(content: &str, path: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    match path {
        Some(p) => {
            fs::write(p, content)?;
            eprintln!("💾 Output written to: {}", p.display());
        }
        None => {
            println!("{}", content);
        }
    }
    Ok(())
}
