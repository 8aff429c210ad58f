//! vds-lint CLI
//!
//! Entry point for the command-line tool and HTTP server.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use vds_lint::config::Config;
use vds_lint::engine::Engine;
use vds_lint::repositories::{PmsRepository, StandardsRepository, VdsIndexRepository};

#[derive(Parser, Debug)]
#[command(name = "vds-lint")]
#[command(about = "Resolves VDS codes into fully traced engineering datasheets", long_about = None)]
struct Args {
    /// Directory containing vds_rules.yaml, field_mappings.yaml, material_mappings.yaml
    #[arg(long, env = "VDS_LINT_CONFIG_DIR", default_value = "config")]
    config_dir: PathBuf,

    /// Directory containing piping_spec.json, vds_index.json, standards_clauses.json
    #[arg(long, env = "VDS_LINT_DATA_DIR", default_value = "data")]
    data_dir: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate a datasheet for one VDS code
    Generate {
        vds: String,
        /// Emit the flat fieldName/value projection instead of the structured view
        #[arg(long)]
        flat: bool,
    },
    /// Generate datasheets for many VDS codes, one per line from stdin
    Batch,
    /// Validate a VDS code without printing the full datasheet
    Validate { vds: String },
    /// Run the HTTP API server
    Serve {
        #[arg(long, env = "VDS_LINT_BIND_ADDR", default_value = "0.0.0.0:8080")]
        bind: String,
    },
    /// Explain which rule and source produce a given output field
    ExplainField { field_name: String },
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    match run() {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {err:?}");
            ExitCode::from(4)
        }
    }
}

fn run() -> Result<ExitCode> {
    let args = Args::parse();

    let engine = load_engine(&args.config_dir, &args.data_dir)?;

    match args.command {
        Command::Generate { vds, flat } => generate(&engine, &vds, flat),
        Command::Batch => batch(&engine),
        Command::Validate { vds } => validate(&engine, &vds),
        Command::Serve { bind } => serve(engine, &bind),
        Command::ExplainField { field_name } => explain_field(&engine, &field_name),
    }
}

fn load_engine(config_dir: &PathBuf, data_dir: &PathBuf) -> Result<Engine> {
    let config = Config::load(config_dir).context("failed to load configuration")?;
    let pms = PmsRepository::load(&data_dir.join("piping_spec.json")).context("failed to load piping spec")?;
    let standards = StandardsRepository::load(&data_dir.join("standards_clauses.json"))
        .context("failed to load standards clauses")?;
    let vds_index =
        VdsIndexRepository::load(&data_dir.join("vds_index.json")).context("failed to load VDS index")?;

    Ok(Engine::new(Arc::new(config), Arc::new(pms), Arc::new(standards), Arc::new(vds_index)))
}

fn generate(engine: &Engine, vds: &str, flat: bool) -> Result<ExitCode> {
    match engine.generate(vds) {
        Ok(datasheet) => {
            if flat {
                println!("{}", serde_json::to_string_pretty(&datasheet.flat_view())?);
            } else {
                println!("{}", serde_json::to_string_pretty(&datasheet)?);
            }
            Ok(ExitCode::SUCCESS)
        }
        Err(err) => {
            eprintln!("error: {err}");
            Ok(exit_code_for(&err))
        }
    }
}

fn batch(engine: &Engine) -> Result<ExitCode> {
    use std::io::Read;
    let mut input = String::new();
    std::io::stdin().read_to_string(&mut input).context("failed to read stdin")?;
    let vds_codes: Vec<String> = input.lines().map(str::trim).filter(|l| !l.is_empty()).map(str::to_string).collect();

    let results = engine.generate_batch(&vds_codes);
    println!("{}", serde_json::to_string_pretty(&results)?);

    let any_errors = results.iter().any(|r| matches!(r.status, vds_lint::model::BatchStatus::Error));
    Ok(if any_errors { ExitCode::from(2) } else { ExitCode::SUCCESS })
}

fn validate(engine: &Engine, vds: &str) -> Result<ExitCode> {
    match engine.generate(vds) {
        Ok(datasheet) => {
            println!("{}: {:?}", datasheet.metadata.vds_no, datasheet.metadata.validation_status);
            for e in &datasheet.metadata.validation_errors {
                println!("  error: {e}");
            }
            for w in &datasheet.metadata.warnings {
                println!("  warning: {w}");
            }
            Ok(if datasheet.metadata.validation_errors.is_empty() {
                ExitCode::SUCCESS
            } else {
                ExitCode::from(2)
            })
        }
        Err(err) => {
            eprintln!("error: {err}");
            Ok(exit_code_for(&err))
        }
    }
}

fn serve(engine: Engine, bind: &str) -> Result<ExitCode> {
    let addr: std::net::SocketAddr = bind.parse().context("invalid bind address")?;
    let runtime = tokio::runtime::Runtime::new().context("failed to start async runtime")?;
    runtime.block_on(async move {
        tracing::info!(%addr, "starting vds-lint HTTP server");
        let app = vds_lint::http::router(engine);
        let listener = tokio::net::TcpListener::bind(addr).await.context("failed to bind")?;
        axum::serve(listener, app).await.context("server error")?;
        Ok::<(), anyhow::Error>(())
    })?;
    Ok(ExitCode::SUCCESS)
}

fn explain_field(engine: &Engine, field_name: &str) -> Result<ExitCode> {
    let def = engine
        .config()
        .field_mappings
        .fields
        .iter()
        .find(|f| f.field_name == field_name);

    match def {
        Some(def) => {
            println!("Field: {}", def.field_name);
            println!("Display name: {}", def.display_name);
            println!("Section: {}", def.section);
            println!("Required: {}", def.required);
            println!("Source kind: {}", def.rule.kind_name());
            Ok(ExitCode::SUCCESS)
        }
        None => {
            eprintln!("error: unknown field '{field_name}'");
            Ok(ExitCode::from(2))
        }
    }
}

fn exit_code_for(err: &vds_lint::EngineError) -> ExitCode {
    match err {
        vds_lint::EngineError::Input(_) => ExitCode::from(2),
        vds_lint::EngineError::Config(_) => ExitCode::from(3),
        vds_lint::EngineError::Timeout | vds_lint::EngineError::Internal(_) => ExitCode::from(4),
    }
}
