use std::{
	path::{Path, PathBuf},
	process::ExitCode,
};

use backlog::{Document, DocumentKind, SchemaSet};
use clap::{Args, Parser, Subcommand};
use color_eyre::eyre::{Result, WrapErr};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Inspect backlog markdown documents", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
	#[command(subcommand)]
	command: Commands,
}

#[derive(Subcommand)]
enum Commands {
	/// Print the parsed model of a document as JSON
	Inspect {
		path: PathBuf,
		#[clap(flatten)]
		schema: SchemaArgs,
	},
	/// Print the comment threads of a document as JSON
	Comments {
		path: PathBuf,
		#[clap(flatten)]
		schema: SchemaArgs,
	},
	/// Check that every file serializes back to exactly its own bytes
	Check {
		#[arg(required = true)]
		paths: Vec<PathBuf>,
		#[clap(flatten)]
		schema: SchemaArgs,
	},
}

#[derive(Args)]
struct SchemaArgs {
	/// Kind of document, selects the built-in parsing rules
	#[arg(long, short, value_enum, default_value_t = DocumentKind::Item)]
	kind: DocumentKind,
	/// TOML file overriding the built-in schemas
	#[arg(long)]
	schemas: Option<PathBuf>,
}

impl SchemaArgs {
	fn load(&self, path: &Path) -> Result<Document> {
		let set = match &self.schemas {
			Some(file) => SchemaSet::load(file)?,
			None => SchemaSet::builtin(),
		};
		Document::load(path, set.get(self.kind)).wrap_err_with(|| format!("while inspecting {}", path.display()))
	}
}

fn init_logging() {
	let directives = std::env::var("RUST_LOG").ok().or_else(|| option_env!("LOG_DIRECTIVES").map(str::to_string)).unwrap_or_else(|| "warn".to_string());
	tracing_subscriber::fmt().with_env_filter(EnvFilter::new(directives)).with_writer(std::io::stderr).init();
}

fn main() -> Result<ExitCode> {
	color_eyre::install()?;
	init_logging();
	let cli = Cli::parse();

	match cli.command {
		Commands::Inspect { path, schema } => {
			let doc = schema.load(&path)?;
			println!("{}", serde_json::to_string_pretty(&doc)?);
		}
		Commands::Comments { path, schema } => {
			let doc = schema.load(&path)?;
			println!("{}", serde_json::to_string_pretty(&doc.comments())?);
		}
		Commands::Check { paths, schema } => {
			let mut failed = 0;
			for path in &paths {
				let original = std::fs::read_to_string(path).wrap_err_with(|| format!("failed to read {}", path.display()))?;
				let doc = schema.load(path)?;
				if doc.to_markdown() != original {
					eprintln!("{}: does not round-trip", path.display());
					failed += 1;
				}
			}
			if failed > 0 {
				eprintln!("{failed} of {} files changed on re-serialization", paths.len());
				return Ok(ExitCode::FAILURE);
			}
		}
	}
	Ok(ExitCode::SUCCESS)
}
