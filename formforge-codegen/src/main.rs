//! Formforge Codegen - form artifact generation tool
//!
//! Reads form configurations and writes, per form, the DDL file, the Zod
//! schema module, the type module and the server-action module.

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

use formforge::schema::loader::load_forms;
use formforge::{FormConfiguration, FormRegistry};
use formforge_codegen::{CodegenOptions, FormWriter};

#[derive(Parser)]
#[command(name = "formforge-codegen")]
#[command(about = "Generate TypeScript and SQL for formforge forms", long_about = None)]
struct Cli {
    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate code from form configurations
    Generate {
        /// Form configuration file or directory of .json/.toml files
        #[arg(short, long, default_value = "forms")]
        forms: PathBuf,

        /// Output directory for generated files
        #[arg(short, long, default_value = "generated")]
        out: PathBuf,

        /// Generator options (TOML)
        #[arg(long)]
        options: Option<PathBuf>,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    match cli.command {
        Commands::Generate {
            forms,
            out,
            options,
        } => generate(&forms, &out, options.as_deref())?,
    }

    Ok(())
}

fn generate(forms: &Path, out: &Path, options: Option<&Path>) -> anyhow::Result<()> {
    println!("🔧 Formforge Codegen");
    println!("📥 Forms: {}", forms.display());
    println!("📤 Output: {}", out.display());

    let options = match options {
        Some(path) => CodegenOptions::load(path)?,
        None => CodegenOptions::default(),
    };

    let configs = if forms.exists() {
        load_forms(forms)?
    } else {
        Vec::new()
    };
    let configs = if configs.is_empty() {
        println!("⚠️  No form configurations found, using the built-in example");
        vec![FormConfiguration::example()]
    } else {
        configs
    };

    let registry = FormRegistry::new(configs)?;
    let written = FormWriter::with_options(options).write_all(&registry, out)?;
    for path in &written {
        println!("✅ Generated: {}", path.display());
    }

    let count = registry.len();
    println!("✨ Generated {} form{}", count, if count == 1 { "" } else { "s" });
    Ok(())
}
