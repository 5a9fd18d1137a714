//! wcc compiler driver
//!
//! Front door for the processing pass: reads a parsed AST (JSON) plus an
//! optional module-repository description, runs the processor, and writes
//! the produced IR as JSON or a readable dump. Parsing C source and
//! emitting WebAssembly live in their own tools; this binary owns only the
//! middle of the pipeline.

use clap::{Parser, Subcommand};
use log::{debug, info};
use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;
use wcc_ast::TranslationUnit;
use wcc_sema::{ModuleRepository, Processor};

#[derive(Parser)]
#[command(name = "wcc")]
#[command(about = "wcc C-to-WebAssembly compiler")]
#[command(version = "0.1.0")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Process a parsed AST into IR
    Process {
        /// Input AST file (JSON)
        input: PathBuf,

        /// Module repository description (JSON)
        #[arg(short, long)]
        modules: Option<PathBuf>,

        /// Output IR file; stdout when omitted
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Print a readable IR dump instead of JSON
        #[arg(long)]
        dump: bool,
    },
}

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Process {
            input,
            modules,
            output,
            dump,
        } => match process_file(&input, modules.as_deref(), output.as_deref(), dump) {
            Ok(()) => ExitCode::SUCCESS,
            Err(message) => {
                eprintln!("error: {}", message);
                ExitCode::FAILURE
            }
        },
    }
}

fn process_file(
    input: &std::path::Path,
    modules: Option<&std::path::Path>,
    output: Option<&std::path::Path>,
    dump: bool,
) -> Result<(), String> {
    let source = fs::read_to_string(input)
        .map_err(|err| format!("cannot read {}: {}", input.display(), err))?;
    let ast: TranslationUnit = serde_json::from_str(&source)
        .map_err(|err| format!("malformed AST in {}: {}", input.display(), err))?;
    debug!("loaded AST with {} top-level item(s)", ast.items.len());

    let repository = match modules {
        Some(path) => {
            let source = fs::read_to_string(path)
                .map_err(|err| format!("cannot read {}: {}", path.display(), err))?;
            serde_json::from_str::<ModuleRepository>(&source)
                .map_err(|err| format!("malformed module repository in {}: {}", path.display(), err))?
        }
        None => ModuleRepository::new(),
    };

    let processed = Processor::new(repository)
        .run(&ast)
        .map_err(|err| err.to_string())?;

    for warning in &processed.warnings {
        eprintln!("{}", warning);
    }
    info!(
        "processed module: {} function(s), {} data bytes",
        processed.module.functions.len(),
        processed.module.data_segment_size
    );

    let rendered = if dump {
        processed.module.to_string()
    } else {
        serde_json::to_string_pretty(&processed.module)
            .map_err(|err| format!("cannot serialize IR: {}", err))?
    };
    match output {
        Some(path) => fs::write(path, rendered)
            .map_err(|err| format!("cannot write {}: {}", path.display(), err))?,
        None => println!("{}", rendered),
    }
    Ok(())
}
