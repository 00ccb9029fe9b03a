//! `pset`: check, render and inspect event-processing configurations.
//!
//! Reads process files in the text form (`.cfg`, `.cfi`, `.cff`) or as JSON
//! documents, merges fragments given with `--load`, and finalizes the result
//! the way the engine would before accepting it.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};

use pset::check::{CheckOutcome, assemble, check_files, config_fragments};
use pset::core::error::ConfigError;
use pset::exit_codes;
use pset::io::cfg_store::{format_for, load_process_file, render, write_process_file};
use pset::io::config::{CONFIG_FILE, OutputFormat, ToolConfig, load_config, write_config};

#[derive(Parser)]
#[command(
    name = "pset",
    version,
    about = "Typed parameter-set configuration builder and checker"
)]
struct Cli {
    /// Tool configuration file.
    #[arg(long, global = true, default_value = CONFIG_FILE)]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Write a default `pset.toml` if missing.
    Init {
        /// Overwrite an existing file.
        #[arg(short, long)]
        force: bool,
    },
    /// Assemble a process and report every finalization problem.
    Check(Inputs),
    /// Finalize a process and print its serialized form.
    Dump {
        #[command(flatten)]
        inputs: Inputs,
        #[arg(long, value_enum)]
        format: Option<FormatArg>,
        /// Write to a file instead of stdout.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Print the module labels each path runs, sequences expanded.
    Schedule {
        #[command(flatten)]
        inputs: Inputs,
        /// Only this path.
        #[arg(long)]
        path: Option<String>,
    },
    /// Rewrite a process file in canonical form.
    Fmt {
        file: PathBuf,
        /// Output format; defaults to the one implied by the extension.
        #[arg(long, value_enum)]
        format: Option<FormatArg>,
        /// Exit non-zero instead of rewriting when the file is not canonical.
        #[arg(long)]
        check: bool,
    },
}

#[derive(clap::Args)]
struct Inputs {
    /// Main process file.
    file: PathBuf,
    /// Fragments merged after the main file and those in the config, in order.
    #[arg(long = "load", value_name = "FRAGMENT")]
    load: Vec<PathBuf>,
}

#[derive(Clone, Copy, ValueEnum)]
enum FormatArg {
    Text,
    Json,
}

impl From<FormatArg> for OutputFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Text => OutputFormat::Text,
            FormatArg::Json => OutputFormat::Json,
        }
    }
}

fn main() {
    pset::logging::init();
    match run() {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("{err:#}");
            std::process::exit(exit_code_for(&err));
        }
    }
}

fn exit_code_for(err: &anyhow::Error) -> i32 {
    match err.downcast_ref::<ConfigError>() {
        Some(config_err) if config_err.is_finalization_error() => exit_codes::UNRESOLVED,
        _ => exit_codes::INVALID,
    }
}

fn run() -> Result<i32> {
    let cli = Cli::parse();
    match cli.command {
        Command::Init { force } => cmd_init(&cli.config, force),
        Command::Check(inputs) => cmd_check(&cli.config, &inputs),
        Command::Dump {
            inputs,
            format,
            output,
        } => cmd_dump(&cli.config, &inputs, format, output.as_deref()),
        Command::Schedule { inputs, path } => cmd_schedule(&cli.config, &inputs, path.as_deref()),
        Command::Fmt {
            file,
            format,
            check,
        } => cmd_fmt(&cli.config, &file, format, check),
    }
}

fn cmd_init(config_path: &Path, force: bool) -> Result<i32> {
    if !force && config_path.exists() {
        println!("{} already exists", config_path.display());
        return Ok(exit_codes::OK);
    }
    write_config(config_path, &ToolConfig::default())
        .with_context(|| format!("write {}", config_path.display()))?;
    println!("wrote {}", config_path.display());
    Ok(exit_codes::OK)
}

fn fragments(config: &ToolConfig, config_path: &Path, inputs: &Inputs) -> Vec<PathBuf> {
    let mut paths = config_fragments(&config.check, config_path);
    paths.extend(inputs.load.iter().cloned());
    paths
}

fn cmd_check(config_path: &Path, inputs: &Inputs) -> Result<i32> {
    let config = load_config(config_path)?;
    let outcome = check_files(
        &inputs.file,
        &fragments(&config, config_path, inputs),
        &config.check,
    )?;
    print_outcome(&inputs.file, &outcome);
    if outcome.is_ok() {
        Ok(exit_codes::OK)
    } else {
        Ok(exit_codes::UNRESOLVED)
    }
}

fn print_outcome(file: &Path, outcome: &CheckOutcome) {
    for (module, path) in &outcome.unknown_gates {
        println!("warning: output module '{module}' selects unknown path '{path}'");
    }
    if outcome.is_ok() {
        println!(
            "ok: process {} ({} modules, {} paths)",
            outcome.process.name(),
            outcome.process.modules().count(),
            outcome.process.paths().count()
        );
        return;
    }
    for problem in &outcome.problems {
        println!("error: {}: {problem}", file.display());
    }
}

fn cmd_dump(
    config_path: &Path,
    inputs: &Inputs,
    format: Option<FormatArg>,
    output: Option<&Path>,
) -> Result<i32> {
    let config = load_config(config_path)?;
    let process = assemble(&inputs.file, &fragments(&config, config_path, inputs))?;
    let finalized = process.finalize()?;
    let format = format.map_or(config.render.format, OutputFormat::from);
    let options = config.render.options();
    match output {
        Some(path) => write_process_file(path, finalized.process(), format, &options)?,
        None => print!("{}", render(finalized.process(), format, &options)?),
    }
    Ok(exit_codes::OK)
}

fn cmd_schedule(config_path: &Path, inputs: &Inputs, only: Option<&str>) -> Result<i32> {
    let config = load_config(config_path)?;
    let process = assemble(&inputs.file, &fragments(&config, config_path, inputs))?;
    let finalized = process.finalize()?;
    if let Some(name) = only {
        let known = finalized
            .schedules()
            .iter()
            .any(|(def, _)| def.name == name);
        if !known {
            anyhow::bail!("no path or endpath named '{name}'");
        }
    }
    for (def, labels) in finalized.schedules() {
        if only.is_some_and(|name| name != def.name) {
            continue;
        }
        println!("{} {}: {}", def.kind, def.name, labels.join(" "));
    }
    Ok(exit_codes::OK)
}

fn cmd_fmt(config_path: &Path, file: &Path, format: Option<FormatArg>, check: bool) -> Result<i32> {
    let config = load_config(config_path)?;
    let process = load_process_file(file)?;
    let format = format.map_or_else(|| format_for(file), OutputFormat::from);
    let options = config.render.options();
    if check {
        let current = fs::read_to_string(file).with_context(|| format!("read {}", file.display()))?;
        if current != render(&process, format, &options)? {
            println!("{} is not formatted", file.display());
            return Ok(exit_codes::INVALID);
        }
        return Ok(exit_codes::OK);
    }
    write_process_file(file, &process, format, &options)?;
    Ok(exit_codes::OK)
}
