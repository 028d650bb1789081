//! docshift CLI - office document conversion tool

use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use dialoguer::{Input, Select};
use indicatif::{ProgressBar, ProgressStyle};

use docshift::{
    hand_off, resolve_input, ConversionFailure, Docshift, Extension, FilePicker, FormatCatalog,
    FormatSpecifier, Phase, SystemPublisher,
};

#[derive(Parser)]
#[command(name = "docshift")]
#[command(version)]
#[command(about = "Convert office documents with LibreOffice and copy the results", long_about = None)]
struct Cli {
    /// Selected files; the first supported one is converted
    #[arg(value_name = "FILE")]
    files: Vec<PathBuf>,

    /// Output format, e.g. ".pdf" or ".pdf+.doc"
    #[arg(short, long, value_name = "SPEC")]
    to: Option<String>,

    #[command(flatten)]
    run: RunArgs,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Args, Clone)]
struct RunArgs {
    /// LibreOffice binary (skips the PATH search)
    #[arg(long, value_name = "PATH", env = "DOCSHIFT_SOFFICE", global = true)]
    soffice: Option<PathBuf>,

    /// Dedicated LibreOffice user profile directory
    #[arg(long, value_name = "DIR", env = "DOCSHIFT_PROFILE", global = true)]
    profile_dir: Option<PathBuf>,

    /// Do not copy the results to the clipboard
    #[arg(long, global = true)]
    no_clipboard: bool,

    /// Do not reveal the results in the file manager
    #[arg(long, global = true)]
    no_reveal: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert the first supported file to one or more formats
    Convert {
        /// Selected files
        #[arg(value_name = "FILE")]
        files: Vec<PathBuf>,

        /// Output format, e.g. ".pdf" or ".pdf+.doc"
        #[arg(short, long, value_name = "SPEC")]
        to: Option<String>,
    },

    /// List the output formats available for a file or extension
    Formats {
        /// Document path or extension (e.g. "docx")
        #[arg(value_name = "FILE|EXT")]
        input: String,

        /// Output JSON
        #[arg(long)]
        json: bool,
    },

    /// Check whether LibreOffice can be found
    Check,

    /// Show version information
    Version,
}

/// Asks for a path on the terminal.
struct TerminalPicker;

impl FilePicker for TerminalPicker {
    fn pick(&self) -> Option<PathBuf> {
        if !std::io::stdin().is_terminal() {
            return None;
        }
        let answer: String = Input::new()
            .with_prompt("Document to convert")
            .allow_empty(true)
            .interact_text()
            .ok()?;
        let answer = answer.trim();
        if answer.is_empty() {
            None
        } else {
            Some(absolutize(Path::new(answer)))
        }
    }
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();

    let result = match cli.command {
        Some(Commands::Convert { files, to }) => cmd_convert(&files, to.as_deref(), &cli.run),
        Some(Commands::Formats { input, json }) => cmd_formats(&input, json),
        Some(Commands::Check) => cmd_check(&cli.run),
        Some(Commands::Version) => {
            cmd_version();
            Ok(())
        }
        None => {
            if cli.files.is_empty() && !std::io::stdin().is_terminal() {
                println!("{}", "Usage: docshift <FILE>... [--to SPEC]".yellow());
                println!("       docshift --help for more information");
                Ok(())
            } else {
                cmd_convert(&cli.files, cli.to.as_deref(), &cli.run)
            }
        }
    };

    if let Err(e) = result {
        eprintln!("{}: {}", "Error".red().bold(), e);
        if let Some(hint) = remediation(e.as_ref()) {
            eprintln!("{} {}", "Hint:".yellow().bold(), hint);
        }
        std::process::exit(1);
    }
}

fn remediation(err: &(dyn std::error::Error + 'static)) -> Option<&'static str> {
    if let Some(e) = err.downcast_ref::<docshift::Error>() {
        return e.remediation();
    }
    err.downcast_ref::<ConversionFailure>()
        .and_then(|f| f.error.remediation())
}

fn builder(run: &RunArgs) -> Docshift {
    let mut builder = Docshift::new();
    if let Some(binary) = &run.soffice {
        builder = builder.with_binary(binary);
    }
    if let Some(dir) = &run.profile_dir {
        builder = builder.with_profile_dir(absolutize(dir));
    }
    builder
}

fn absolutize(path: &Path) -> PathBuf {
    if path.is_absolute() {
        return path.to_path_buf();
    }
    std::env::current_dir()
        .map(|cwd| cwd.join(path))
        .unwrap_or_else(|_| path.to_path_buf())
}

fn choose_format(
    catalog: &FormatCatalog,
    source: &Extension,
) -> Result<FormatSpecifier, Box<dyn std::error::Error>> {
    let outputs = catalog.legal_outputs(source);
    let default = outputs
        .first()
        .ok_or_else(|| format!("Unsupported document type: {}", source))?;

    if !std::io::stdin().is_terminal() || outputs.len() == 1 {
        return Ok(default.clone());
    }

    let labels: Vec<String> = outputs.iter().map(|s| catalog.label(s)).collect();
    let index = Select::new()
        .with_prompt("Convert to")
        .items(&labels)
        .default(0)
        .interact()?;
    Ok(outputs[index].clone())
}

fn cmd_convert(
    files: &[PathBuf],
    to: Option<&str>,
    run: &RunArgs,
) -> Result<(), Box<dyn std::error::Error>> {
    let session = builder(run).build();

    // Nothing is read or picked until LibreOffice has been found.
    if session.probe() == Phase::Blocked {
        return Err(Box::new(docshift::Error::Blocked));
    }

    let catalog = session.orchestrator().catalog().clone();
    let selection: Vec<PathBuf> = files.iter().map(|p| absolutize(p)).collect();
    let input = resolve_input(&selection, &TerminalPicker, &catalog)
        .ok_or("No supported document selected")?;
    let source = Extension::from_path(&input)
        .ok_or_else(|| format!("{} has no extension", input.display()))?;

    let specifier = match to {
        Some(text) => text.parse::<FormatSpecifier>()?,
        None => choose_format(&catalog, &source)?,
    };

    let name = input
        .file_name()
        .unwrap_or_default()
        .to_string_lossy()
        .to_string();
    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::default_spinner().template("{spinner:.green} {msg}")?);
    pb.set_message(format!(
        "Converting {} to {}...",
        name,
        catalog.label(&specifier)
    ));
    pb.enable_steady_tick(Duration::from_millis(100));

    let outcome = session.convert(&input, specifier);
    pb.finish_and_clear();

    let result = match outcome {
        Ok(result) => result,
        Err(failure) => {
            if failure.is_partial() {
                println!("{}", "Already written:".yellow().bold());
                print_paths(&failure.produced);
            }
            return Err(Box::new(failure));
        }
    };

    println!("{} {}", "Converted".green().bold(), name);
    print_paths(result.output_paths());

    let publisher = SystemPublisher::new();
    let handoff = hand_off(
        &publisher,
        result.output_paths(),
        !run.no_clipboard,
        !run.no_reveal,
    );
    match handoff.clipboard {
        Some(Ok(())) => println!(
            "{} {} file(s) to the clipboard",
            "Copied".green(),
            result.len()
        ),
        Some(Err(e)) => println!("{} {}", "Warning:".yellow().bold(), e),
        None => {}
    }
    if let Some(Err(e)) = handoff.reveal {
        println!("{} {}", "Warning:".yellow().bold(), e);
    }

    Ok(())
}

fn print_paths(paths: &[PathBuf]) {
    for (i, path) in paths.iter().enumerate() {
        let branch = if i + 1 == paths.len() { "└─" } else { "├─" };
        println!("  {} {}", branch.dimmed(), path.display());
    }
}

fn cmd_formats(input: &str, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let source = Extension::from_path(Path::new(input))
        .or_else(|| Extension::new(input))
        .ok_or_else(|| format!("Not a file name or extension: {}", input))?;

    let catalog = FormatCatalog::new();
    let outputs = catalog.legal_outputs(&source);
    if outputs.is_empty() {
        return Err(format!("Unsupported document type: {}", source).into());
    }

    if json {
        let entries: Vec<serde_json::Value> = outputs
            .iter()
            .enumerate()
            .map(|(i, spec)| {
                serde_json::json!({
                    "specifier": spec,
                    "label": catalog.label(spec),
                    "default": i == 0,
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }

    println!("{} {}", "Formats for".cyan().bold(), source);
    for (i, spec) in outputs.iter().enumerate() {
        let marker = if i == 0 { " (default)" } else { "" };
        println!(
            "  {:<14} {}{}",
            spec.to_string(),
            catalog.label(spec),
            marker.dimmed()
        );
    }

    Ok(())
}

fn cmd_check(run: &RunArgs) -> Result<(), Box<dyn std::error::Error>> {
    match builder(run).probe().locate() {
        Some(path) => {
            println!("{} {}", "LibreOffice found:".green(), path.display());
            Ok(())
        }
        None => Err(Box::new(docshift::Error::Blocked)),
    }
}

fn cmd_version() {
    println!("{} {}", "docshift".cyan().bold(), env!("CARGO_PKG_VERSION"));
    println!("Office document conversion tool");
    println!();
    println!("Converter: {}", "LibreOffice (soffice)".dimmed());
    println!("License: MIT");
}
