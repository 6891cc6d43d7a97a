//! docstamp command-line interface

use anyhow::Context;
use clap::Parser;
use docstamp::Pipeline;
use merge::TokenTable;
use render::Converter;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(
    name = "docstamp",
    version,
    about = "Fill a DOCX template with text and images, optionally render to PDF"
)]
struct Cli {
    /// Template package (never modified)
    template: PathBuf,

    /// Output document path
    output: PathBuf,

    /// Literal replacement, e.g. --token '{{name}}=Jane Doe'
    #[arg(long = "token", value_name = "KEY=VALUE")]
    tokens: Vec<String>,

    /// Image replacement, e.g. --image '{{logo}}=logo.png'
    #[arg(long = "image", value_name = "KEY=PATH")]
    images: Vec<String>,

    /// Token table as a JSON object; --token/--image entries override it
    #[arg(long, value_name = "FILE")]
    tokens_json: Option<PathBuf>,

    /// Render the output to PDF into this directory
    #[arg(long, value_name = "DIR")]
    pdf: Option<PathBuf>,

    /// Converter program
    #[arg(long, default_value = "soffice", value_name = "PROGRAM")]
    converter: PathBuf,

    /// Open the rendered PDF in the platform viewer
    #[arg(long)]
    open: bool,

    /// Increase log verbosity (-v: debug, -vv: trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let mut table = match &cli.tokens_json {
        Some(path) => TokenTable::from_json_file(path)
            .with_context(|| format!("reading token table {}", path.display()))?,
        None => TokenTable::new(),
    };
    for spec in &cli.tokens {
        let (key, value) = split_pair(spec)?;
        table.insert_text(key, value);
    }
    for spec in &cli.images {
        let (key, path) = split_pair(spec)?;
        table.insert_image(key, path);
    }

    let mut pipeline = Pipeline::new(&cli.template, &cli.output)
        .with_table(table)
        .with_converter(Converter::new(&cli.converter));
    if let Some(dir) = &cli.pdf {
        pipeline = pipeline.with_pdf_output(dir);
    }

    let report = pipeline.run()?;
    println!(
        "{} parts processed, {} text replacements, {} images injected",
        report.parts_processed, report.text_replacements, report.images_injected
    );
    if let Some(pdf) = &report.pdf {
        println!("rendered {}", pdf.display());
        if cli.open {
            open_viewer(pdf)?;
        }
    }
    Ok(())
}

fn split_pair(spec: &str) -> anyhow::Result<(&str, &str)> {
    spec.split_once('=')
        .ok_or_else(|| anyhow::anyhow!("expected KEY=VALUE, got {:?}", spec))
}

fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn open_viewer(path: &Path) -> anyhow::Result<()> {
    let mut command = if cfg!(target_os = "macos") {
        let mut c = std::process::Command::new("open");
        c.arg(path);
        c
    } else if cfg!(target_os = "windows") {
        let mut c = std::process::Command::new("cmd");
        c.args(["/C", "start", ""]).arg(path);
        c
    } else {
        let mut c = std::process::Command::new("xdg-open");
        c.arg(path);
        c
    };
    command
        .spawn()
        .with_context(|| format!("launching viewer for {}", path.display()))?;
    Ok(())
}
