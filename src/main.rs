use clap::{Parser, Subcommand};

mod explain;
mod figure;
mod jaal;
mod render;

use anyhow::{Context, bail};
use std::fs;
use std::ops::Range;
use std::path::{Path, PathBuf};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

pub type Result<T> = anyhow::Result<T>;

#[derive(Parser)]
#[command(name = "jaal-tools")]
#[command(about = "Decode JAAL exercise recordings and render them as HTML", long_about = None)]
struct Cli {
    /// Enable debug logging.
    #[arg(short, long, global = true, env = "JAAL_VERBOSE")]
    verbose: bool,

    /// Only log errors.
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render each recording into a human-readable HTML report.
    Report {
        /// Recording files, or directories whose *.json files are read.
        #[arg(default_value = ".")]
        inputs: Vec<PathBuf>,

        /// Output directory [default: html/ beside the first input].
        #[arg(short = 'o', long, env = "JAAL_OUT_DIR")]
        out_dir: Option<PathBuf>,
    },

    /// Walk a wrapped recording through the decode chain, printing each stage.
    Decode {
        input: PathBuf,

        /// Where to write the decoded JSON text [default: <stem>-decoded.json].
        #[arg(short = 'o', long, env = "JAAL_DECODED_OUT")]
        out: Option<PathBuf>,

        /// Print characters START..END of the decoded text (repeatable).
        #[arg(long, value_parser = parse_window)]
        window: Vec<Range<usize>>,
    },

    /// Draw a weighted example graph as SVG.
    Draw {
        /// Figure description (JSON); the built-in example if omitted.
        #[arg(long, env = "JAAL_FIGURE")]
        figure: Option<PathBuf>,

        #[arg(short = 'o', long, env = "JAAL_SVG_OUT", default_value = "example1.svg")]
        out: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "error"
    } else {
        "info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)))
        .with_writer(std::io::stderr)
        .init();

    match cli.cmd {
        Commands::Report { inputs, out_dir } => run_report(&inputs, out_dir)?,
        Commands::Decode { input, out, window } => run_decode(&input, out, &window)?,
        Commands::Draw { figure, out } => run_draw(figure.as_deref(), &out)?,
    }

    Ok(())
}

fn run_report(inputs: &[PathBuf], out_dir: Option<PathBuf>) -> Result<()> {
    let files = collect_json_files(inputs)?;
    if files.is_empty() {
        bail!("no JSON recordings found in {:?}", inputs);
    }

    let out_dir = match out_dir {
        Some(dir) => dir,
        None => default_out_dir(&inputs[0]),
    };
    fs::create_dir_all(&out_dir)
        .with_context(|| format!("create output directory {}", out_dir.display()))?;

    let mut explainer = explain::SemanticExplainer::new();
    let mut failed = 0usize;
    for file in &files {
        info!("reading {}", file.display());
        match report_one(file, &out_dir, &mut explainer) {
            Ok(out) => println!("Wrote {}", out.display()),
            Err(e) => {
                error!("{}: {:#}", file.display(), e);
                failed += 1;
            }
        }
    }

    if failed > 0 {
        bail!("{} of {} recordings could not be reported", failed, files.len());
    }
    Ok(())
}

fn report_one(
    file: &Path,
    out_dir: &Path,
    explainer: &mut explain::SemanticExplainer,
) -> Result<PathBuf> {
    let recording = jaal::load_recording(file)?;
    let submission_id = file
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .with_context(|| format!("no file name in {}", file.display()))?;

    let html = render::render_html_report(&recording, &submission_id, explainer)?;
    let out = out_dir.join(format!("{}.html", submission_id));
    fs::write(&out, html).with_context(|| format!("write {}", out.display()))?;
    Ok(out)
}

/// Files are taken as given; directories contribute their *.json files, sorted.
fn collect_json_files(inputs: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for input in inputs {
        if !input.is_dir() {
            files.push(input.clone());
            continue;
        }
        let mut found = Vec::new();
        for entry in fs::read_dir(input).with_context(|| format!("list {}", input.display()))? {
            let path = entry?.path();
            if path.is_file() && path.extension().is_some_and(|e| e == "json") {
                found.push(path);
            }
        }
        found.sort();
        files.extend(found);
    }
    Ok(files)
}

fn default_out_dir(first_input: &Path) -> PathBuf {
    if first_input.is_dir() {
        return first_input.join("html");
    }
    match first_input.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.join("html"),
        _ => PathBuf::from("html"),
    }
}

fn run_decode(input: &Path, out: Option<PathBuf>, windows: &[Range<usize>]) -> Result<()> {
    let text = fs::read_to_string(input).with_context(|| format!("read {}", input.display()))?;
    let doc: serde_json::Value =
        serde_json::from_str(&text).with_context(|| format!("parse JSON in {}", input.display()))?;
    if !jaal::envelope::is_wrapped(&doc) {
        bail!(
            "{} is not a wrapped recording (description is not {:?})",
            input.display(),
            jaal::envelope::WRAPPED_DESCRIPTION
        );
    }

    let envelope = jaal::Envelope::from_value(&doc)?;
    let trace = jaal::DecodeTrace::run(envelope)
        .with_context(|| format!("decode {}", input.display()))?;
    print!("{}", trace);

    for w in windows {
        println!("characters {}..{}:\n{}", w.start, w.end, trace.window(w.clone()));
    }

    let out = out.unwrap_or_else(|| decoded_path(input));
    fs::write(&out, &trace.text).with_context(|| format!("write {}", out.display()))?;
    println!("Wrote {}", out.display());

    let recording = jaal::Recording::from_value(trace.parse()?);
    match recording.metadata() {
        Some(metadata) => println!("metadata: {}", explain::format::to_json_indented(metadata)?),
        None => println!("metadata: (none)"),
    }
    Ok(())
}

/// "dir/Prim+Binheap1.json" -> "dir/Prim+Binheap1-decoded.json"
fn decoded_path(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "recording".to_string());
    input.with_file_name(format!("{}-decoded.json", stem))
}

/// Parse "1500..1600" into a character range.
fn parse_window(s: &str) -> std::result::Result<Range<usize>, String> {
    let (start, end) = s
        .split_once("..")
        .ok_or_else(|| format!("expected START..END, got {:?}", s))?;
    let start: usize = start.trim().parse().map_err(|e| format!("bad start {:?}: {}", start, e))?;
    let end: usize = end.trim().parse().map_err(|e| format!("bad end {:?}: {}", end, e))?;
    if end < start {
        return Err(format!("window end {} is before start {}", end, start));
    }
    Ok(start..end)
}

fn run_draw(figure_file: Option<&Path>, out: &Path) -> Result<()> {
    let spec = match figure_file {
        Some(path) => figure::FigureSpec::from_file(path)?,
        None => figure::FigureSpec::example(),
    };
    let figure = spec.validate_and_build()?;
    info!(
        vertices = figure.vertices.len(),
        edges = figure.edges.len(),
        "drawing figure"
    );

    let svg = render::render_figure_svg(&figure)?;
    fs::write(out, svg).with_context(|| format!("write {}", out.display()))?;
    println!("Wrote {}", out.display());
    Ok(())
}
