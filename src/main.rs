use std::path::PathBuf;
use std::process;

use anyhow::{Context, Result};
use clap::Parser;
use clap::error::ErrorKind;
use workplace_rca::config::Credential;
use workplace_rca::{AnalysisText, DiagramKind, NotationPolicy, Pipeline, RcaConfig, RcaError, logging};

/// Batch root-cause analysis of a single workplace photograph:
/// analysis report on stdout, mind map and WBS rendered to PNG.
#[derive(Parser, Debug)]
#[command(name = "rca", version)]
#[command(about = "Root-cause analysis of a workplace photo, rendered as PlantUML diagrams")]
struct Args {
    /// Image to analyze (png, jpeg, bmp, tiff, ...)
    image: PathBuf,

    /// Directory the PNG diagrams are written to
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Multimodal model identifier
    #[arg(short, long)]
    model: Option<String>,

    /// PlantUML rendering endpoint
    #[arg(long)]
    render_url: Option<String>,

    /// Also generate the structured-data (JSON) diagram
    #[arg(long)]
    with_json: bool,

    /// Reject model output that contains anything besides the diagram
    #[arg(long)]
    strict: bool,

    /// HTTP timeout in seconds
    #[arg(long)]
    timeout: Option<u64>,

    /// Diagnostic log level (RUST_LOG overrides)
    #[arg(long, default_value = "warn")]
    log_level: String,
}

fn main() -> Result<()> {
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => e.exit(),
        Err(e) => {
            let _ = e.print();
            process::exit(1);
        }
    };

    logging::init_logging(&args.log_level);

    let config = build_config(&args);
    let pipeline = Pipeline::new(config)?;

    let image = match pipeline.encode_image_file(&args.image) {
        Ok(image) => image,
        Err(RcaError::ImageDecode { .. }) => {
            println!("Error: Could not open or find the image: {}", args.image.display());
            process::exit(1);
        }
        Err(e) => return Err(e.into()),
    };

    let api_key_env = &pipeline.config().api_key_env;
    let key = pipeline
        .environment_credential()
        .with_context(|| format!("{} is not set", api_key_env))?;

    let analysis = pipeline.analyze(&key, &image)?;
    println!("=== Root Cause Analysis Results ===");
    println!("{}", analysis);
    println!("\n{}", "=".repeat(50));

    let mut kinds = vec![DiagramKind::MindMap, DiagramKind::Wbs];
    if args.with_json {
        kinds.push(DiagramKind::StructuredData);
    }

    let produced: Vec<(DiagramKind, PathBuf)> = kinds
        .iter()
        .filter_map(|kind| produce(&pipeline, &key, &analysis, *kind).map(|path| (*kind, path)))
        .collect();

    if produced.len() == kinds.len() {
        println!("\nComplete! You now have:");
        for (i, (kind, path)) in produced.iter().enumerate() {
            println!("{}. {}: {}", i + 1, summary_label(*kind), path.display());
        }
    }
    Ok(())
}

fn build_config(args: &Args) -> RcaConfig {
    let mut config = RcaConfig::from_env();
    if let Some(dir) = &args.output_dir {
        config.output_dir = dir.clone();
    }
    if let Some(model) = &args.model {
        config.model = model.clone();
    }
    if let Some(url) = &args.render_url {
        config.render_url = url.clone();
    }
    if args.strict {
        config.notation_policy = NotationPolicy::Strict;
    }
    config.request_timeout_secs = args.timeout.or(config.request_timeout_secs);
    config
}

/// Generate and render one diagram, printing progress. `None` on failure.
fn produce(pipeline: &Pipeline, key: &Credential, analysis: &AnalysisText, kind: DiagramKind) -> Option<PathBuf> {
    let (task, noun, saved) = progress_labels(kind);

    println!("Generating {}...", task);
    let text = match pipeline.generate_diagram_text(key, analysis, kind) {
        Ok(text) => text,
        Err(e) => {
            println!("Failed to generate {} code: {}", noun, e);
            if let Some(raw) = e.context().metadata.get("raw_text") {
                println!("\n--- Model Output ---");
                println!("{}", raw);
            }
            return None;
        }
    };

    println!("PlantUML {} code generated, creating diagram...", noun);
    match pipeline.render(&text) {
        Ok(path) => {
            println!("{} saved: {}", saved, path.display());
            Some(path)
        }
        Err(e) => {
            println!("{}", e);
            println!("{} generation failed, but code was created:", saved);
            println!("\n--- {} Code ---", noun);
            println!("{}", text.source);
            None
        }
    }
}

fn progress_labels(kind: DiagramKind) -> (&'static str, &'static str, &'static str) {
    match kind {
        DiagramKind::MindMap => ("root cause analysis mind map", "mind map", "Mind map"),
        DiagramKind::Wbs => ("improvement project breakdown (WBS)", "WBS", "WBS chart"),
        DiagramKind::StructuredData => ("structured data diagram", "JSON", "Structured data diagram"),
    }
}

fn summary_label(kind: DiagramKind) -> &'static str {
    match kind {
        DiagramKind::MindMap => "Analysis mind map",
        DiagramKind::Wbs => "Implementation breakdown",
        DiagramKind::StructuredData => "Structured data",
    }
}
