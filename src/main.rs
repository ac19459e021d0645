use std::path::{Path, PathBuf};

use clap::Parser;
use nomor_rename::{
    check_deps, emit_report, enumerate_pdfs, install_help_for, load_config, report::UnitFailure, CropBox,
    InputDocument, JsonLinesObserver, LopdfCopier, PdftoppmRasterizer, Pipeline, PipelineOptions, RenameConfig,
    TesseractEngine, Workspace,
};
use nomor_rename::config::DEFAULT_CONFIG_FILE;
use nomor_rename::report::FailureStage;

/// Rename scanned PDFs by the "Nomor" reference printed on their first page.
#[derive(Parser, Debug)]
#[command(name = "nomor-rename")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// PDF files or glob patterns (default: config `inputs`)
    inputs: Vec<String>,

    /// Path to YAML config (default: ./nomor-rename.yaml when present)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Directory receiving the archive and report
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Keep working directories under this root instead of a temp dir
    #[arg(long)]
    workspace: Option<PathBuf>,

    /// Split every document into 2-page chunks (plus trailing billing page)
    #[arg(long)]
    split: bool,

    /// Rasterization DPI for the first page
    #[arg(long)]
    dpi: Option<u32>,

    /// Tesseract language(s) for the reference OCR, e.g. `eng` or `eng+ind`
    #[arg(long)]
    lang: Option<String>,

    /// Tesseract page segmentation mode
    #[arg(long)]
    psm: Option<u8>,

    /// OCR the full-width top 35% instead of the default header box
    #[arg(long)]
    top_band: bool,

    /// Write normalized OCR text per unit into <output>/ocr/
    #[arg(long)]
    dump_ocr: bool,

    /// Only print warnings and errors
    #[arg(short, long)]
    quiet: bool,
}

fn main() {
    let cli = Cli::parse();

    // 1) Config
    let mut cfg = match resolve_config(cli.config.as_deref()) {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("{}", serde_json::json!({ "event": "config", "level": "error", "error": e.to_string() }));
            std::process::exit(3);
        }
    };
    apply_overrides(&mut cfg, &cli);
    if let Err(e) = cfg.validate() {
        eprintln!("{}", serde_json::json!({ "event": "config", "level": "error", "error": e.to_string() }));
        std::process::exit(3);
    }

    // 2) External tools
    let deps = check_deps();
    if !deps.ok {
        eprintln!(
            "{}",
            serde_json::json!({ "event": "check_deps", "level": "error", "missing": deps.missing, "error_code": 2 })
        );
        let help = install_help_for(&deps.missing);
        if !help.is_empty() {
            eprintln!("{}", help);
        }
        std::process::exit(2);
    }

    // 3) Inputs
    let files = match enumerate_pdfs(&cfg.inputs) {
        Ok(files) => files,
        Err(nomor_rename::EnumerateError::NoFilesFound { guidance }) => {
            eprintln!(
                "{}",
                serde_json::json!({ "event": "enumerate_pdfs", "level": "error", "inputs": cfg.inputs, "error": "NoFilesFound" })
            );
            eprintln!("{}", guidance);
            std::process::exit(4);
        }
    };

    let observer = JsonLinesObserver::new(cli.quiet);
    let mut inputs = Vec::with_capacity(files.len());
    let mut read_failures = Vec::new();
    for file in &files {
        match InputDocument::from_path(file) {
            Ok(doc) => inputs.push(doc),
            Err(e) => read_failures.push(UnitFailure {
                source: file.display().to_string(),
                stage: FailureStage::Upload,
                message: e.to_string(),
            }),
        }
    }
    for f in &read_failures {
        eprintln!(
            "{}",
            serde_json::json!({ "event": "unit_failed", "level": "error", "unit": f.source, "stage": "upload", "message": f.message })
        );
    }

    // 4) Run
    let workspace = match Workspace::create(cfg.workspace_dir.as_deref()) {
        Ok(ws) => ws,
        Err(e) => {
            eprintln!("{}", serde_json::json!({ "event": "workspace", "level": "error", "error": e.to_string() }));
            std::process::exit(5);
        }
    };
    let rasterizer = PdftoppmRasterizer::default();
    let ocr = TesseractEngine::new(cfg.ocr_psm);
    let copier = LopdfCopier;
    let pipeline = Pipeline {
        options: PipelineOptions::from(&cfg),
        rasterizer: &rasterizer,
        ocr: &ocr,
        copier: &copier,
        observer: &observer,
    };

    let mut outcome = match pipeline.run(&inputs, &workspace) {
        Ok(outcome) => outcome,
        Err(e) => {
            eprintln!("{}", serde_json::json!({ "event": "pipeline", "level": "error", "error": e.to_string() }));
            std::process::exit(5);
        }
    };
    outcome.failures.extend(read_failures);

    let report_path = cfg.report_path();
    if let Err(e) = emit_report(&outcome, &report_path) {
        eprintln!(
            "{}",
            serde_json::json!({ "event": "report", "level": "warn", "file": report_path, "error": e.to_string() })
        );
    }

    for r in &outcome.results {
        println!("{} -> {}", r.source, r.output);
    }
    for f in &outcome.failures {
        println!("FAILED {} ({}): {}", f.source, f.stage.as_str(), f.message);
    }
    println!(
        "{} file(s) renamed, {} without reference number, {} failed. Archive: {}",
        outcome.resolved(),
        outcome.unresolved(),
        outcome.failures.len(),
        outcome.archive.display()
    );
}

fn resolve_config(explicit: Option<&Path>) -> Result<RenameConfig, nomor_rename::ConfigError> {
    match explicit {
        Some(path) => load_config(path),
        None => {
            let default = Path::new(DEFAULT_CONFIG_FILE);
            if default.is_file() {
                load_config(default)
            } else {
                Ok(RenameConfig::default())
            }
        }
    }
}

fn apply_overrides(cfg: &mut RenameConfig, cli: &Cli) {
    if !cli.inputs.is_empty() {
        cfg.inputs = cli.inputs.clone();
    }
    if let Some(out) = &cli.output {
        cfg.output_dir = out.clone();
    }
    if let Some(ws) = &cli.workspace {
        cfg.workspace_dir = Some(ws.clone());
    }
    if cli.split {
        cfg.split = true;
    }
    if let Some(dpi) = cli.dpi {
        cfg.dpi = dpi;
    }
    if let Some(lang) = &cli.lang {
        cfg.ocr_lang = lang.clone();
    }
    if cli.psm.is_some() {
        cfg.ocr_psm = cli.psm;
    }
    if cli.top_band {
        cfg.crop = nomor_rename::config::CropSetting::Box(CropBox::top_band());
    }
    if cli.dump_ocr {
        cfg.dump_ocr = true;
    }
}
