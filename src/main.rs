//! Command-line front end for the OCR service.
//!
//! ```bash
//! ocr-service --config service.yaml image1.jpg image2.png
//! ocr-service --config service.yaml --adapter vlm --annotate-dir out/ scan.png
//! ```
//!
//! Results are printed to stdout as JSON, one object per image.

use std::path::PathBuf;

use clap::Parser;
use ocr_service::core::init_tracing;
use ocr_service::prelude::*;
use tracing::{error, info};

/// Command-line arguments.
#[derive(Parser)]
#[command(name = "ocr-service")]
#[command(about = "Detect and recognize text in images")]
struct Args {
    /// Image files to process.
    #[arg(required = true)]
    images: Vec<PathBuf>,

    /// Service configuration file (YAML or JSON).
    #[arg(long)]
    config: PathBuf,

    /// Backend to use instead of the configured one.
    ///
    /// Takes precedence over the OCR_ADAPTER environment variable.
    #[arg(long)]
    adapter: Option<String>,

    /// Write an annotated PNG per image into this directory.
    #[arg(long)]
    annotate_dir: Option<PathBuf>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();
    let args = Args::parse();

    let config = ServiceConfig::from_file(&args.config)?
        .with_env_overrides()
        .with_adapter_override(args.adapter);

    let registry = AdapterRegistry::with_builtin_adapters()?;
    info!("Available OCR adapters: {}", registry.names().join(", "));
    let port = registry.resolve_configured(&config)?;

    let mut use_case = ProcessImageUseCase::new(port);
    if let Some(dir) = &args.annotate_dir {
        std::fs::create_dir_all(dir)?;
        use_case = use_case.with_annotator(ImageAnnotator::default());
    }

    let mut failures = 0usize;
    for path in &args.images {
        let output = OcrInput::from_path(path).and_then(|input| use_case.execute(&input));
        match output {
            Ok(output) => {
                if let (Some(dir), Some(png)) = (&args.annotate_dir, &output.annotated_image) {
                    let stem = path.file_stem().unwrap_or_default().to_string_lossy();
                    let target = dir.join(format!("{stem}_annotated.png"));
                    std::fs::write(&target, png)?;
                    info!("Wrote {}", target.display());
                }
                let record = serde_json::json!({
                    "image": path.display().to_string(),
                    "result": output,
                });
                println!("{}", serde_json::to_string_pretty(&record)?);
            }
            Err(e) => {
                error!("Failed to process {}: {}", path.display(), e);
                failures += 1;
            }
        }
    }

    if failures > 0 {
        return Err(format!("{failures} of {} images failed", args.images.len()).into());
    }
    Ok(())
}
