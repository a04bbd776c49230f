use clap::Parser;
use eyre::{Context, bail};

use rc_cal::xmp::{CalibrationRecord, save_xmp};

/// Write a single RealityCapture XMP sidecar.
#[derive(Debug, Parser)]
#[command(name = "write-rc-xmp", version)]
struct Opt {
    /// 35mm-equivalent focal length in millimeters
    #[arg(long)]
    focal_length: f64,

    /// Camera-to-world rotation, nine space separated values, column-major
    #[arg(long, allow_hyphen_values = true)]
    rotation: Option<String>,

    /// Camera position, three space separated values
    #[arg(long, allow_hyphen_values = true)]
    position: String,

    /// Output XMP file
    #[arg(long)]
    output: std::path::PathBuf,
}

fn check_values(name: &str, value: &str, expected: usize) -> eyre::Result<String> {
    let values: Vec<&str> = value.split_whitespace().collect();
    if values.len() != expected {
        bail!("{name} needs {expected} values, found {}", values.len());
    }
    for v in &values {
        v.parse::<f64>()
            .with_context(|| format!("{name} value \"{v}\" is not a number"))?;
    }
    Ok(values.join(" "))
}

fn main() -> eyre::Result<()> {
    let _guard = rc_cal_cli::logging::init()?;
    let opt = Opt::parse();

    let record = CalibrationRecord {
        focal_length_35mm: opt.focal_length,
        rotation: opt
            .rotation
            .as_deref()
            .map(|r| check_values("rotation", r, 9))
            .transpose()?,
        position: check_values("position", &opt.position, 3)?,
    };
    save_xmp(&opt.output, &record)
        .with_context(|| format!("while writing {}", opt.output.display()))?;
    tracing::info!("Wrote {}", opt.output.display());
    Ok(())
}
