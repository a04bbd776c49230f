use clap::Parser;
use eyre::Context;

use rc_cal::SceneLayout;

/// Write RealityCapture XMP sidecars for every image of a scene.
#[derive(Debug, Parser)]
#[command(name = "params2rc", version)]
struct Opt {
    /// Scene directory name below `input/` and `output/`
    #[arg(
        long = "scene_name",
        alias = "scene-name",
        env = "RC_CAL_SCENE",
        default_value = "sndd_part"
    )]
    scene_name: String,

    /// Also write the log to this file
    #[arg(long)]
    log_file: Option<std::path::PathBuf>,
}

fn main() -> eyre::Result<()> {
    let opt = Opt::parse();
    let _guard = rc_cal_cli::logging::initiate_logging(opt.log_file.as_ref())?;

    let layout = SceneLayout::new(&opt.scene_name);
    let written = rc_cal::run_rc(&layout)
        .with_context(|| format!("while converting scene \"{}\"", opt.scene_name))?;
    tracing::info!(
        "Scene \"{}\": {} files in {}",
        opt.scene_name,
        written.len(),
        layout.rc_dir().display()
    );
    Ok(())
}
