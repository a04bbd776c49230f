use clap::Parser;
use eyre::Context;

use rc_cal::SceneLayout;

/// Write pinhole intrinsic matrices for every image of a scene.
#[derive(Debug, Parser)]
#[command(name = "hwfovs2intrinsics", version)]
struct Opt {
    /// Scene directory name below `input/` and `output/`
    #[arg(
        long = "scene_name",
        alias = "scene-name",
        env = "RC_CAL_SCENE",
        default_value = "nest"
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
    let written = rc_cal::run_intrinsics(&layout)
        .with_context(|| format!("while converting scene \"{}\"", opt.scene_name))?;
    tracing::info!(
        "Scene \"{}\": {} files in {}",
        opt.scene_name,
        written.len(),
        layout.intrinsics_dir().display()
    );
    Ok(())
}
