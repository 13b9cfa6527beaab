use anyhow::Result;
use clap::Parser;
use ivory_renderer::{FileSink, RenderSession};
use rand::rngs::StdRng;
use rand::SeedableRng;

mod cli;

use cli::Args;

fn main() -> Result<()> {
    let args = Args::parse();

    env_logger::Builder::from_default_env()
        .filter_level(args.log_level.clone().into())
        .init();

    log::info!("Starting Ivory");

    let settings = args.settings()?;

    let mut scene_rng = match args.scene_seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let start = std::time::Instant::now();
    let world = args.scene.build(&mut scene_rng);
    log::info!("Scene built in {:.2?}", start.elapsed());

    let session = RenderSession::new();
    let report = session.run(&settings, &world, &FileSink)?;

    if !report.all_written() {
        log::warn!("Render completed but not every image could be saved");
    }

    Ok(())
}
