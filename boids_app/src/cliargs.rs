use std::{fs, io::ErrorKind, path::Path};

use boids_lib::{
    options::{ParameterSet, WorldBounds},
    simulation::SimulationConfig,
    BoidsError,
};
use clap_serde_derive::{
    clap::{self, Parser},
    serde::Serialize,
    ClapSerde,
};

#[derive(Parser)]
#[command(version, about, long_about = None)]
/// Interactive boids flocking simulation with live parameter sliders.
pub struct Args {
    /// Config file
    #[arg(short, long = "config", default_value = "config.toml")]
    pub config_path: std::path::PathBuf,

    /// Rest of arguments
    #[command(flatten)]
    pub config: <Config as ClapSerde>::Opt,
}

#[derive(ClapSerde, Serialize)]
/// Programatic configuration
///
/// Uses defaults, which can be overwritten by a TOML file given with `-c` /
/// `--config`; flags on the command line win over both.
pub struct Config {
    #[default(0)]
    #[arg(short = 'n', long)]
    /// number of boids at start
    pub no_boids: usize,

    #[default(1200)]
    #[arg(short = 'x', long)]
    pub init_width: u32,

    #[default(800)]
    #[arg(short = 'y', long)]
    pub init_height: u32,

    #[default(60)]
    #[arg(long)]
    /// simulation frames per second, 0 steps once per rendered frame
    pub fps: u32,

    #[default(true)]
    #[arg(long)]
    /// draw perception ranges and neighbour links
    pub detail: bool,

    #[default(0)]
    #[arg(long)]
    /// seed for spawn positions and headings, 0 picks one at random
    pub seed: u64,
}

impl Config {
    pub fn simulation_config(&self) -> Result<SimulationConfig, BoidsError> {
        Ok(SimulationConfig {
            initial_boids: self.no_boids,
            world: WorldBounds::new(self.init_width as f32, self.init_height as f32)?,
            parameters: ParameterSet::default(),
            show_detail: self.detail,
            fps: self.fps,
        })
    }
}

/// Parses the command line, merging it over the config file when there is one.
pub fn load() -> Result<Config, BoidsError> {
    let mut args = Args::parse();
    merge_file(&args.config_path, &mut args.config)
}

fn merge_file(path: &Path, cli: &mut <Config as ClapSerde>::Opt) -> Result<Config, BoidsError> {
    match fs::read_to_string(path) {
        Ok(text) => {
            let from_file = toml::from_str::<<Config as ClapSerde>::Opt>(&text).map_err(|e| {
                BoidsError::Config(format!("{}: {}", path.display(), e))
            })?;
            log::info!("using configuration from {}", path.display());
            Ok(Config::from(from_file).merge(cli))
        }
        // no config file, only what was parsed from the command line
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(Config::from(cli)),
        Err(e) => Err(BoidsError::Config(format!("{}: {}", path.display(), e))),
    }
}
