use simulation::{Simulation, SimulationConfig};

pub mod boid;
pub mod flock;

pub mod error;
pub mod math_helpers;
pub mod options;
pub mod simulation;

pub use error::{BoidsError, Result};

/// Runs a seeded, headless simulation for `no_iter` frames and hands back the
/// driver for inspection.
pub fn flock_base(no_iter: u64, config: SimulationConfig, seed: u64) -> Result<Simulation> {
    let mut sim = Simulation::with_seed(config, seed)?;

    (0..no_iter).for_each(|_| sim.step());

    Ok(sim)
}

