use std::time::Duration;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::flock::Flock;
use crate::options::{ParameterSet, WorldBounds};

/// At most this many frames are run by a single [`Simulation::advance`];
/// any backlog beyond that is dropped instead of caught up.
pub const MAX_STEPS_PER_ADVANCE: u32 = 5;

/// How wall-clock time maps onto simulation frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeStep {
    /// One frame per `Duration` of elapsed time.
    Fixed(Duration),
    /// One frame per call, however long it has been.
    Variable,
}

impl TimeStep {
    pub fn from_fps(fps: u32) -> Self {
        TimeStep::Fixed(Duration::from_secs(1) / fps.max(1))
    }
}

impl Default for TimeStep {
    fn default() -> Self {
        TimeStep::from_fps(60)
    }
}

/// Discrete requests coming from the UI layer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ControlEvent {
    /// Add a boid at the given spot, or anywhere if `None`.
    AddAgent(Option<Vec2>),
    /// Remove the most recently added boid.
    RemoveAgent,
    Clear,
    ResetParameters,
    ToggleDetail,
    TogglePause,
}

/// Start-up settings of a [`Simulation`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub initial_boids: usize,
    pub world: WorldBounds,
    pub parameters: ParameterSet,
    pub show_detail: bool,
    /// Frames per second of the fixed time step, 0 for one frame per call.
    pub fps: u32,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        SimulationConfig {
            initial_boids: 0,
            world: WorldBounds::default(),
            parameters: ParameterSet::default(),
            show_detail: true,
            fps: 60,
        }
    }
}

impl SimulationConfig {
    pub fn time_step(&self) -> TimeStep {
        match self.fps {
            0 => TimeStep::Variable,
            fps => TimeStep::from_fps(fps),
        }
    }
}

/// Owned copy of what a renderer needs from one boid.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AgentView {
    pub id: usize,
    pub position: [f32; 2],
    pub velocity: [f32; 2],
    pub neighbours: Vec<usize>,
}

/// Read-only picture of the flock between two steps; can be sent to another
/// thread for drawing.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FlockSnapshot {
    pub frame: u64,
    pub agents: Vec<AgentView>,
}

/// Drives a [`Flock`]: owns it together with the current parameters and
/// world, turns elapsed time into steps and carries out control events.
pub struct Simulation {
    flock: Flock,
    params: ParameterSet,
    world: WorldBounds,
    time_step: TimeStep,
    accumulator: Duration,
    frame: u64,
    show_detail: bool,
    paused: bool,
}

impl Simulation {
    pub fn new(config: SimulationConfig) -> Result<Self> {
        Self::build(config, Flock::new())
    }

    /// Like [`Simulation::new`], with reproducible random spawns.
    pub fn with_seed(config: SimulationConfig, seed: u64) -> Result<Self> {
        Self::build(config, Flock::with_seed(seed))
    }

    fn build(config: SimulationConfig, mut flock: Flock) -> Result<Self> {
        config.parameters.validate()?;
        config.world.validate()?;

        flock.populate(config.initial_boids, &config.parameters, &config.world)?;
        log::info!(
            "simulation started with {} boids in a {}x{} world",
            flock.len(),
            config.world.width,
            config.world.height
        );

        Ok(Simulation {
            flock,
            params: config.parameters,
            world: config.world,
            time_step: config.time_step(),
            accumulator: Duration::ZERO,
            frame: 0,
            show_detail: config.show_detail,
            paused: false,
        })
    }

    /// Runs as many frames as `elapsed` accounts for and returns how many ran.
    pub fn advance(&mut self, elapsed: Duration) -> u32 {
        if self.paused {
            return 0;
        }

        let steps = match self.time_step {
            TimeStep::Variable => 1,
            TimeStep::Fixed(dt) => {
                self.accumulator += elapsed;
                let mut queued = 0;
                while self.accumulator >= dt && queued < MAX_STEPS_PER_ADVANCE {
                    self.accumulator -= dt;
                    queued += 1;
                }
                if queued == MAX_STEPS_PER_ADVANCE && self.accumulator >= dt {
                    log::debug!("dropping {:?} of simulation backlog", self.accumulator);
                    self.accumulator = Duration::ZERO;
                }
                queued
            }
        };

        for _ in 0..steps {
            self.step();
        }

        steps
    }

    /// Runs exactly one frame, paused or not.
    pub fn step(&mut self) {
        self.flock.step(&self.params, &self.world);
        self.frame += 1;
    }

    pub fn apply(&mut self, event: ControlEvent) -> Result<()> {
        log::debug!("control event {:?}", event);

        match event {
            ControlEvent::AddAgent(Some(position)) => {
                self.flock.spawn(position, &self.params)?;
            }
            ControlEvent::AddAgent(None) => {
                self.flock.spawn_random(&self.params, &self.world)?;
            }
            ControlEvent::RemoveAgent => {
                self.flock.remove_last();
            }
            ControlEvent::Clear => self.flock.clear(),
            ControlEvent::ResetParameters => self.reset_parameters(),
            ControlEvent::ToggleDetail => self.show_detail = !self.show_detail,
            ControlEvent::TogglePause => self.paused = !self.paused,
        }

        Ok(())
    }

    /// Replaces the parameter snapshot used from the next step on. Boids that
    /// already exist keep their velocities.
    pub fn set_parameters(&mut self, params: ParameterSet) -> Result<()> {
        if let Err(e) = params.validate() {
            log::warn!("rejected parameters: {}", e);
            return Err(e);
        }
        self.params = params;
        Ok(())
    }

    pub fn reset_parameters(&mut self) {
        log::debug!("parameters reset to defaults");
        self.params.reset();
    }

    pub fn set_world(&mut self, world: WorldBounds) -> Result<()> {
        world.validate()?;
        self.world = world;
        Ok(())
    }

    pub fn set_time_step(&mut self, time_step: TimeStep) {
        self.time_step = time_step;
        self.accumulator = Duration::ZERO;
    }

    pub fn set_paused(&mut self, paused: bool) {
        self.paused = paused;
    }

    pub fn snapshot(&self) -> FlockSnapshot {
        FlockSnapshot {
            frame: self.frame,
            agents: self
                .flock
                .boids()
                .iter()
                .map(|b| AgentView {
                    id: b.id,
                    position: b.position.into(),
                    velocity: b.velocity.into(),
                    neighbours: b.last_neighbours().to_vec(),
                })
                .collect(),
        }
    }

    pub fn flock(&self) -> &Flock {
        &self.flock
    }

    pub fn parameters(&self) -> &ParameterSet {
        &self.params
    }

    pub fn world(&self) -> &WorldBounds {
        &self.world
    }

    pub fn time_step(&self) -> TimeStep {
        self.time_step
    }

    /// Frames run so far.
    pub fn frame(&self) -> u64 {
        self.frame
    }

    pub fn show_detail(&self) -> bool {
        self.show_detail
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }
}
