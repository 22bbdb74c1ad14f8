use std::fmt::{self, Display};

use serde::{Deserialize, Serialize};

use crate::error::{BoidsError, Result};

/// Width of the band along every world edge in which boids get pushed back.
pub const EDGE_MARGIN: f32 = 50.;

/// The tunable knobs of the flocking rules.
///
/// A `ParameterSet` is a plain value: the UI keeps the canonical copy and
/// hands a snapshot to every step, nothing in the core holds on to it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParameterSet {
    pub max_speed: f32,
    pub perception_radius: f32,
    pub separation_weight: f32,
    pub alignment_weight: f32,
    pub cohesion_weight: f32,
    pub edge_force: f32,
    /// Not required to be smaller than `perception_radius`; separation only
    /// ever looks at perceived neighbours, so anything beyond the perception
    /// radius is ignored.
    pub separation_radius: f32,
}

impl Default for ParameterSet {
    fn default() -> Self {
        ParameterSet {
            max_speed: Parameter::MaxSpeed.default_value(),
            perception_radius: Parameter::PerceptionRadius.default_value(),
            separation_weight: Parameter::SeparationWeight.default_value(),
            alignment_weight: Parameter::AlignmentWeight.default_value(),
            cohesion_weight: Parameter::CohesionWeight.default_value(),
            edge_force: Parameter::EdgeForce.default_value(),
            separation_radius: Parameter::SeparationRadius.default_value(),
        }
    }
}

impl ParameterSet {
    pub fn get(&self, parameter: Parameter) -> f32 {
        match parameter {
            Parameter::MaxSpeed => self.max_speed,
            Parameter::PerceptionRadius => self.perception_radius,
            Parameter::SeparationWeight => self.separation_weight,
            Parameter::AlignmentWeight => self.alignment_weight,
            Parameter::CohesionWeight => self.cohesion_weight,
            Parameter::EdgeForce => self.edge_force,
            Parameter::SeparationRadius => self.separation_radius,
        }
    }

    /// Mutable handle to a single value, meant for slider widgets. Whatever is
    /// written through it is unchecked until [`ParameterSet::validate`].
    pub fn value_mut(&mut self, parameter: Parameter) -> &mut f32 {
        match parameter {
            Parameter::MaxSpeed => &mut self.max_speed,
            Parameter::PerceptionRadius => &mut self.perception_radius,
            Parameter::SeparationWeight => &mut self.separation_weight,
            Parameter::AlignmentWeight => &mut self.alignment_weight,
            Parameter::CohesionWeight => &mut self.cohesion_weight,
            Parameter::EdgeForce => &mut self.edge_force,
            Parameter::SeparationRadius => &mut self.separation_radius,
        }
    }

    /// Sets a single value, rejecting anything outside of its range.
    pub fn set(&mut self, parameter: Parameter, value: f32) -> Result<()> {
        parameter.check(value)?;
        *self.value_mut(parameter) = value;
        Ok(())
    }

    /// Checks every value against its documented range.
    pub fn validate(&self) -> Result<()> {
        Parameter::ALL
            .iter()
            .try_for_each(|p| p.check(self.get(*p)))
    }

    /// Range-clamps every value. Non-finite values fall back to the default.
    pub fn clamped(mut self) -> Self {
        for p in Parameter::ALL {
            let value = self.get(p);
            *self.value_mut(p) = if value.is_finite() {
                p.range().clamp(value)
            } else {
                p.default_value()
            };
        }
        self
    }

    /// Restores the documented defaults.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParameterRange {
    pub min: f32,
    pub max: f32,
}

impl ParameterRange {
    pub const fn new(min: f32, max: f32) -> Self {
        ParameterRange { min, max }
    }

    pub fn contains(&self, value: f32) -> bool {
        self.min <= value && value <= self.max
    }

    pub fn clamp(&self, value: f32) -> f32 {
        value.clamp(self.min, self.max)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Parameter {
    MaxSpeed,
    PerceptionRadius,
    SeparationWeight,
    AlignmentWeight,
    CohesionWeight,
    EdgeForce,
    SeparationRadius,
}

impl Parameter {
    /// In the order a control panel lists them.
    pub const ALL: [Parameter; 7] = [
        Parameter::MaxSpeed,
        Parameter::PerceptionRadius,
        Parameter::SeparationWeight,
        Parameter::AlignmentWeight,
        Parameter::CohesionWeight,
        Parameter::EdgeForce,
        Parameter::SeparationRadius,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Parameter::MaxSpeed => "Max Speed",
            Parameter::PerceptionRadius => "Perception Radius",
            Parameter::SeparationWeight => "Separation Weight",
            Parameter::AlignmentWeight => "Alignment Weight",
            Parameter::CohesionWeight => "Cohesion Weight",
            Parameter::EdgeForce => "Edge Force",
            Parameter::SeparationRadius => "Separation Radius",
        }
    }

    pub fn range(&self) -> ParameterRange {
        match self {
            Parameter::MaxSpeed => ParameterRange::new(0.5, 10.),
            Parameter::PerceptionRadius => ParameterRange::new(10., 200.),
            Parameter::SeparationWeight => ParameterRange::new(0.1, 5.),
            Parameter::AlignmentWeight => ParameterRange::new(0.1, 5.),
            Parameter::CohesionWeight => ParameterRange::new(0.1, 5.),
            Parameter::EdgeForce => ParameterRange::new(0.1, 15.),
            Parameter::SeparationRadius => ParameterRange::new(10., 100.),
        }
    }

    pub fn default_value(&self) -> f32 {
        match self {
            Parameter::MaxSpeed => 4.0,
            Parameter::PerceptionRadius => 32.,
            Parameter::SeparationWeight => 3.0,
            Parameter::AlignmentWeight => 2.3,
            Parameter::CohesionWeight => 1.73,
            Parameter::EdgeForce => 7.25,
            Parameter::SeparationRadius => 30.,
        }
    }

    fn check(&self, value: f32) -> Result<()> {
        if !value.is_finite() {
            return Err(BoidsError::NonFiniteParameter { parameter: *self });
        }

        let range = self.range();
        if !range.contains(value) {
            return Err(BoidsError::ParameterOutOfRange {
                parameter: *self,
                value,
                min: range.min,
                max: range.max,
            });
        }

        Ok(())
    }
}

impl Display for Parameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Size of the simulated area. The world spans from (0, 0) to
/// (width, height); there is no wrap-around.
#[derive(Debug, PartialEq, Clone, Copy, Serialize, Deserialize)]
pub struct WorldBounds {
    pub width: f32,
    pub height: f32,
}

impl Default for WorldBounds {
    fn default() -> Self {
        WorldBounds {
            width: 1200.,
            height: 800.,
        }
    }
}

impl WorldBounds {
    pub fn new(width: f32, height: f32) -> Result<Self> {
        let world = WorldBounds { width, height };
        world.validate()?;
        Ok(world)
    }

    pub fn validate(&self) -> Result<()> {
        let valid = |v: f32| v.is_finite() && v > 0.;
        if valid(self.width) && valid(self.height) {
            Ok(())
        } else {
            Err(BoidsError::InvalidWorld {
                width: self.width,
                height: self.height,
            })
        }
    }
}
