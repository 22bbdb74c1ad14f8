use glam::f32::Vec2;

use crate::{
    flock::neighbours::Neighbour,
    math_helpers::SteerMath,
    options::{ParameterSet, WorldBounds, EDGE_MARGIN},
};

/// Cap on every steering sub-force, applied before its weight.
pub const MAX_STEERING: f32 = 0.2;

/// Keeps separation finite for boids sitting on top of each other.
const SEPARATION_EPSILON: f32 = 1e-5;

#[derive(Debug, Clone, PartialEq)]
pub struct Boid {
    // sequential id handed out by the owning flock
    pub id: usize,
    pub position: Vec2,
    pub velocity: Vec2,
    acceleration: Vec2,
    last_neighbours: Vec<usize>,
}

/// The three steering rules, each already clamped to [`MAX_STEERING`] but not
/// yet weighted.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SteeringComponents {
    pub separation: Vec2,
    pub alignment: Vec2,
    pub cohesion: Vec2,
}

impl SteeringComponents {
    pub fn weighted(&self, params: &ParameterSet) -> Vec2 {
        self.separation * params.separation_weight
            + self.alignment * params.alignment_weight
            + self.cohesion * params.cohesion_weight
    }
}

impl Boid {
    /// Creates a new [`Boid`].
    pub fn new(x: f32, y: f32, velocity: Vec2, id: usize) -> Self {
        Boid {
            id,
            position: Vec2::new(x, y),
            velocity,
            acceleration: Vec2::ZERO,
            last_neighbours: Vec::new(),
        }
    }

    /// Ids of the boids perceived during the last step.
    ///
    /// Only there for drawing; the rules never read it.
    pub fn last_neighbours(&self) -> &[usize] {
        &self.last_neighbours
    }

    pub(crate) fn set_last_neighbours(&mut self, ids: Vec<usize>) {
        self.last_neighbours = ids;
    }

    /// Force accumulated through [`Boid::apply_force`] and not yet integrated.
    pub fn acceleration(&self) -> Vec2 {
        self.acceleration
    }

    /// Total steering force for this boid given a snapshot of its neighbours.
    pub fn compute_steering(&self, neighbours: &[Neighbour], params: &ParameterSet) -> Vec2 {
        self.steering_components(neighbours, params).weighted(params)
    }

    pub fn steering_components(
        &self,
        neighbours: &[Neighbour],
        params: &ParameterSet,
    ) -> SteeringComponents {
        SteeringComponents {
            separation: self.separation(neighbours, params),
            alignment: self.alignment(neighbours, params),
            cohesion: self.cohesion(neighbours, params),
        }
    }

    pub fn separation(&self, neighbours: &[Neighbour], params: &ParameterSet) -> Vec2 {
        let mut sum = Vec2::ZERO;
        let mut count = 0;

        for n in neighbours {
            if n.distance < params.separation_radius {
                // nearer boids push harder
                sum += (self.position - n.boid.position)
                    / (n.distance * n.distance + SEPARATION_EPSILON);
                count += 1;
            }
        }

        if count > 0 {
            self.steer(sum / count as f32, params)
        } else {
            Vec2::ZERO
        }
    }

    pub fn alignment(&self, neighbours: &[Neighbour], params: &ParameterSet) -> Vec2 {
        let mut sum = Vec2::ZERO;
        let mut count = 0;

        for n in neighbours {
            if n.distance < params.perception_radius {
                sum += n.boid.velocity;
                count += 1;
            }
        }

        if count > 0 {
            self.steer(sum / count as f32, params)
        } else {
            Vec2::ZERO
        }
    }

    pub fn cohesion(&self, neighbours: &[Neighbour], params: &ParameterSet) -> Vec2 {
        let mut center = Vec2::ZERO;
        let mut count = 0;

        for n in neighbours {
            if n.distance < params.perception_radius {
                center += n.boid.position;
                count += 1;
            }
        }

        if count > 0 {
            center /= count as f32;
            self.steer(center - self.position, params)
        } else {
            Vec2::ZERO
        }
    }

    /// Reynolds' steering: desired velocity at full speed along `desired`,
    /// minus the current velocity, capped at [`MAX_STEERING`].
    fn steer(&self, desired: Vec2, params: &ParameterSet) -> Vec2 {
        (desired.safe_normalize() * params.max_speed - self.velocity).limit(MAX_STEERING)
    }

    pub fn apply_force(&mut self, force: Vec2) {
        self.acceleration += force;
    }

    /// Advances the boid by one frame.
    ///
    /// Velocity is a per-frame displacement, so the position moves by exactly
    /// one (clamped) velocity vector. The edge nudge is added before the speed
    /// clamp so `|velocity| <= max_speed` holds once this returns.
    pub fn integrate(&mut self, force: Vec2, params: &ParameterSet, world: &WorldBounds) {
        self.apply_force(force);
        self.velocity += self.acceleration;

        self.handle_boundaries(params, world);

        self.velocity = self.velocity.limit(params.max_speed);
        self.position += self.velocity;

        self.acceleration = Vec2::ZERO;
    }

    /// Pushes the velocity away from any edge the boid is within
    /// [`EDGE_MARGIN`] of. No clamping and no wrap-around: a boid can stay
    /// outside the band for a few frames before it turns.
    pub fn handle_boundaries(&mut self, params: &ParameterSet, world: &WorldBounds) {
        let turn = params.edge_force;

        if self.position.x < EDGE_MARGIN {
            self.velocity.x += turn;
        }
        if self.position.x > world.width - EDGE_MARGIN {
            self.velocity.x -= turn;
        }
        if self.position.y < EDGE_MARGIN {
            self.velocity.y += turn;
        }
        if self.position.y > world.height - EDGE_MARGIN {
            self.velocity.y -= turn;
        }
    }
}
