use std::f32::consts::TAU;

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256PlusPlus;

use crate::boid::Boid;
use crate::error::{BoidsError, Result};
use crate::math_helpers::{heading, SteerMath};
use crate::options::{ParameterSet, WorldBounds, EDGE_MARGIN};

pub mod neighbours;

use neighbours::{scan_naive, Neighbour};

/// Owns every boid of the simulation and advances them frame by frame.
///
/// Neighbours are found with a naive O(N^2) scan, which is plenty for a few
/// hundred boids.
pub struct Flock {
    boids: Vec<Boid>,
    next_id: usize,
    rng: Xoshiro256PlusPlus,
}

impl Default for Flock {
    fn default() -> Self {
        Self::new()
    }
}

impl Flock {
    /// An empty flock with headings drawn from OS entropy.
    pub fn new() -> Self {
        Self::with_rng(Xoshiro256PlusPlus::from_entropy())
    }

    /// An empty flock whose random headings and positions are reproducible.
    pub fn with_seed(seed: u64) -> Self {
        Self::with_rng(Xoshiro256PlusPlus::seed_from_u64(seed))
    }

    fn with_rng(rng: Xoshiro256PlusPlus) -> Self {
        Flock {
            boids: Vec::new(),
            next_id: 0,
            rng,
        }
    }

    /// Advances every boid by one frame.
    ///
    /// All steering forces are computed against the state at the start of the
    /// frame and only then applied, so the outcome does not depend on the
    /// order the boids are stored in.
    pub fn step(&mut self, params: &ParameterSet, world: &WorldBounds) {
        debug_assert!(params.validate().is_ok(), "invalid parameters {:?}", params);

        let mut accelerations: Vec<Vec2> = Vec::with_capacity(self.boids.len());
        let mut perceived: Vec<Vec<usize>> = Vec::with_capacity(self.boids.len());
        let mut neighbours: Vec<Neighbour> = Vec::new();

        // calculation loop
        for b_current in self.boids.iter() {
            neighbours.clear();
            scan_naive(
                b_current,
                &self.boids,
                params.perception_radius,
                &mut neighbours,
            );

            accelerations.push(b_current.compute_steering(&neighbours, params));
            perceived.push(neighbours.iter().map(|n| n.boid.id).collect());
        }

        // update loop
        for ((boid, force), ids) in self
            .boids
            .iter_mut()
            .zip(accelerations)
            .zip(perceived)
        {
            boid.set_last_neighbours(ids);
            boid.integrate(force, params, world);
        }

        log::trace!("stepped {} boids", self.boids.len());
    }

    /// Adds one boid at `position` heading in a random direction at
    /// `max_speed`. Later changes to `max_speed` do not touch its speed until
    /// the next clamp.
    pub fn spawn(&mut self, position: Vec2, params: &ParameterSet) -> Result<usize> {
        if !position.all_finite() {
            log::warn!("refusing to spawn a boid at {:?}", position);
            return Err(BoidsError::NonFinitePosition {
                x: position.x,
                y: position.y,
            });
        }

        let angle = self.rng.gen_range(0.0..TAU);
        let velocity = heading(angle) * params.max_speed;

        Ok(self.push(Boid::new(position.x, position.y, velocity, 0)))
    }

    /// Adds one boid somewhere inside the world, keeping clear of the edge
    /// margin where there is room for it.
    pub fn spawn_random(&mut self, params: &ParameterSet, world: &WorldBounds) -> Result<usize> {
        let x = self.random_coordinate(world.width);
        let y = self.random_coordinate(world.height);

        self.spawn(Vec2::new(x, y), params)
    }

    /// Spawns `count` boids at random positions, returning their ids.
    pub fn populate(
        &mut self,
        count: usize,
        params: &ParameterSet,
        world: &WorldBounds,
    ) -> Result<Vec<usize>> {
        (0..count)
            .map(|_| self.spawn_random(params, world))
            .collect()
    }

    fn random_coordinate(&mut self, extent: f32) -> f32 {
        let (low, high) = (EDGE_MARGIN, extent - EDGE_MARGIN);
        if low < high {
            self.rng.gen_range(low..high)
        } else {
            extent / 2.
        }
    }

    /// Inserts a fully specified boid. The flock hands out the id, whatever
    /// `boid.id` was before.
    pub fn insert_boid(&mut self, boid: Boid) -> Result<usize> {
        if !boid.position.all_finite() {
            return Err(BoidsError::NonFinitePosition {
                x: boid.position.x,
                y: boid.position.y,
            });
        }
        if !boid.velocity.all_finite() {
            return Err(BoidsError::NonFiniteVelocity {
                x: boid.velocity.x,
                y: boid.velocity.y,
            });
        }

        Ok(self.push(boid))
    }

    fn push(&mut self, mut boid: Boid) -> usize {
        let id = self.next_id;
        self.next_id += 1;

        boid.id = id;
        log::debug!("spawned boid {} at {:?}", id, boid.position);
        self.boids.push(boid);

        id
    }

    /// Removes the most recently added boid.
    pub fn remove_last(&mut self) -> Option<Boid> {
        let removed = self.boids.pop();
        if let Some(b) = &removed {
            log::debug!("removed boid {}", b.id);
        }
        removed
    }

    /// Removes the boid with the given id, keeping the order of the rest.
    pub fn remove(&mut self, id: usize) -> Option<Boid> {
        let index = self.boids.iter().position(|b| b.id == id)?;
        log::debug!("removed boid {}", id);
        Some(self.boids.remove(index))
    }

    /// Removes every boid. Ids start again from 0.
    pub fn clear(&mut self) {
        log::debug!("clearing {} boids", self.boids.len());
        self.boids.clear();
        self.next_id = 0;
    }

    pub fn boids(&self) -> &[Boid] {
        &self.boids
    }

    pub fn get(&self, id: usize) -> Option<&Boid> {
        self.boids.iter().find(|b| b.id == id)
    }

    pub fn len(&self) -> usize {
        self.boids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.boids.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use glam::Vec2;

    use super::Flock;
    use crate::{
        boid::Boid,
        error::BoidsError,
        options::{ParameterSet, WorldBounds},
    };

    macro_rules! assert_eqf32 {
        ($x:expr, $y:expr) => {
            assert_relative_eq!($x, $y, epsilon = 1e-3_f32)
        };
    }

    /// A tight cluster in the middle of the default world, moving in
    /// different directions.
    fn cluster() -> Vec<Boid> {
        vec![
            Boid::new(600., 400., Vec2::new(1., 0.), 0),
            Boid::new(610., 405., Vec2::new(0., 2.), 0),
            Boid::new(595., 390., Vec2::new(-1.5, 1.), 0),
            Boid::new(620., 380., Vec2::new(3., -1.), 0),
            Boid::new(600., 400., Vec2::new(0., -3.), 0),
            Boid::new(700., 500., Vec2::new(1., 1.), 0),
        ]
    }

    fn flock_of(boids: Vec<Boid>) -> Flock {
        let mut flock = Flock::with_seed(7);
        for b in boids {
            flock.insert_boid(b).unwrap();
        }
        flock
    }

    #[test]
    fn step_is_order_independent() {
        let params = ParameterSet::default();
        let world = WorldBounds::default();

        let forward = cluster();
        let mut backward = cluster();
        backward.reverse();

        let mut f1 = flock_of(forward);
        let mut f2 = flock_of(backward);
        for _ in 0..3 {
            f1.step(&params, &world);
            f2.step(&params, &world);
        }

        // the same starting boid sits at mirrored indices in the two flocks
        let n = f1.len();
        for i in 0..n {
            let a = &f1.boids()[i];
            let b = &f2.boids()[n - 1 - i];
            assert_eqf32!(a.position.x, b.position.x);
            assert_eqf32!(a.position.y, b.position.y);
            assert_eqf32!(a.velocity.x, b.velocity.x);
            assert_eqf32!(a.velocity.y, b.velocity.y);
        }
    }

    #[test]
    fn step_reads_the_frame_start_state() {
        let params = ParameterSet::default();
        let world = WorldBounds::default();
        let mut flock = flock_of(cluster());

        let before = flock.boids().to_vec();
        let expected: Vec<Vec2> = before
            .iter()
            .map(|b| {
                let mut found = Vec::new();
                super::scan_naive(b, &before, params.perception_radius, &mut found);
                b.compute_steering(&found, &params)
            })
            .collect();

        flock.step(&params, &world);

        for ((b, old), force) in flock.boids().iter().zip(&before).zip(expected) {
            let mut manual = old.clone();
            manual.integrate(force, &params, &world);
            assert_eq!(b.position, manual.position);
            assert_eq!(b.velocity, manual.velocity);
        }
    }

    #[test]
    fn never_neighbours_itself() {
        let params = ParameterSet::default();
        let world = WorldBounds::default();
        let mut flock = flock_of(cluster());

        flock.step(&params, &world);

        for b in flock.boids() {
            assert!(!b.last_neighbours().contains(&b.id));
        }
        // boids 0 and 4 share a position and see each other
        assert!(flock.get(0).unwrap().last_neighbours().contains(&4));
        // the straggler is alone
        assert!(flock.get(5).unwrap().last_neighbours().is_empty());
    }

    #[test]
    fn lone_boid_keeps_its_heading() {
        let params = ParameterSet::default();
        let world = WorldBounds::default();
        let velocity = Vec2::new(3., 1.);
        let mut flock = flock_of(vec![Boid::new(600., 400., velocity, 0)]);

        for i in 1..=5 {
            flock.step(&params, &world);
            let b = &flock.boids()[0];
            assert_eq!(b.velocity, velocity);
            assert_eqf32!(b.position.x, 600. + 3. * i as f32);
            assert_eqf32!(b.position.y, 400. + 1. * i as f32);
        }
    }

    #[test]
    fn speed_stays_bounded_over_many_steps() {
        let mut params = ParameterSet::default();
        let world = WorldBounds::default();
        let mut flock = Flock::with_seed(42);
        flock.populate(60, &params, &world).unwrap();

        for frame in 0..200 {
            if frame == 100 {
                // slowing down mid-run clamps everyone on the next step
                params.max_speed = 1.5;
            }
            flock.step(&params, &world);
            for b in flock.boids() {
                assert!(b.velocity.length() <= params.max_speed + 1e-4);
                assert!(b.position.x.is_finite() && b.position.y.is_finite());
            }
        }
    }

    #[test]
    fn separation_wider_than_perception_is_capped_by_it() {
        let mut params = ParameterSet::default();
        params.perception_radius = 20.;
        params.separation_radius = 100.;
        let world = WorldBounds::default();
        let mut flock = flock_of(vec![
            Boid::new(600., 400., Vec2::ZERO, 0),
            Boid::new(650., 400., Vec2::ZERO, 0),
        ]);

        flock.step(&params, &world);

        // 50 apart: inside the separation radius but never perceived
        for b in flock.boids() {
            assert_eq!(b.velocity, Vec2::ZERO);
        }
    }

    #[test]
    fn spawn_captures_max_speed() {
        let mut params = ParameterSet::default();
        let mut flock = Flock::with_seed(1);

        let id = flock.spawn(Vec2::new(100., 100.), &params).unwrap();
        params.max_speed = 9.;

        let b = flock.get(id).unwrap();
        assert_eqf32!(b.velocity.length(), 4.);
        assert_eq!(b.position, Vec2::new(100., 100.));
    }

    #[test]
    fn spawn_rejects_non_finite_positions() {
        let params = ParameterSet::default();
        let mut flock = Flock::with_seed(1);

        let res = flock.spawn(Vec2::new(f32::NAN, 3.), &params);

        assert!(matches!(res, Err(BoidsError::NonFinitePosition { .. })));
        assert!(flock.is_empty());
    }

    #[test]
    fn insert_rejects_non_finite_velocity() {
        let mut flock = Flock::with_seed(1);

        let res = flock.insert_boid(Boid::new(1., 1., Vec2::new(0., f32::INFINITY), 0));

        assert!(matches!(res, Err(BoidsError::NonFiniteVelocity { .. })));
        assert!(flock.is_empty());
    }

    #[test]
    fn clear_then_spawn_three() {
        let params = ParameterSet::default();
        let world = WorldBounds::default();
        let mut flock = Flock::with_seed(3);
        flock.populate(10, &params, &world).unwrap();

        flock.clear();
        assert!(flock.is_empty());

        for i in 0..3 {
            let id = flock.spawn(Vec2::new(300. + i as f32, 300.), &params).unwrap();
            assert_eq!(id, i);
        }

        assert_eq!(flock.len(), 3);
        let headings: Vec<Vec2> = flock.boids().iter().map(|b| b.velocity).collect();
        for h in &headings {
            assert_eqf32!(h.length(), params.max_speed);
        }
        assert_ne!(headings[0], headings[1]);
        assert_ne!(headings[1], headings[2]);
        assert_ne!(headings[0], headings[2]);
    }

    #[test]
    fn random_spawns_keep_clear_of_the_edges() {
        let params = ParameterSet::default();
        let world = WorldBounds::default();
        let mut flock = Flock::with_seed(11);

        flock.populate(100, &params, &world).unwrap();

        for b in flock.boids() {
            assert!(b.position.x >= 50. && b.position.x < 1150.);
            assert!(b.position.y >= 50. && b.position.y < 750.);
        }
    }

    #[test]
    fn tiny_world_spawns_on_the_centre_line() {
        let params = ParameterSet::default();
        let world = WorldBounds::new(80., 800.).unwrap();
        let mut flock = Flock::with_seed(11);

        let id = flock.spawn_random(&params, &world).unwrap();

        assert_eq!(flock.get(id).unwrap().position.x, 40.);
    }

    #[test]
    fn same_seed_same_flock() {
        let params = ParameterSet::default();
        let world = WorldBounds::default();
        let mut f1 = Flock::with_seed(99);
        let mut f2 = Flock::with_seed(99);

        f1.populate(20, &params, &world).unwrap();
        f2.populate(20, &params, &world).unwrap();

        assert_eq!(f1.boids(), f2.boids());
    }

    #[test]
    fn removal() {
        let params = ParameterSet::default();
        let world = WorldBounds::default();
        let mut flock = Flock::with_seed(5);
        flock.populate(4, &params, &world).unwrap();

        assert_eq!(flock.remove_last().map(|b| b.id), Some(3));
        assert_eq!(flock.remove(1).map(|b| b.id), Some(1));
        assert!(flock.remove(1).is_none());

        let ids: Vec<usize> = flock.boids().iter().map(|b| b.id).collect();
        assert_eq!(ids, vec![0, 2]);

        // ids are not reused until the flock is cleared
        assert_eq!(flock.spawn_random(&params, &world).unwrap(), 4);

        flock.clear();
        assert!(flock.remove_last().is_none());
    }
}
