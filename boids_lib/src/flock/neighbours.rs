use crate::boid::Boid;

/// A boid seen by another boid during a step, together with how far away it
/// is.
#[derive(Debug, Clone, Copy)]
pub struct Neighbour<'a> {
    pub boid: &'a Boid,
    pub distance: f32,
}

/// Naive O(N^2) neighbour search: every boid in `all_boids` other than `boid`
/// that lies strictly within `radius` is pushed onto `neighbours`, in flock
/// order. `neighbours` is not cleared first.
///
/// The same pass serves separation, whose radius is only ever compared
/// against the recorded distances, so separation never reaches beyond
/// `radius`.
pub fn scan_naive<'a>(
    boid: &Boid,
    all_boids: &'a [Boid],
    radius: f32,
    neighbours: &mut Vec<Neighbour<'a>>,
) {
    for b_other in all_boids.iter() {
        if b_other.id == boid.id {
            continue;
        }

        let distance = boid.position.distance(b_other.position);
        if distance < radius {
            neighbours.push(Neighbour {
                boid: b_other,
                distance,
            });
        }
    }
}
