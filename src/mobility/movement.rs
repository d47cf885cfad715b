//! Client movement, boundary handling and initial placement.

use crate::config::BoundaryMode;
use crate::random::RandomSource;
use crate::types::{Client, ClientId, Vec2};

/// Advance a position by `velocity * dt` inside the square `[0, area]²`.
///
/// Returns the new position and the (possibly reflected) velocity.
pub fn advance(position: Vec2, velocity: Vec2, dt: f64, area: f64, mode: BoundaryMode) -> (Vec2, Vec2) {
    let next = position + velocity * dt;
    let (x, vx) = bound_axis(next.x, velocity.x, area, mode);
    let (y, vy) = bound_axis(next.y, velocity.y, area, mode);
    (Vec2::new(x, y), Vec2::new(vx, vy))
}

fn bound_axis(p: f64, v: f64, area: f64, mode: BoundaryMode) -> (f64, f64) {
    match mode {
        BoundaryMode::Clamp => (p.clamp(0.0, area), v),
        BoundaryMode::Reflect => {
            if p < 0.0 {
                ((-p).min(area), v.abs())
            } else if p > area {
                ((2.0 * area - p).max(0.0), -v.abs())
            } else {
                (p, v)
            }
        }
    }
}

/// Cell-centre grid of `count` points over the square `[0, area]²`.
///
/// Uses `ceil(sqrt(count))` columns, filled row by row.
pub fn grid_layout(count: usize, area: f64) -> Vec<Vec2> {
    if count == 0 {
        return Vec::new();
    }

    let cols = (count as f64).sqrt().ceil() as usize;
    let rows = count.div_ceil(cols);
    let cell_w = area / cols as f64;
    let cell_h = area / rows as f64;

    (0..count)
        .map(|i| {
            let (row, col) = (i / cols, i % cols);
            Vec2::new((col as f64 + 0.5) * cell_w, (row as f64 + 0.5) * cell_h)
        })
        .collect()
}

/// Spawn `count` disconnected clients with uniform positions in the area and
/// uniform velocity components in `[-max_speed, max_speed]`.
///
/// Draws four uniforms per client: x, y, vx, vy.
pub fn spawn_clients<R: RandomSource + ?Sized>(
    count: usize,
    area: f64,
    max_speed: f64,
    rng: &mut R,
) -> Vec<Client> {
    (0..count)
        .map(|i| {
            let position = Vec2::new(rng.uniform(0.0, area), rng.uniform(0.0, area));
            let velocity = Vec2::new(
                rng.uniform(-max_speed, max_speed),
                rng.uniform(-max_speed, max_speed),
            );
            Client::new(ClientId(i), position, velocity)
        })
        .collect()
}
