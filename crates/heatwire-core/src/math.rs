//! Interpolation and intersection helpers.

use crate::vec2::Vec2;

/// Piecewise-linear interpolation over control points sorted by `x`.
///
/// Values below the first point clamp to its `y`, values above the last
/// point clamp to the last `y`. An empty point list yields `0.0`.
pub fn lerp(value: f64, points: &[(f64, f64)]) -> f64 {
    for (i, &(x, y)) in points.iter().enumerate() {
        if x == value {
            return y;
        }
        if x > value {
            if i == 0 {
                return y;
            }
            let (x0, y0) = points[i - 1];
            let progress = (value - x0) / (x - x0);
            return y0 + (y - y0) * progress;
        }
    }
    points.last().map(|&(_, y)| y).unwrap_or(0.0)
}

/// Slab test: does the ray `origin + t * direction` (t >= 0) touch the
/// axis-aligned box `[box_min, box_max]`?
///
/// A zero direction component means the ray never moves on that axis, so
/// the origin must already lie inside the slab.
pub fn ray_intersects_box(origin: Vec2, direction: Vec2, box_min: Vec2, box_max: Vec2) -> bool {
    let axes = [
        (origin.x, direction.x, box_min.x, box_max.x),
        (origin.y, direction.y, box_min.y, box_max.y),
    ];

    let mut entry = 0.0_f64;
    let mut exit = f64::INFINITY;
    for (o, d, lo, hi) in axes {
        if d == 0.0 {
            if o < lo || o > hi {
                return false;
            }
            continue;
        }
        let t1 = (lo - o) / d;
        let t2 = (hi - o) / d;
        entry = entry.max(t1.min(t2));
        exit = exit.min(t1.max(t2));
    }
    exit >= entry
}
