use glam::Vec3;
use std::f32::consts::TAU;

/// Place `count` points evenly on a horizontal circle around `center`.
///
/// Index 0 sits at angle 0 (the +X axis) and the rest follow
/// counter-clockwise seen from above, so a given child order always
/// yields the same layout.
pub fn circle_positions(center: Vec3, radius: f32, count: usize) -> Vec<Vec3> {
    (0..count)
        .map(|i| center + ring_offset(radius, i, count))
        .collect()
}

/// Offset of slot `index` out of `count` on the ring.
pub fn ring_offset(radius: f32, index: usize, count: usize) -> Vec3 {
    if count == 0 {
        return Vec3::ZERO;
    }
    let angle = index as f32 * TAU / count as f32;
    Vec3::new(radius * angle.cos(), 0.0, radius * angle.sin())
}

/// Angle of `point` around `center` in the XZ plane, in [0, 2π).
pub fn ring_angle(center: Vec3, point: Vec3) -> f32 {
    let d = point - center;
    d.z.atan2(d.x).rem_euclid(TAU)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn three_children_land_at_thirds() {
        let center = Vec3::new(1.0, 2.0, 3.0);
        let positions = circle_positions(center, 10.0, 3);
        let angles: Vec<f32> = positions
            .iter()
            .map(|p| ring_angle(center, *p).to_degrees())
            .collect();
        for (got, want) in angles.iter().zip([0.0, 120.0, 240.0]) {
            assert!((got - want).abs() < 1e-3, "{got} vs {want}");
        }
        for p in &positions {
            assert!((p.distance(center) - 10.0).abs() < 1e-4);
            assert_eq!(p.y, center.y);
        }
    }

    #[test]
    fn empty_ring_is_empty() {
        assert!(circle_positions(Vec3::ZERO, 5.0, 0).is_empty());
    }
}
