use glam::Vec3;

/// Cubic ease-in-out over `t` in [0, 1].
pub fn ease_in_out_cubic(t: f32) -> f32 {
    let t = t.clamp(0.0, 1.0);
    if t < 0.5 {
        4.0 * t * t * t
    } else {
        1.0 - (-2.0 * t + 2.0).powi(3) / 2.0
    }
}

/// Uniform Catmull-Rom spline through a list of control points.
///
/// The curve passes through every point; the two ends use mirrored
/// phantom points so the first and last segments are not flattened.
#[derive(Debug, Clone, PartialEq)]
pub struct CatmullRomPath {
    points: Vec<Vec3>,
}

impl CatmullRomPath {
    pub fn new(points: Vec<Vec3>) -> Self {
        Self { points }
    }

    /// Source, a midpoint lifted by `lift` along +Y, and target.
    pub fn arc(source: Vec3, target: Vec3, lift: f32) -> Self {
        let mid = (source + target) * 0.5 + Vec3::Y * lift;
        Self::new(vec![source, mid, target])
    }

    pub fn points(&self) -> &[Vec3] {
        &self.points
    }

    /// Point at global parameter `t` in [0, 1].
    pub fn point(&self, t: f32) -> Vec3 {
        let n = self.points.len();
        match n {
            0 => return Vec3::ZERO,
            1 => return self.points[0],
            _ => {}
        }

        let scaled = t.clamp(0.0, 1.0) * (n - 1) as f32;
        let mut segment = scaled.floor() as usize;
        let mut local = scaled - segment as f32;
        if segment >= n - 1 {
            segment = n - 2;
            local = 1.0;
        }

        let p1 = self.points[segment];
        let p2 = self.points[segment + 1];
        let p0 = if segment > 0 {
            self.points[segment - 1]
        } else {
            p1 * 2.0 - p2
        };
        let p3 = if segment + 2 < n {
            self.points[segment + 2]
        } else {
            p2 * 2.0 - p1
        };

        catmull_rom(p0, p1, p2, p3, local)
    }

    /// Approximate arc length by sampling.
    pub fn length(&self, samples: usize) -> f32 {
        let samples = samples.max(1);
        let mut previous = self.point(0.0);
        let mut total = 0.0;
        for i in 1..=samples {
            let p = self.point(i as f32 / samples as f32);
            total += p.distance(previous);
            previous = p;
        }
        total
    }
}

fn catmull_rom(p0: Vec3, p1: Vec3, p2: Vec3, p3: Vec3, t: f32) -> Vec3 {
    let t2 = t * t;
    let t3 = t2 * t;
    0.5 * ((2.0 * p1)
        + (p2 - p0) * t
        + (2.0 * p0 - 5.0 * p1 + 4.0 * p2 - p3) * t2
        + (3.0 * p1 - p0 - 3.0 * p2 + p3) * t3)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn easing_is_symmetric_and_pinned() {
        assert_eq!(ease_in_out_cubic(0.0), 0.0);
        assert_eq!(ease_in_out_cubic(1.0), 1.0);
        assert!((ease_in_out_cubic(0.5) - 0.5).abs() < 1e-6);
        let a = ease_in_out_cubic(0.2);
        let b = ease_in_out_cubic(0.8);
        assert!((a + b - 1.0).abs() < 1e-6);
        assert_eq!(ease_in_out_cubic(-3.0), 0.0);
    }

    #[test]
    fn arc_passes_through_its_control_points() {
        let source = Vec3::new(-10.0, 0.0, 0.0);
        let target = Vec3::new(10.0, 0.0, 0.0);
        let path = CatmullRomPath::arc(source, target, 6.0);
        assert!(path.point(0.0).distance(source) < 1e-5);
        assert!(path.point(1.0).distance(target) < 1e-5);
        assert!(path.point(0.5).distance(Vec3::new(0.0, 6.0, 0.0)) < 1e-5);
        // arcs above the straight line the whole way
        for i in 1..10 {
            assert!(path.point(i as f32 / 10.0).y > 0.0);
        }
        assert!(path.length(64) > 20.0);
    }

    #[test]
    fn degenerate_paths_do_not_panic() {
        assert_eq!(CatmullRomPath::new(vec![]).point(0.3), Vec3::ZERO);
        let p = Vec3::new(1.0, 2.0, 3.0);
        assert_eq!(CatmullRomPath::new(vec![p]).point(0.7), p);
        let still = CatmullRomPath::arc(p, p, 0.0);
        assert!(still.point(0.4).distance(p) < 1e-5);
    }
}
