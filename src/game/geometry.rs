//! Axis-aligned bounds for proximity queries

use glam::Vec2;

/// Axis-aligned rectangle
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min: Vec2,
    pub max: Vec2,
}

impl Bounds {
    pub fn new(min: Vec2, max: Vec2) -> Self {
        Self {
            min: min.min(max),
            max: min.max(max),
        }
    }

    /// Rectangle of `size` centered on `center`
    pub fn from_center(center: Vec2, size: Vec2) -> Self {
        let half = size.abs() * 0.5;
        Self::new(center - half, center + half)
    }

    /// Overlap test; touching edges count as intersecting
    pub fn intersects(&self, other: &Bounds) -> bool {
        !(self.max.x < other.min.x
            || self.max.y < other.min.y
            || self.min.x > other.max.x
            || self.min.y > other.max.y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_center() {
        let b = Bounds::from_center(Vec2::new(90.0, 160.0), Vec2::new(20.0, 40.0));
        assert_eq!(b.min, Vec2::new(80.0, 140.0));
        assert_eq!(b.max, Vec2::new(100.0, 180.0));
    }

    #[test]
    fn test_intersects() {
        let a = Bounds::new(Vec2::ZERO, Vec2::new(10.0, 10.0));
        let overlapping = Bounds::new(Vec2::new(5.0, 5.0), Vec2::new(15.0, 15.0));
        let touching = Bounds::new(Vec2::new(10.0, 0.0), Vec2::new(20.0, 10.0));
        let apart = Bounds::new(Vec2::new(10.5, 0.0), Vec2::new(20.0, 10.0));

        assert!(a.intersects(&overlapping));
        assert!(overlapping.intersects(&a));
        assert!(a.intersects(&touching));
        assert!(!a.intersects(&apart));
    }

    #[test]
    fn test_contained_rect_intersects() {
        let outer = Bounds::from_center(Vec2::ZERO, Vec2::splat(100.0));
        let inner = Bounds::from_center(Vec2::ZERO, Vec2::splat(2.0));
        assert!(outer.intersects(&inner));
        assert!(inner.intersects(&outer));
    }
}
