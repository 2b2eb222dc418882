use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Axis-aligned bounding box in world coordinates.
///
/// Used for the world boundary, quadtree node regions and region queries.
/// Both `min` and `max` are inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Aabb {
    pub min: Vec2,
    pub max: Vec2,
}

impl Aabb {
    pub fn new(min: Vec2, max: Vec2) -> Self {
        Self { min, max }
    }

    /// Square box anchored at the origin.
    pub fn square(size: f32) -> Self {
        Self::new(Vec2::ZERO, Vec2::splat(size))
    }

    /// Bounding box of a circle.
    pub fn around_circle(center: Vec2, radius: f32) -> Self {
        Self::new(center - Vec2::splat(radius), center + Vec2::splat(radius))
    }

    /// Tight bounds over a set of points, `None` when empty.
    pub fn from_points(points: impl IntoIterator<Item = Vec2>) -> Option<Self> {
        let mut iter = points.into_iter();
        let first = iter.next()?;
        Some(iter.fold(Self::new(first, first), |acc, p| {
            Self::new(acc.min.min(p), acc.max.max(p))
        }))
    }

    pub fn center(&self) -> Vec2 {
        (self.min + self.max) * 0.5
    }

    pub fn size(&self) -> Vec2 {
        self.max - self.min
    }

    /// Finite with `min <= max` on both axes.
    pub fn is_valid(&self) -> bool {
        self.min.is_finite() && self.max.is_finite() && self.min.cmple(self.max).all()
    }

    /// Valid and with strictly positive area.
    pub fn has_area(&self) -> bool {
        self.is_valid() && self.min.cmplt(self.max).all()
    }

    pub fn contains(&self, point: Vec2) -> bool {
        point.cmpge(self.min).all() && point.cmple(self.max).all()
    }

    pub fn intersects(&self, other: &Aabb) -> bool {
        self.min.cmple(other.max).all() && other.min.cmple(self.max).all()
    }

    /// Closed-disk test: true when any point of the box lies within `radius` of `center`.
    pub fn intersects_circle(&self, center: Vec2, radius: f32) -> bool {
        let closest = center.clamp(self.min, self.max);
        closest.distance_squared(center) <= radius * radius
    }

    pub fn union(&self, other: &Aabb) -> Aabb {
        Aabb::new(self.min.min(other.min), self.max.max(other.max))
    }

    /// The four equal quadrants, indexed `x_high | (y_high << 1)`:
    /// 0 = low x / low y, 1 = high x / low y, 2 = low x / high y, 3 = high x / high y.
    pub fn quadrants(&self) -> [Aabb; 4] {
        let c = self.center();
        [
            Aabb::new(self.min, c),
            Aabb::new(Vec2::new(c.x, self.min.y), Vec2::new(self.max.x, c.y)),
            Aabb::new(Vec2::new(self.min.x, c.y), Vec2::new(c.x, self.max.y)),
            Aabb::new(c, self.max),
        ]
    }

    /// Quadrant index for a point. Points exactly on a split line go to the
    /// lower-valued side.
    pub fn quadrant_of(&self, point: Vec2) -> usize {
        let c = self.center();
        let x_high = (point.x > c.x) as usize;
        let y_high = (point.y > c.y) as usize;
        x_high | (y_high << 1)
    }
}

impl Default for Aabb {
    fn default() -> Self {
        Self::square(crate::constants::DEFAULT_WORLD_SIZE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quadrant_tie_break_goes_low() {
        let b = Aabb::square(10.0);
        assert_eq!(b.quadrant_of(Vec2::new(5.0, 5.0)), 0);
        assert_eq!(b.quadrant_of(Vec2::new(5.1, 5.0)), 1);
        assert_eq!(b.quadrant_of(Vec2::new(5.0, 5.1)), 2);
        assert_eq!(b.quadrant_of(Vec2::new(9.0, 9.0)), 3);
    }

    #[test]
    fn test_quadrants_cover_parent() {
        let b = Aabb::new(Vec2::new(-2.0, 4.0), Vec2::new(6.0, 8.0));
        let q = b.quadrants();
        let joined = q.iter().skip(1).fold(q[0], |acc, a| acc.union(a));
        assert_eq!(joined, b);
        for (i, quad) in q.iter().enumerate() {
            assert_eq!(b.quadrant_of(quad.center()), i);
        }
    }

    #[test]
    fn test_circle_intersection_is_closed() {
        let b = Aabb::square(1.0);
        assert!(b.intersects_circle(Vec2::new(2.0, 0.5), 1.0));
        assert!(!b.intersects_circle(Vec2::new(2.0, 0.5), 0.99));
        assert!(b.intersects_circle(Vec2::new(0.5, 0.5), 0.0));
    }

    #[test]
    fn test_from_points_handles_empty() {
        assert!(Aabb::from_points(std::iter::empty()).is_none());
        let b = Aabb::from_points([Vec2::new(1.0, -1.0), Vec2::new(-3.0, 2.0)]).unwrap();
        assert_eq!(b, Aabb::new(Vec2::new(-3.0, -1.0), Vec2::new(1.0, 2.0)));
    }
}
