//! Bounding volumes used by the broad phase.

use glam::Vec3;

/// Shape stored in BVH nodes.
pub trait BoundingVolume: Clone + std::fmt::Debug {
    /// Smallest volume of this kind enclosing both inputs.
    fn enclosing(one: &Self, two: &Self) -> Self;

    fn overlaps(&self, other: &Self) -> bool;

    /// How much this volume would grow to also hold `other`. Only the
    /// ordering of the result is meaningful.
    fn growth(&self, other: &Self) -> f32;

    /// Comparable measure of the volume's extent.
    fn size(&self) -> f32;

    /// True when `other` lies entirely inside this volume, within a small
    /// tolerance for rounding.
    fn encloses(&self, other: &Self) -> bool;
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingSphere {
    pub centre: Vec3,
    pub radius: f32,
}

impl BoundingSphere {
    pub fn new(centre: Vec3, radius: f32) -> Self {
        Self { centre, radius }
    }
}

impl BoundingVolume for BoundingSphere {
    fn enclosing(one: &Self, two: &Self) -> Self {
        let offset = two.centre - one.centre;
        let distance_sq = offset.length_squared();
        let radius_diff = two.radius - one.radius;

        // One sphere already holds the other.
        if radius_diff * radius_diff >= distance_sq {
            return if one.radius > two.radius { *one } else { *two };
        }

        let distance = distance_sq.sqrt();
        let radius = (distance + one.radius + two.radius) * 0.5;
        let mut centre = one.centre;
        if distance > 0.0 {
            centre += offset * ((radius - one.radius) / distance);
        }
        Self { centre, radius }
    }

    fn overlaps(&self, other: &Self) -> bool {
        let reach = self.radius + other.radius;
        self.centre.distance_squared(other.centre) < reach * reach
    }

    fn growth(&self, other: &Self) -> f32 {
        let grown = Self::enclosing(self, other);
        grown.radius * grown.radius - self.radius * self.radius
    }

    fn size(&self) -> f32 {
        4.0 / 3.0 * std::f32::consts::PI * self.radius.powi(3)
    }

    fn encloses(&self, other: &Self) -> bool {
        self.centre.distance(other.centre) + other.radius <= self.radius + 1e-4 * self.radius.max(1.0)
    }
}

/// Axis-aligned box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min: Vec3,
    pub max: Vec3,
}

impl BoundingBox {
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self {
            min: min.min(max),
            max: min.max(max),
        }
    }

    pub fn from_centre_half_extents(centre: Vec3, half_extents: Vec3) -> Self {
        let half = half_extents.abs();
        Self {
            min: centre - half,
            max: centre + half,
        }
    }

    pub fn centre(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    pub fn extents(&self) -> Vec3 {
        self.max - self.min
    }

    pub fn surface_area(&self) -> f32 {
        let e = self.extents();
        2.0 * (e.x * e.y + e.y * e.z + e.z * e.x)
    }
}

impl BoundingVolume for BoundingBox {
    fn enclosing(one: &Self, two: &Self) -> Self {
        Self {
            min: one.min.min(two.min),
            max: one.max.max(two.max),
        }
    }

    fn overlaps(&self, other: &Self) -> bool {
        self.min.cmple(other.max).all() && other.min.cmple(self.max).all()
    }

    fn growth(&self, other: &Self) -> f32 {
        Self::enclosing(self, other).surface_area() - self.surface_area()
    }

    fn size(&self) -> f32 {
        let e = self.extents();
        e.x * e.y * e.z
    }

    fn encloses(&self, other: &Self) -> bool {
        self.min.cmple(other.min).all() && other.max.cmple(self.max).all()
    }
}
