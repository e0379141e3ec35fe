//! Non-deformable terrain.

use nalgebra::{Isometry3, Point3, Vector3};

use crate::contact::{CONTACT_SLOP, WheelContact, WheelQuery};
use crate::heightfield::HeightField;
use crate::{Terrain, TerrainKind};

/// Default rolling resistance coefficient on hard ground.
pub const DEFAULT_ROLLING_RESISTANCE: f64 = 0.015;

/// Rigid ground: an infinite plane or a fixed height field.
///
/// Traction is pure Coulomb: the ground carries up to `min(mu, tire mu) * load`
/// and nothing sinks.
#[derive(Debug, Clone)]
pub struct RigidTerrain {
    surface: Option<HeightField>,
    level: f64,
    friction: f64,
    rolling_resistance: f64,
}

impl Default for RigidTerrain {
    fn default() -> Self {
        Self::flat(0.0)
    }
}

impl RigidTerrain {
    /// Infinite flat ground at the given height.
    #[must_use]
    pub fn flat(level: f64) -> Self {
        Self {
            surface: None,
            level,
            friction: 0.9,
            rolling_resistance: DEFAULT_ROLLING_RESISTANCE,
        }
    }

    /// Ground shaped by a height field; outside the grid the edge heights extend.
    #[must_use]
    pub fn from_heightfield(surface: HeightField) -> Self {
        Self {
            surface: Some(surface),
            ..Self::flat(0.0)
        }
    }

    /// Set the ground friction coefficient.
    #[must_use]
    pub fn with_friction(mut self, friction: f64) -> Self {
        self.friction = friction.max(0.0);
        self
    }

    /// Set the rolling resistance coefficient.
    #[must_use]
    pub fn with_rolling_resistance(mut self, crr: f64) -> Self {
        self.rolling_resistance = crr.max(0.0);
        self
    }
}

impl Terrain for RigidTerrain {
    fn kind(&self) -> TerrainKind {
        TerrainKind::Rigid
    }

    fn height(&self, x: f64, y: f64) -> f64 {
        self.surface.as_ref().map_or(self.level, |s| s.sample(x, y))
    }

    fn normal(&self, x: f64, y: f64) -> Vector3<f64> {
        self.surface.as_ref().map_or_else(Vector3::z, |s| s.normal(x, y))
    }

    fn friction(&self, _x: f64, _y: f64) -> f64 {
        self.friction
    }

    fn extent(&self) -> Option<((f64, f64), (f64, f64))> {
        self.surface.as_ref().map(HeightField::bounds)
    }

    fn begin_contacts(&mut self, _bodies: &[Isometry3<f64>]) {}

    fn contact(&mut self, query: &WheelQuery) -> Option<WheelContact> {
        let (x, y) = (query.center.x, query.center.y);
        let ground = self.height(x, y);
        let bottom = query.center.z - query.radius;
        if bottom > ground + CONTACT_SLOP || query.normal_load <= 0.0 {
            return None;
        }

        let mu = self.friction.min(query.tire_friction.max(0.0));
        let limit = mu * query.normal_load;
        let tractive_force = query.tractive_demand.clamp(-limit, limit);
        let slip = if limit <= 0.0 {
            0.0
        } else if tractive_force.abs() >= limit {
            1.0
        } else {
            0.1 * tractive_force.abs() / limit
        };

        Some(WheelContact {
            point: Point3::new(x, y, ground),
            normal: self.normal(x, y),
            sinkage: 0.0,
            tractive_force,
            traction_limit: limit,
            rolling_resistance: self.rolling_resistance * query.normal_load,
            slip,
        })
    }

    fn synchronize(&mut self, _time: f64) {}

    fn advance(&mut self, _dt: f64) {}
}
