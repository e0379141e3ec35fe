//! Wheel/terrain contact exchange.
//!
//! The vehicle fills a [`WheelQuery`] for every wheel once per tick and the
//! terrain answers with a [`WheelContact`]. All vectors are in world
//! coordinates.

use nalgebra::{Point3, Vector3};

/// Wheels whose lowest point is within this distance above the surface
/// still touch it (m).
pub const CONTACT_SLOP: f64 = 1e-3;

/// What the vehicle knows about one wheel when asking for contact.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WheelQuery {
    /// Index of the wheel's tracked body (1 + wheel index; 0 is the chassis).
    pub body: usize,
    /// Wheel centre.
    pub center: Point3<f64>,
    /// Rolling direction (unit, tangent to the ground plane).
    pub forward: Vector3<f64>,
    /// Wheel axis direction (unit, points to the wheel's left).
    pub lateral: Vector3<f64>,
    /// Tire radius (m).
    pub radius: f64,
    /// Tire width in contact (m).
    pub width: f64,
    /// Vertical load the suspension pushes into the ground (N).
    pub normal_load: f64,
    /// Longitudinal force the driveline asks for (N, signed).
    pub tractive_demand: f64,
    /// Speed of the wheel centre along `forward` (m/s).
    pub forward_speed: f64,
    /// Downward speed of the wheel centre (m/s, positive when sinking).
    pub vertical_speed: f64,
    /// Friction coefficient of the tire material.
    pub tire_friction: f64,
}

impl WheelQuery {
    /// Query for a wheel at `center` rolling along +X with no load.
    #[must_use]
    pub fn at(center: Point3<f64>, radius: f64, width: f64) -> Self {
        Self {
            body: 0,
            center,
            forward: Vector3::x(),
            lateral: Vector3::y(),
            radius,
            width,
            normal_load: 0.0,
            tractive_demand: 0.0,
            forward_speed: 0.0,
            vertical_speed: 0.0,
            tire_friction: 0.8,
        }
    }

    /// Set the normal load.
    #[must_use]
    pub fn with_load(mut self, normal_load: f64) -> Self {
        self.normal_load = normal_load;
        self
    }

    /// Set the tractive demand.
    #[must_use]
    pub fn with_demand(mut self, tractive_demand: f64) -> Self {
        self.tractive_demand = tractive_demand;
        self
    }

    /// Set the tracked body index.
    #[must_use]
    pub fn with_body(mut self, body: usize) -> Self {
        self.body = body;
        self
    }
}

/// Terrain response for one wheel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WheelContact {
    /// Contact point on the (possibly deformed) surface.
    pub point: Point3<f64>,
    /// Surface normal at the contact point.
    pub normal: Vector3<f64>,
    /// Depth of the wheel bottom below the undisturbed surface (m).
    pub sinkage: f64,
    /// Longitudinal force the ground delivers (N, signed like the demand).
    pub tractive_force: f64,
    /// Largest longitudinal force the ground can carry (N).
    pub traction_limit: f64,
    /// Force resisting rolling (N, non-negative).
    pub rolling_resistance: f64,
    /// Longitudinal slip ratio in `[0, 1]`.
    pub slip: f64,
}

impl WheelContact {
    /// Whether the ground is carrying all the force it can.
    #[must_use]
    pub fn is_saturated(&self) -> bool {
        self.tractive_force.abs() >= self.traction_limit - 1e-9
    }
}
