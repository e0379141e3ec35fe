//! HMMWV-like preset.

use nalgebra::Vector3;

use crate::axle::{Axle, Suspension, WheelSpec};
use crate::chassis::Chassis;
use crate::error::Result;
use crate::powertrain::{DriveType, Powertrain, Steering};
use crate::tire::Tire;
use crate::wheeled::WheeledVehicle;

/// Tire radius (m).
pub const HMMWV_WHEEL_RADIUS: f64 = 0.47;

/// Front axle position ahead of the centre of mass (m).
const FRONT_AXLE_X: f64 = 1.688;
/// Rear axle position behind the centre of mass (m).
const REAR_AXLE_X: f64 = -1.69;
/// Half the track width (m).
const HALF_TRACK: f64 = 0.9;
/// Strut attachment height above the centre of mass (m).
const ATTACHMENT_Z: f64 = 0.05;

/// Four-wheel utility vehicle of about 2.5 t on 0.47 m tires.
///
/// The struts are sized so that a chassis placed 0.6 m above flat ground
/// starts close to its static equilibrium.
pub fn hmmwv(tire: Tire, drive_type: DriveType, step_size: f64) -> Result<WheeledVehicle> {
    let chassis = Chassis {
        mass: 2300.0,
        inertia: Vector3::new(350.0, 1300.0, 1450.0),
    };
    let spec = WheelSpec {
        radius: HMMWV_WHEEL_RADIUS,
        width: 0.3,
        mass: 50.0,
        suspension: Suspension {
            stiffness: 6.0e4,
            damping: 4.5e3,
            rest_length: 0.3,
        },
    };

    WheeledVehicle::builder("HMMWV", chassis)
        .axle(Axle::symmetric(FRONT_AXLE_X, HALF_TRACK, ATTACHMENT_Z, spec, true))
        .axle(Axle::symmetric(REAR_AXLE_X, HALF_TRACK, ATTACHMENT_Z, spec, false))
        .steering(Steering::default())
        .powertrain(Powertrain {
            drive_type,
            ..Powertrain::default()
        })
        .tire(tire)
        .step_size(step_size)
        .build()
}
