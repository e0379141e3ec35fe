//! Wheeled vehicle with ray-cast suspension.

// Wheel counts are tiny
#![allow(clippy::cast_precision_loss)]

use nalgebra::{Isometry3, Point3, Translation3, UnitQuaternion, Vector3};
use sim_terrain::{Terrain, WheelQuery};
use sim_types::{DriverInputs, SimError, SimulationClock, VehicleState, WheelState};
use tracing::{debug, info};

use crate::Vehicle;
use crate::axle::{Axle, Wheel};
use crate::chassis::{Chassis, ChassisState};
use crate::error::{Result, VehicleError};
use crate::powertrain::{Powertrain, Steering};
use crate::tire::Tire;

/// Standard gravity (m/s^2).
pub const GRAVITY: f64 = 9.81;

/// Chassis speed above which the state is considered diverged (m/s).
const MAX_SPEED: f64 = 1.0e3;

/// Velocity scale over which direction-dependent forces fade in (m/s).
const SIGN_SMOOTHING: f64 = 0.5;

/// Below this `up.z` the chassis is on its side and the struts cannot reach the ground.
const MIN_UPRIGHT: f64 = 0.2;

/// Builder for [`WheeledVehicle`].
#[derive(Debug, Clone)]
pub struct WheeledVehicleBuilder {
    name: String,
    chassis: Chassis,
    axles: Vec<Axle>,
    steering: Steering,
    powertrain: Powertrain,
    tire: Tire,
    gravity: Vector3<f64>,
    step_size: f64,
}

impl WheeledVehicleBuilder {
    /// Start a vehicle with the given chassis.
    #[must_use]
    pub fn new(name: impl Into<String>, chassis: Chassis) -> Self {
        Self {
            name: name.into(),
            chassis,
            axles: Vec::new(),
            steering: Steering::default(),
            powertrain: Powertrain::default(),
            tire: Tire::default(),
            gravity: Vector3::new(0.0, 0.0, -GRAVITY),
            step_size: 3e-3,
        }
    }

    /// Add an axle (front to rear).
    #[must_use]
    pub fn axle(mut self, axle: Axle) -> Self {
        self.axles.push(axle);
        self
    }

    /// Set the steering.
    #[must_use]
    pub fn steering(mut self, steering: Steering) -> Self {
        self.steering = steering;
        self
    }

    /// Set the powertrain. Its drive type decides which axles are driven.
    #[must_use]
    pub fn powertrain(mut self, powertrain: Powertrain) -> Self {
        self.powertrain = powertrain;
        self
    }

    /// Set the tire.
    #[must_use]
    pub fn tire(mut self, tire: Tire) -> Self {
        self.tire = tire;
        self
    }

    /// Set gravity.
    #[must_use]
    pub fn gravity(mut self, gravity: Vector3<f64>) -> Self {
        self.gravity = gravity;
        self
    }

    /// Set the nominal integration step.
    #[must_use]
    pub fn step_size(mut self, step_size: f64) -> Self {
        self.step_size = step_size;
        self
    }

    /// Validate and build the vehicle.
    pub fn build(self) -> Result<WheeledVehicle> {
        self.chassis.validate()?;
        self.powertrain.validate()?;
        self.tire.material.validate()?;
        if self.axles.is_empty() {
            return Err(VehicleError::NoAxles);
        }
        if !(self.step_size.is_finite() && self.step_size > 0.0) {
            return Err(VehicleError::invalid_parameters(format!(
                "step size must be positive, got {}",
                self.step_size
            )));
        }

        let count = self.axles.len();
        let drive_type = self.powertrain.drive_type;
        let wheels: Vec<Wheel> = self
            .axles
            .into_iter()
            .enumerate()
            .flat_map(|(i, axle)| axle.driven(drive_type.drives(i, count)).wheels)
            .collect();
        for wheel in &wheels {
            wheel.validate()?;
        }

        let strut_lengths = wheels.iter().map(|w| w.suspension.rest_length).collect();
        let wheel_states = vec![WheelState::default(); wheels.len()];
        Ok(WheeledVehicle {
            name: self.name,
            chassis: self.chassis,
            wheels,
            steering: self.steering,
            powertrain: self.powertrain,
            tire: self.tire,
            gravity: self.gravity,
            state: ChassisState::at_rest(Isometry3::identity()),
            clock: SimulationClock::new(self.step_size),
            inputs: DriverInputs::ZERO,
            strut_lengths,
            wheel_states,
            force: Vector3::zeros(),
            torque: Vector3::zeros(),
        })
    }
}

/// Rigid chassis on spring-damper struts with quasi-static wheels.
///
/// Each tick, [`synchronize`](Vehicle::synchronize) casts every strut down
/// onto the terrain, turns compression into wheel load, asks the terrain
/// for traction and sums wheel forces onto the chassis;
/// [`advance`](Vehicle::advance) integrates the chassis and ticks the clock.
#[derive(Debug, Clone)]
pub struct WheeledVehicle {
    name: String,
    chassis: Chassis,
    wheels: Vec<Wheel>,
    steering: Steering,
    powertrain: Powertrain,
    tire: Tire,
    gravity: Vector3<f64>,
    state: ChassisState,
    clock: SimulationClock,
    inputs: DriverInputs,
    strut_lengths: Vec<f64>,
    wheel_states: Vec<WheelState>,
    force: Vector3<f64>,
    torque: Vector3<f64>,
}

impl WheeledVehicle {
    /// Start building a vehicle.
    #[must_use]
    pub fn builder(name: impl Into<String>, chassis: Chassis) -> WheeledVehicleBuilder {
        WheeledVehicleBuilder::new(name, chassis)
    }

    /// Vehicle name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Wheels, axle by axle, left before right.
    #[must_use]
    pub fn wheels(&self) -> &[Wheel] {
        &self.wheels
    }

    /// Chassis kinematic state.
    #[must_use]
    pub fn chassis_state(&self) -> &ChassisState {
        &self.state
    }

    /// Inputs applied at the last synchronize.
    #[must_use]
    pub fn inputs(&self) -> DriverInputs {
        self.inputs
    }

    /// Total force applied to the chassis at the last synchronize (excluding gravity).
    ///
    /// Held across `advance` until the next synchronize recomputes it.
    #[must_use]
    pub fn applied_force(&self) -> Vector3<f64> {
        self.force
    }

    fn steer_angle(&self, wheel: &Wheel) -> f64 {
        if wheel.steerable {
            self.steering.angle(self.inputs.steering)
        } else {
            0.0
        }
    }

    fn wheel_pose(&self, index: usize) -> Isometry3<f64> {
        let wheel = &self.wheels[index];
        let local = wheel.attachment - Vector3::z() * self.strut_lengths[index];
        let center = self.state.pose.transform_point(&local);
        let steer = UnitQuaternion::from_euler_angles(0.0, 0.0, self.steer_angle(wheel));
        Isometry3::from_parts(
            Translation3::from(center.coords),
            self.state.pose.rotation * steer,
        )
    }

    fn driven_count(&self) -> usize {
        self.wheels.iter().filter(|w| w.driven).count()
    }
}

/// `sign(v)` faded in over [`SIGN_SMOOTHING`] so forces vanish at rest.
fn smooth_sign(v: f64) -> f64 {
    (v / SIGN_SMOOTHING).tanh()
}

impl Vehicle for WheeledVehicle {
    fn initialize(&mut self, pose: Isometry3<f64>) {
        self.state = ChassisState::at_rest(pose);
        self.clock.reset(0.0);
        self.inputs = DriverInputs::ZERO;
        self.force = Vector3::zeros();
        self.torque = Vector3::zeros();
        for (len, wheel) in self.strut_lengths.iter_mut().zip(&self.wheels) {
            *len = wheel.suspension.rest_length;
        }
        for i in 0..self.wheels.len() {
            self.wheel_states[i] = WheelState {
                center: Point3::from(self.wheel_pose(i).translation.vector),
                ..WheelState::default()
            };
        }
        info!(
            name = %self.name,
            mass = self.mass(),
            wheels = self.wheels.len(),
            x = pose.translation.x,
            y = pose.translation.y,
            z = pose.translation.z,
            "vehicle initialized"
        );
    }

    fn time(&self) -> f64 {
        self.clock.time()
    }

    fn mass(&self) -> f64 {
        self.chassis.mass + self.wheels.iter().map(|w| w.mass).sum::<f64>()
    }

    fn state(&self) -> VehicleState {
        let mut wheels = self.wheel_states.clone();
        for (i, wheel) in wheels.iter_mut().enumerate() {
            wheel.center = Point3::from(self.wheel_pose(i).translation.vector);
        }
        VehicleState {
            time: self.clock.time(),
            pose: self.state.pose,
            linear_velocity: self.state.linear_velocity,
            angular_velocity: self.state.angular_velocity,
            wheels,
        }
    }

    fn tracked_poses(&self) -> Vec<Isometry3<f64>> {
        std::iter::once(self.state.pose)
            .chain((0..self.wheels.len()).map(|i| self.wheel_pose(i)))
            .collect()
    }

    #[allow(clippy::too_many_lines)]
    fn synchronize(&mut self, time: f64, inputs: &DriverInputs, terrain: &mut dyn Terrain) {
        if (time - self.clock.time()).abs() > 1e-9 {
            debug!(time, vehicle_time = self.clock.time(), "vehicle synchronized off its clock");
        }
        self.inputs = inputs.clamped();
        self.force = Vector3::zeros();
        self.torque = Vector3::zeros();

        let poses = self.tracked_poses();
        terrain.begin_contacts(&poses);

        let pose = self.state.pose;
        let com = Point3::from(pose.translation.vector);
        let up = pose.rotation * Vector3::z();
        let down = -up;
        let driven = self.driven_count();
        let corner_mass = self.mass() / self.wheels.len() as f64;
        let zeta = self.tire.material.damping_ratio();
        let width_factor = self.tire.tire_type.width_factor();

        for i in 0..self.wheels.len() {
            let wheel = self.wheels[i];
            let steer_angle = self.steer_angle(&wheel);
            let strut = wheel.suspension;
            let anchor = pose.transform_point(&wheel.attachment);

            // Ray along the strut to where the tire bottom meets the ground
            let probe = anchor + down * strut.rest_length;
            let ground = terrain.height(probe.x, probe.y);
            let distance = if up.z > MIN_UPRIGHT {
                (anchor.z - ground - wheel.radius) / up.z
            } else {
                f64::INFINITY
            };

            if distance >= strut.rest_length {
                self.strut_lengths[i] = strut.rest_length;
                self.wheel_states[i] = WheelState {
                    steer_angle,
                    ..WheelState::default()
                };
                continue;
            }
            self.strut_lengths[i] = distance.max(0.0);
            let center = anchor + down * self.strut_lengths[i];

            // Suspension and tire springs in series
            let width = wheel.width * width_factor;
            let k_tire = self.tire.material.radial_stiffness(width);
            let k_eff = strut.stiffness * k_tire / (strut.stiffness + k_tire);
            let c_eff = strut.damping + 2.0 * zeta * (k_eff * corner_mass).sqrt();
            let compression = strut.rest_length - distance;
            let rate = self.state.point_velocity(&anchor).dot(&down);
            let load = (k_eff * compression + c_eff * rate).max(0.0);

            let normal = terrain.normal(center.x, center.y);
            let heading = pose.rotation
                * UnitQuaternion::from_euler_angles(0.0, 0.0, steer_angle)
                * Vector3::x();
            let Some(forward) = (heading - normal * heading.dot(&normal)).try_normalize(1e-9)
            else {
                continue;
            };
            let lateral = normal.cross(&forward);

            let v_center = self.state.point_velocity(&center);
            let forward_speed = v_center.dot(&forward);
            let lateral_speed = v_center.dot(&lateral);

            let drive = if wheel.driven {
                self.powertrain
                    .wheel_torque(self.inputs.throttle, forward_speed / wheel.radius, driven)
                    / wheel.radius
            } else {
                0.0
            };
            let brake = self.powertrain.brake_torque(self.inputs.braking) / wheel.radius
                * smooth_sign(forward_speed);

            let query = WheelQuery {
                body: 1 + i,
                center,
                forward,
                lateral,
                radius: wheel.radius,
                width,
                normal_load: load,
                tractive_demand: drive - brake,
                forward_speed,
                vertical_speed: -v_center.dot(&normal),
                tire_friction: self.tire.material.mu,
            };
            let Some(contact) = terrain.contact(&query) else {
                self.wheel_states[i] = WheelState {
                    steer_angle,
                    ..WheelState::default()
                };
                continue;
            };

            let resistance = contact.rolling_resistance * smooth_sign(forward_speed);
            let longitudinal = contact.tractive_force - resistance;
            let ground_mu = terrain.friction(center.x, center.y);
            let side = self.tire.lateral_force(
                load,
                forward_speed,
                lateral_speed,
                contact.tractive_force,
                ground_mu,
            );

            let f = contact.normal * load + forward * longitudinal + lateral * side;
            self.force += f;
            self.torque += (contact.point - com).cross(&f);

            self.wheel_states[i] = WheelState {
                center,
                in_contact: true,
                normal_load: load,
                tractive_force: contact.tractive_force,
                sinkage: contact.sinkage,
                slip: contact.slip,
                steer_angle,
            };
        }

        terrain.end_contacts();
    }

    fn advance(&mut self, dt: f64) -> sim_types::Result<()> {
        if !dt.is_finite() || dt <= 0.0 {
            return Err(SimError::InvalidTimestep(dt));
        }
        let mass = self.mass();
        self.state.integrate(
            &self.chassis,
            mass,
            &self.force,
            &self.torque,
            &self.gravity,
            dt,
        );

        if !self.state.is_finite() {
            return Err(SimError::diverged(format!(
                "{} chassis state is not finite at t = {:.4}",
                self.name,
                self.clock.time()
            )));
        }
        let speed = self.state.linear_velocity.norm();
        if speed > MAX_SPEED {
            return Err(SimError::diverged(format!(
                "{} chassis speed {speed:.1} m/s exceeds {MAX_SPEED} m/s",
                self.name
            )));
        }

        self.clock.advance(dt);
        Ok(())
    }
}
