//! Deformable soil terrain.

// Node counts are far below 2^52 and grid indices are checked before use
#![allow(clippy::cast_precision_loss)]

use nalgebra::{Isometry3, Point3, Vector3};
use tracing::{debug, info};

use super::patch::MovingPatch;
use super::soil::SoilParameters;
use super::stats::StepStatistics;
use crate::contact::{CONTACT_SLOP, WheelContact, WheelQuery};
use crate::error::{Result, TerrainError};
use crate::heightfield::HeightField;
use crate::patch::PatchType;
use crate::{Terrain, TerrainKind};

/// Fixed-point iterations of the pressure/sinkage/footprint loop.
const SINKAGE_ITERATIONS: usize = 8;

const NODE_HIT: u8 = 0b01;
const NODE_MODIFIED: u8 = 0b10;

type Rect = ((f64, f64), (f64, f64));

/// Node data of an initialized soil patch.
#[derive(Debug, Clone)]
struct SoilGrid {
    /// Undisturbed surface.
    initial: HeightField,
    /// Current (deformed) surface.
    level: HeightField,
    /// Last contact pressure per node (Pa).
    pressure: Vec<f64>,
    /// Per-node hit/modified flags for the current step.
    flags: Vec<u8>,
    /// Nodes with non-zero flags or pressure, cleared on the next step.
    touched: Vec<usize>,
}

impl SoilGrid {
    fn new(initial: HeightField) -> Self {
        let n = initial.len();
        Self {
            level: initial.clone(),
            initial,
            pressure: vec![0.0; n],
            flags: vec![0; n],
            touched: Vec::new(),
        }
    }

    fn clear_step(&mut self) {
        for idx in self.touched.drain(..) {
            self.flags[idx] = 0;
            self.pressure[idx] = 0.0;
        }
    }

    fn mark(&mut self, idx: usize, flag: u8) -> bool {
        let before = self.flags[idx];
        if before == 0 {
            self.touched.push(idx);
        }
        self.flags[idx] |= flag;
        before & flag == 0
    }
}

/// Soil contact model terrain.
///
/// A regular grid of soil columns. Each step the wheels press footprints
/// into the grid: sinkage follows Bekker's pressure-sinkage law, traction
/// is bounded by Mohr-Coulomb and mobilised according to Janosi-Hanamoto.
/// Deformation is plastic only: nodes are lowered, never raised.
///
/// # Example
///
/// ```
/// use sim_terrain::{PatchType, ScmTerrain, SoilParameters, Terrain, WheelQuery};
/// use nalgebra::{Isometry3, Point3};
///
/// let mut terrain = ScmTerrain::new(SoilParameters::default()).unwrap();
/// terrain.initialize(&PatchType::Flat { size_x: 4.0, size_y: 4.0 }, 0.05).unwrap();
///
/// terrain.synchronize(0.0);
/// terrain.begin_contacts(&[Isometry3::identity()]);
/// let query = WheelQuery::at(Point3::new(0.0, 0.0, 0.45), 0.47, 0.3).with_load(6000.0);
/// let contact = terrain.contact(&query).unwrap();
/// terrain.end_contacts();
///
/// assert!(contact.sinkage > 0.0);
/// assert!(terrain.height(0.0, 0.0) < 0.0);
/// ```
#[derive(Debug, Clone)]
pub struct ScmTerrain {
    soil: SoilParameters,
    grid: Option<SoilGrid>,
    patches: Vec<MovingPatch>,
    domain: Vec<Rect>,
    plot_range: (f64, f64),
    stats: StepStatistics,
    time: f64,
}

impl ScmTerrain {
    /// Create an uninitialized terrain with the given soil.
    ///
    /// # Errors
    ///
    /// Returns an error if the soil parameters are invalid.
    pub fn new(soil: SoilParameters) -> Result<Self> {
        soil.validate()?;
        Ok(Self {
            soil,
            grid: None,
            patches: Vec::new(),
            domain: Vec::new(),
            plot_range: (0.0, 0.1),
            stats: StepStatistics::default(),
            time: 0.0,
        })
    }

    /// Build the soil grid from a patch profile with node spacing `delta`.
    ///
    /// # Errors
    ///
    /// Returns an error if the profile cannot be built.
    pub fn initialize(&mut self, patch: &PatchType, delta: f64) -> Result<()> {
        let surface = patch.build(delta)?;
        info!(
            patch = patch.name(),
            nx = surface.nx(),
            ny = surface.ny(),
            delta,
            "SCM terrain initialized"
        );
        self.initialize_from(surface);
        Ok(())
    }

    /// Use an existing height field as the undisturbed soil surface.
    pub fn initialize_from(&mut self, surface: HeightField) {
        self.grid = Some(SoilGrid::new(surface));
    }

    /// Whether `initialize` has been called.
    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.grid.is_some()
    }

    /// Restrict contact tests to a box that follows a vehicle body.
    pub fn add_moving_patch(&mut self, patch: MovingPatch) {
        self.patches.push(patch);
    }

    /// Registered moving patches.
    #[must_use]
    pub fn moving_patches(&self) -> &[MovingPatch] {
        &self.patches
    }

    /// Set the sinkage range mapped onto the false-colour scale.
    #[must_use]
    pub fn with_plot_range(mut self, min: f64, max: f64) -> Self {
        self.plot_range = (min.min(max), min.max(max));
        self
    }

    /// Sinkage range for false colouring.
    #[must_use]
    pub fn plot_range(&self) -> (f64, f64) {
        self.plot_range
    }

    /// Soil parameters.
    #[must_use]
    pub fn soil(&self) -> &SoilParameters {
        &self.soil
    }

    /// Current (deformed) soil surface.
    pub fn surface(&self) -> Result<&HeightField> {
        self.grid
            .as_ref()
            .map(|g| &g.level)
            .ok_or(TerrainError::NotInitialized)
    }

    /// Contact pressure at the node nearest to `(x, y)` from the last step.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn pressure(&self, x: f64, y: f64) -> f64 {
        let Some(grid) = &self.grid else {
            return 0.0;
        };
        let ((x0, y0), _) = grid.level.bounds();
        if !grid.level.contains(x, y) {
            return 0.0;
        }
        let i = ((x - x0) / grid.level.cell_size()).round() as usize;
        let j = ((y - y0) / grid.level.cell_size()).round() as usize;
        let i = i.min(grid.level.nx() - 1);
        let j = j.min(grid.level.ny() - 1);
        grid.pressure[grid.level.index(i, j)]
    }

    /// Simulation time of the last synchronize/advance.
    #[must_use]
    pub fn time(&self) -> f64 {
        self.time
    }

    fn in_domain(&self, x: f64, y: f64) -> bool {
        self.patches.is_empty()
            || self
                .domain
                .iter()
                .any(|&((x0, y0), (x1, y1))| x >= x0 && x <= x1 && y >= y0 && y <= y1)
    }

    fn count_active_nodes(&self) -> usize {
        let Some(grid) = &self.grid else {
            return 0;
        };
        if self.patches.is_empty() {
            return grid.level.len();
        }
        let Some(union) = self.domain.iter().copied().reduce(|(a0, a1), (b0, b1)| {
            (
                (a0.0.min(b0.0), a0.1.min(b0.1)),
                (a1.0.max(b1.0), a1.1.max(b1.1)),
            )
        }) else {
            return 0;
        };
        let Some(((i0, i1), (j0, j1))) = grid.level.node_range(union.0, union.1) else {
            return 0;
        };
        let mut count = 0;
        for j in j0..=j1 {
            for i in i0..=i1 {
                if self.in_domain(grid.level.node_x(i), grid.level.node_y(j)) {
                    count += 1;
                }
            }
        }
        count
    }
}

/// Footprint length of a wheel of radius `r` at sinkage `z`, at least one cell.
fn contact_length(radius: f64, sinkage: f64, delta: f64) -> f64 {
    let z = sinkage.clamp(0.0, radius);
    (2.0 * (2.0 * radius * z - z * z).max(0.0).sqrt()).max(delta)
}

impl Terrain for ScmTerrain {
    fn kind(&self) -> TerrainKind {
        TerrainKind::Scm
    }

    fn height(&self, x: f64, y: f64) -> f64 {
        self.grid.as_ref().map_or(0.0, |g| g.level.sample(x, y))
    }

    fn normal(&self, x: f64, y: f64) -> Vector3<f64> {
        self.grid
            .as_ref()
            .map_or_else(Vector3::z, |g| g.level.normal(x, y))
    }

    fn friction(&self, _x: f64, _y: f64) -> f64 {
        self.soil.friction_coefficient()
    }

    fn sinkage(&self, x: f64, y: f64) -> f64 {
        self.grid.as_ref().map_or(0.0, |g| {
            (g.initial.sample(x, y) - g.level.sample(x, y)).max(0.0)
        })
    }

    fn extent(&self) -> Option<((f64, f64), (f64, f64))> {
        self.grid.as_ref().map(|g| g.level.bounds())
    }

    fn sinkage_plot_range(&self) -> Option<(f64, f64)> {
        Some(self.plot_range)
    }

    fn begin_contacts(&mut self, bodies: &[Isometry3<f64>]) {
        self.stats.timer_total.start();
        self.stats.timer_moving_patches.start();

        self.domain = self
            .patches
            .iter()
            .filter_map(|p| bodies.get(p.anchor.body_index()).map(|pose| p.world_bounds(pose)))
            .collect();
        self.stats.active_nodes = self.count_active_nodes();

        self.stats.timer_moving_patches.stop();
        self.stats.timer_total.stop();
    }

    #[allow(clippy::too_many_lines)]
    fn contact(&mut self, query: &WheelQuery) -> Option<WheelContact> {
        if query.normal_load <= 0.0 || query.radius <= 0.0 || query.width <= 0.0 {
            return None;
        }
        let (x, y) = (query.center.x, query.center.y);
        let active = self.in_domain(x, y);
        let soil = self.soil;
        let delta;
        let surface;
        let initial;
        {
            let grid = self.grid.as_ref()?;
            surface = grid.level.sample(x, y);
            initial = grid.initial.sample(x, y);
            delta = grid.level.cell_size();
        }
        if query.center.z - query.radius > surface + CONTACT_SLOP {
            return None;
        }

        self.stats.timer_total.start();
        self.stats.timer_contact_forces.start();

        let (r, b, load) = (query.radius, query.width, query.normal_load);
        let mut sinkage = (initial - surface).max(1e-3 * r);
        let mut pressure = 0.0;
        let mut length = delta;
        for _ in 0..SINKAGE_ITERATIONS {
            length = contact_length(r, sinkage, delta);
            pressure = load / (b * length) + soil.damping * query.vertical_speed.max(0.0);
            sinkage = soil.sinkage(b, pressure);
        }
        let elastic = pressure / soil.elastic_stiffness;

        let area = b * length;
        let f_max = area * soil.mohr_cohesion + load * soil.friction_coefficient();
        let f_cap = f_max * (1.0 - (-length / soil.janosi_shear).exp());
        let tractive_force = query.tractive_demand.clamp(-f_cap, f_cap);
        let slip = if f_max <= 0.0 {
            0.0
        } else if tractive_force.abs() >= f_cap {
            1.0
        } else {
            let ratio = (tractive_force.abs() / f_max).min(1.0 - 1e-12);
            let shear_displacement = -soil.janosi_shear * (1.0 - ratio).ln();
            (shear_displacement / length).min(1.0)
        };
        let rolling_resistance = soil.compaction_resistance(b, sinkage);

        self.stats.timer_contact_forces.stop();

        if active {
            self.stats.timer_ray_casting.start();
            self.press_footprint(query, sinkage, length, pressure);
            self.stats.timer_ray_casting.stop();
        }
        self.stats.contact_patches += 1;
        self.stats.timer_total.stop();

        let ground = self.height(x, y);
        Some(WheelContact {
            point: Point3::new(x, y, ground),
            normal: self.normal(x, y),
            sinkage: sinkage + elastic,
            tractive_force,
            traction_limit: f_cap,
            rolling_resistance,
            slip,
        })
    }

    fn end_contacts(&mut self) {
        debug!(
            time = self.time,
            active_nodes = self.stats.active_nodes,
            ray_hits = self.stats.ray_hits,
            modified_nodes = self.stats.modified_nodes,
            "SCM contact pass"
        );
    }

    fn synchronize(&mut self, time: f64) {
        self.time = time;
        self.stats.reset();
        if let Some(grid) = self.grid.as_mut() {
            grid.clear_step();
        }
    }

    fn advance(&mut self, dt: f64) {
        if dt.is_finite() && dt > 0.0 {
            self.time += dt;
        }
    }

    fn statistics(&self) -> Option<&StepStatistics> {
        Some(&self.stats)
    }
}

impl ScmTerrain {
    /// Lower the nodes under a wheel footprint to the sunk wheel profile.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn press_footprint(&mut self, query: &WheelQuery, sinkage: f64, length: f64, pressure: f64) {
        let Some(grid) = self.grid.as_mut() else {
            return;
        };
        let (cx, cy) = (query.center.x, query.center.y);
        let r = query.radius;

        // Footprint axes projected onto the ground plane
        let fwd = Vector3::new(query.forward.x, query.forward.y, 0.0)
            .try_normalize(1e-9)
            .unwrap_or_else(Vector3::x);
        let lat = Vector3::new(-fwd.y, fwd.x, 0.0);
        let half_l = 0.5 * length;
        let half_b = 0.5 * query.width;

        let ext_x = half_l * fwd.x.abs() + half_b * lat.x.abs();
        let ext_y = half_l * fwd.y.abs() + half_b * lat.y.abs();
        let Some(((i0, i1), (j0, j1))) = grid
            .level
            .node_range((cx - ext_x, cy - ext_y), (cx + ext_x, cy + ext_y))
        else {
            return;
        };

        let mut ray_casts = 0;
        let mut ray_hits = 0;
        let mut modified = 0;
        for j in j0..=j1 {
            for i in i0..=i1 {
                ray_casts += 1;
                let dx = grid.level.node_x(i) - cx;
                let dy = grid.level.node_y(j) - cy;
                let along = dx * fwd.x + dy * fwd.y;
                let across = dx * lat.x + dy * lat.y;
                if along.abs() > half_l || across.abs() > half_b {
                    continue;
                }
                ray_hits += 1;

                let idx = grid.level.index(i, j);
                grid.mark(idx, NODE_HIT);
                grid.pressure[idx] = pressure;

                let rise = r - (r * r - along * along).max(0.0).sqrt();
                let target = grid.initial.at(idx) - sinkage + rise;
                if target < grid.level.at(idx) {
                    grid.level.set_at(idx, target);
                    if grid.mark(idx, NODE_MODIFIED) {
                        modified += 1;
                    }
                }
            }
        }

        self.stats.ray_casts += ray_casts;
        self.stats.ray_hits += ray_hits;
        self.stats.modified_nodes += modified;
    }
}
