//! Software top-down renderer.
//!
//! Draws the terrain under a chase camera (false-coloured by sinkage when the
//! terrain plots it, hill-shaded otherwise), the chassis footprint through
//! the wheel centres, a heading line and one marker per wheel. Frames are
//! saved with `image::save_buffer`; the format follows the file extension.

// Pixel coordinates fit comfortably in f64 and back
#![allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_possible_wrap
)]

use std::path::Path;

use image::ExtendedColorType;
use nalgebra::Vector3;
use sim_types::DriverInputs;
use tracing::debug;

use crate::backend::{Backend, Capabilities};
use crate::camera::{ChaseCamera, Viewport};
use crate::error::{Result, VisError};
use crate::scene::Scene;
use crate::{VisualSystem, keep_running};

type Rgb = [u8; 3];

const BACKGROUND: Rgb = [40, 40, 48];
const SOIL: Rgb = [176, 150, 110];
const CHASSIS: Rgb = [230, 120, 20];
const HEADING: Rgb = [250, 250, 250];
const WHEEL_CONTACT: Rgb = [20, 20, 20];
const WHEEL_AIRBORNE: Rgb = [235, 235, 235];

/// Wheel marker radius (m).
const WHEEL_MARKER: f64 = 0.3;
/// Heading line length (m).
const HEADING_LENGTH: f64 = 2.5;

/// Software renderer with an RGB framebuffer.
#[derive(Debug, Clone)]
pub struct RasterVisual {
    width: u32,
    height: u32,
    camera: ChaseCamera,
    end_time: Option<f64>,
    time: f64,
    inputs: DriverInputs,
    pixels: Vec<u8>,
    frames: u64,
    in_scene: bool,
}

impl RasterVisual {
    /// Renderer producing `width` x `height` frames.
    pub fn new(width: u32, height: u32, camera: ChaseCamera, end_time: Option<f64>) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(VisError::invalid_config(format!(
                "image size must be non-zero, got {width}x{height}"
            )));
        }
        if !(camera.view_width.is_finite() && camera.view_width > 0.0) {
            return Err(VisError::invalid_config(format!(
                "view width must be positive, got {}",
                camera.view_width
            )));
        }
        let mut vis = Self {
            width,
            height,
            camera,
            end_time,
            time: 0.0,
            inputs: DriverInputs::ZERO,
            pixels: vec![0; width as usize * height as usize * 3],
            frames: 0,
            in_scene: false,
        };
        vis.clear();
        Ok(vis)
    }

    /// Frame size in pixels.
    #[must_use]
    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// RGB framebuffer, row-major from the top-left pixel.
    #[must_use]
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// Color of pixel `(x, y)`.
    #[must_use]
    pub fn pixel(&self, x: u32, y: u32) -> Option<Rgb> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = (y as usize * self.width as usize + x as usize) * 3;
        Some([self.pixels[i], self.pixels[i + 1], self.pixels[i + 2]])
    }

    /// Completed frames.
    #[must_use]
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Visual time.
    #[must_use]
    pub fn time(&self) -> f64 {
        self.time
    }

    /// Inputs received at the last synchronize.
    #[must_use]
    pub fn inputs(&self) -> DriverInputs {
        self.inputs
    }

    fn clear(&mut self) {
        for px in self.pixels.chunks_exact_mut(3) {
            px.copy_from_slice(&BACKGROUND);
        }
    }

    fn put(&mut self, x: i64, y: i64, color: Rgb) {
        if x < 0 || y < 0 || x >= i64::from(self.width) || y >= i64::from(self.height) {
            return;
        }
        let i = (y as usize * self.width as usize + x as usize) * 3;
        self.pixels[i..i + 3].copy_from_slice(&color);
    }

    fn draw_terrain(&mut self, view: &Viewport, scene: &Scene<'_>) {
        let terrain = scene.terrain;
        let extent = terrain.extent();
        let plot = terrain.sinkage_plot_range();
        let light = Vector3::new(-0.4, 0.4, 0.82).normalize();

        for py in 0..self.height {
            for px in 0..self.width {
                let (x, y) = view.to_world(px, py);
                if let Some(((x0, y0), (x1, y1))) = extent {
                    if x < x0 || x > x1 || y < y0 || y > y1 {
                        continue;
                    }
                }
                let base = match plot {
                    Some((lo, hi)) if hi > lo => {
                        false_color((terrain.sinkage(x, y) - lo) / (hi - lo))
                    }
                    _ => SOIL,
                };
                let shade = 0.55 + 0.45 * terrain.normal(x, y).dot(&light).max(0.0);
                self.put(i64::from(px), i64::from(py), scaled(base, shade));
            }
        }
    }

    fn draw_vehicle(&mut self, view: &Viewport, scene: &Scene<'_>) {
        let vehicle = scene.vehicle;
        let pixel = |x: f64, y: f64| {
            let (px, py) = view.to_pixel(x, y);
            (px.round() as i64, py.round() as i64)
        };

        // Chassis outline: left wheels front to back, then right wheels back to front
        let left: Vec<_> = vehicle.wheels.iter().step_by(2).collect();
        let right: Vec<_> = vehicle.wheels.iter().skip(1).step_by(2).collect();
        let outline: Vec<(i64, i64)> = left
            .iter()
            .chain(right.iter().rev())
            .map(|w| pixel(w.center.x, w.center.y))
            .collect();
        for (i, &a) in outline.iter().enumerate() {
            let b = outline[(i + 1) % outline.len()];
            self.line(a, b, CHASSIS);
        }

        let p = vehicle.position();
        let tip = p + vehicle.forward() * HEADING_LENGTH;
        self.line(pixel(p.x, p.y), pixel(tip.x, tip.y), HEADING);

        let r = (WHEEL_MARKER / view.scale()).max(1.0);
        for wheel in &vehicle.wheels {
            let color = if wheel.in_contact {
                WHEEL_CONTACT
            } else {
                WHEEL_AIRBORNE
            };
            let (cx, cy) = view.to_pixel(wheel.center.x, wheel.center.y);
            self.disc(cx, cy, r, color);
        }
    }

    fn line(&mut self, (mut x0, mut y0): (i64, i64), (x1, y1): (i64, i64), color: Rgb) {
        let dx = (x1 - x0).abs();
        let dy = -(y1 - y0).abs();
        let sx = if x0 < x1 { 1 } else { -1 };
        let sy = if y0 < y1 { 1 } else { -1 };
        let mut err = dx + dy;
        // Clip runaway lines from wildly off-screen endpoints
        let limit = 4 * i64::from(self.width.max(self.height));
        for _ in 0..=limit {
            self.put(x0, y0, color);
            if x0 == x1 && y0 == y1 {
                break;
            }
            let e2 = 2 * err;
            if e2 >= dy {
                err += dy;
                x0 += sx;
            }
            if e2 <= dx {
                err += dx;
                y0 += sy;
            }
        }
    }

    fn disc(&mut self, cx: f64, cy: f64, r: f64, color: Rgb) {
        let (x0, x1) = ((cx - r).floor() as i64, (cx + r).ceil() as i64);
        let (y0, y1) = ((cy - r).floor() as i64, (cy + r).ceil() as i64);
        for y in y0..=y1 {
            for x in x0..=x1 {
                let (dx, dy) = (x as f64 - cx, y as f64 - cy);
                if dx * dx + dy * dy <= r * r {
                    self.put(x, y, color);
                }
            }
        }
    }
}

/// Blue-cyan-green-yellow-red ramp over `t` in `[0, 1]`.
fn false_color(t: f64) -> Rgb {
    const STOPS: [Rgb; 5] = [
        [0, 0, 255],
        [0, 255, 255],
        [0, 255, 0],
        [255, 255, 0],
        [255, 0, 0],
    ];
    let t = if t.is_finite() { t.clamp(0.0, 1.0) } else { 0.0 };
    let pos = t * (STOPS.len() - 1) as f64;
    let i = (pos.floor() as usize).min(STOPS.len() - 2);
    let w = pos - i as f64;
    let (a, b) = (STOPS[i], STOPS[i + 1]);
    std::array::from_fn(|k| (f64::from(a[k]) + (f64::from(b[k]) - f64::from(a[k])) * w).round() as u8)
}

fn scaled(color: Rgb, factor: f64) -> Rgb {
    color.map(|c| (f64::from(c) * factor).round().clamp(0.0, 255.0) as u8)
}

impl VisualSystem for RasterVisual {
    fn backend(&self) -> Backend {
        Backend::Raster
    }

    fn capabilities(&self) -> Capabilities {
        Backend::Raster.capabilities()
    }

    fn initialize(&mut self) {
        self.time = 0.0;
        self.frames = 0;
        self.in_scene = false;
        self.clear();
        debug!(
            width = self.width,
            height = self.height,
            view_width = self.camera.view_width,
            "raster visual system initialized"
        );
    }

    fn run(&self) -> bool {
        keep_running(self.time, self.end_time)
    }

    fn begin_scene(&mut self) {
        self.clear();
        self.in_scene = true;
    }

    fn render(&mut self, scene: &Scene<'_>) {
        let target = self.camera.target(scene.vehicle);
        let view = Viewport::new(
            target.x,
            target.y,
            self.camera.view_width,
            self.width,
            self.height,
        );
        self.draw_terrain(&view, scene);
        if !scene.vehicle.wheels.is_empty() {
            self.draw_vehicle(&view, scene);
        }
    }

    fn end_scene(&mut self) {
        if self.in_scene {
            self.frames += 1;
            self.in_scene = false;
        }
    }

    fn write_image(&mut self, path: &Path) -> Result<()> {
        image::save_buffer(path, &self.pixels, self.width, self.height, ExtendedColorType::Rgb8)
            .map_err(|source| VisError::Image {
                path: path.to_path_buf(),
                source,
            })?;
        debug!(path = %path.display(), time = self.time, "frame written");
        Ok(())
    }

    fn synchronize(&mut self, time: f64, inputs: &DriverInputs) {
        self.time = time;
        self.inputs = *inputs;
    }

    fn advance(&mut self, dt: f64) {
        if dt.is_finite() && dt > 0.0 {
            self.time += dt;
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use nalgebra::{Isometry3, Point3};
    use sim_terrain::{PatchType, RigidTerrain, ScmTerrain, SoilParameters, Terrain, WheelQuery};
    use sim_types::{VehicleState, WheelState};

    fn vehicle_at_origin() -> VehicleState {
        let wheel = |x: f64, y: f64| WheelState {
            center: Point3::new(x, y, 0.47),
            in_contact: true,
            ..WheelState::default()
        };
        VehicleState {
            pose: Isometry3::translation(0.0, 0.0, 0.6),
            wheels: vec![wheel(1.7, 0.9), wheel(1.7, -0.9), wheel(-1.7, 0.9), wheel(-1.7, -0.9)],
            ..VehicleState::default()
        }
    }

    #[test]
    fn test_rejects_empty_frame() {
        assert!(RasterVisual::new(0, 10, ChaseCamera::default(), None).is_err());
        let camera = ChaseCamera::default().with_view_width(0.0);
        assert!(RasterVisual::new(10, 10, camera, None).is_err());
    }

    #[test]
    fn test_false_color_ramp() {
        assert_eq!(false_color(0.0), [0, 0, 255]);
        assert_eq!(false_color(1.0), [255, 0, 0]);
        assert_eq!(false_color(0.5), [0, 255, 0]);
        assert_eq!(false_color(f64::NAN), [0, 0, 255]);
        assert_eq!(false_color(7.0), [255, 0, 0]);
    }

    #[test]
    fn test_draws_wheels_and_ground() {
        let mut vis = RasterVisual::new(80, 60, ChaseCamera::default(), None).unwrap();
        let terrain = RigidTerrain::flat(0.0);
        let state = vehicle_at_origin();
        vis.begin_scene();
        vis.render(&Scene::new(&state, &terrain));
        vis.end_scene();
        assert_eq!(vis.frames(), 1);

        // Front-left wheel at (1.7, 0.9) with 0.2 m pixels
        let view = Viewport::new(0.0, 0.0, 16.0, 80, 60);
        let (px, py) = view.to_pixel(1.7, 0.9);
        assert_eq!(
            vis.pixel(px.round() as u32, py.round() as u32),
            Some(WHEEL_CONTACT)
        );
        // Corner pixel is flat lit soil, not background
        let corner = vis.pixel(0, 0).unwrap();
        assert_ne!(corner, BACKGROUND);
    }

    #[test]
    fn test_sinkage_is_false_coloured() {
        let mut terrain = ScmTerrain::new(SoilParameters::default()).unwrap();
        terrain
            .initialize(
                &PatchType::Flat {
                    size_x: 8.0,
                    size_y: 8.0,
                },
                0.05,
            )
            .unwrap();
        terrain.synchronize(0.0);
        terrain.begin_contacts(&[Isometry3::identity()]);
        let query = WheelQuery::at(Point3::new(0.0, 0.0, 0.46), 0.47, 0.3).with_load(8000.0);
        terrain.contact(&query).unwrap();
        terrain.end_contacts();

        let mut vis = RasterVisual::new(40, 40, ChaseCamera::default().with_view_width(4.0), None)
            .unwrap();
        let state = VehicleState::default();
        vis.begin_scene();
        vis.render(&Scene::new(&state, &terrain));
        vis.end_scene();

        // Rut in the middle is warmer (more red) than untouched soil at the edge
        let rut = vis.pixel(20, 20).unwrap();
        let untouched = vis.pixel(0, 0).unwrap();
        assert!(rut[0] > untouched[0] || rut[1] > untouched[1], "{rut:?} vs {untouched:?}");
        assert!(untouched[2] > untouched[0]);
    }

    #[test]
    fn test_write_jpeg() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("img_001.jpg");
        let mut vis = RasterVisual::new(32, 24, ChaseCamera::default(), None).unwrap();
        vis.write_image(&path).unwrap();

        let img = image::open(&path).unwrap();
        assert_eq!((img.width(), img.height()), (32, 24));

        let err = vis.write_image(&dir.path().join("missing/img.jpg")).unwrap_err();
        assert!(matches!(err, VisError::Image { .. }));
    }
}
