//! Headless deformation run.
//!
//! Drags a brush across the reference plane on the GPU, reads the surface
//! back and logs the peak height plus the diagnostics snapshot. Pass a JSON
//! settings file as the first argument to override the defaults.
//!
//! `RUST_LOG=info cargo run --example headless [settings.json]`

use deformesh::prelude::*;

fn main() -> DeformResult<()> {
    env_logger::init();

    let settings = match std::env::args().nth(1) {
        Some(path) => Settings::load(path)?,
        None => Settings::default(),
    };

    let gpu = GpuContext::headless()?;
    let deformer = GpuDeformer::new(&gpu, settings.deformer)?;
    let mut session = DeformSession::new(deformer, &settings.plane)?;

    // A touch stroke along the middle of the plane, one request per frame.
    let plane = settings.plane;
    let frames = 24;
    for frame in 0..frames {
        let x = plane.width * (0.2 + 0.6 * frame as f32 / (frames - 1) as f32);
        let touch = Vec3::new(x, 0.0, plane.length * 0.5);
        session.submit(DeformRequest::with_brush(touch, Vec3::Y, &settings.brush));
        session.tick()?;
    }

    let positions = session.mesh().read_positions(&gpu)?;
    let peak = positions.iter().map(|p| p[1]).fold(f32::MIN, f32::max);
    log::info!("{} vertices, peak height {peak:.3}", positions.len());

    #[cfg(feature = "diagnostics")]
    log::info!("stats: {}", session.deformer().stats().snapshot_json()?);

    Ok(())
}
