#![allow(clippy::cast_precision_loss, clippy::cast_possible_wrap)]
//! Sweeps a cursor across a camera view of a small scene and prints what is
//! under it.
//!
//! Run with `RUST_LOG=debug` to see per-query statistics. An optional first
//! argument names a JSON file with picking options.

use raypick::{
    Aabb, Camera, Mat4, PickResult, PickingOptions, RayCaster, Scene, ScreenRayPicker, TriangleMesh,
    Vec2, Vec3, VertexBuffer,
};

/// Textured quad spanning [-1, 1]² at z = 0.
fn textured_quad() -> Result<TriangleMesh, Box<dyn std::error::Error>> {
    let positions = vec![
        Vec3::new(-1.0, -1.0, 0.0),
        Vec3::new(1.0, -1.0, 0.0),
        Vec3::new(1.0, 1.0, 0.0),
        Vec3::new(-1.0, 1.0, 0.0),
    ];
    let uvs = vec![
        Vec2::new(0.0, 0.0),
        Vec2::new(2.0, 0.0),
        Vec2::new(2.0, 2.0),
        Vec2::new(0.0, 2.0),
    ];
    let vertices = VertexBuffer::new(positions).with_tex_coords(uvs)?;
    Ok(TriangleMesh::from_triangles(vertices, vec![[0, 1, 2], [0, 2, 3]])?)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let options = match std::env::args().nth(1) {
        Some(path) => PickingOptions::load(path)?,
        None => PickingOptions::default(),
    };

    let mut scene = Scene::new();
    let root = scene.root();

    // A floor and a tilted panel inside a moved sub-container.
    let floor = scene.add_mesh(
        root,
        "floor",
        Mat4::from_translation(Vec3::new(0.0, -1.0, 0.0))
            * Mat4::from_rotation_x(-std::f32::consts::FRAC_PI_2)
            * Mat4::from_scale(Vec3::splat(4.0)),
        textured_quad()?,
    )?;
    let stage = scene.add_container(
        root,
        "stage",
        Mat4::from_translation(Vec3::new(0.5, 0.0, 0.0)),
    )?;
    let panel = scene.add_mesh(stage, "panel", Mat4::from_rotation_y(0.4), textured_quad()?)?;

    let bounds = Aabb::from_points(
        [floor, panel]
            .into_iter()
            .filter_map(|node| scene.world_aabb(node))
            .flat_map(|b| [b.min, b.max]),
    )
    .ok_or("scene has no bounds")?;
    let mut camera = Camera::new(glam::UVec2::new(64, 32));
    camera.frame(&bounds);
    let viewport = camera.viewport;
    let camera = scene.add_camera(root, "camera", camera)?;

    let mut picker = ScreenRayPicker::with_caster(RayCaster::new().with_options(options));
    picker.set_camera(&scene, Some(camera));

    let mut result = PickResult::new();
    let y = viewport.y as i32 / 2;
    for x in (0..viewport.x as i32).step_by(8) {
        let cursor = glam::IVec2::new(x, y);
        if !picker.pick_at_point_default(&scene, &mut result, cursor) {
            println!("{cursor}: nothing");
            continue;
        }
        let name = result
            .hit_object()
            .and_then(|node| scene.node_name(node))
            .unwrap_or("?");
        let uv = result.wrapped_texture_coordinate(&scene, 0);
        println!(
            "{cursor}: {name} triangle {} at {} (distance {:.3}, uv {uv:?})",
            result.triangle_index(),
            result.reference_point(),
            result.distance().unwrap_or_default(),
        );
    }

    Ok(())
}
