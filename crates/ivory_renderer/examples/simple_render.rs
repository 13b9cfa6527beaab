//! Simple path tracer example.
//!
//! Renders the three-sphere scene sequentially and in parallel, then saves
//! the parallel result as a PNG preview.

use std::path::Path;

use ivory_renderer::{render, scenes, Camera, ExecutionMode, FileSink, ImageSink, Vec3};

fn main() {
    println!("Ivory Path Tracer - Simple Example");
    println!("==================================");

    let world = scenes::three_spheres();

    let mut camera = Camera::new()
        .with_image(400, 16.0 / 9.0)
        .with_quality(32, 10)
        .with_position(
            Vec3::new(-2.0, 2.0, 1.0),  // look_from
            Vec3::new(0.0, 0.0, -1.0),  // look_at
            Vec3::new(0.0, 1.0, 0.0),   // vup
        )
        .with_lens(20.0, 10.0, 3.4);

    for mode in [ExecutionMode::Sequential, ExecutionMode::Parallel] {
        let start = std::time::Instant::now();
        let frames = render(&mut camera, &world, mode, 7).expect("valid camera settings");
        println!("{:?}: rendered in {:?}, mean {}", mode, start.elapsed(), frames.main.mean());

        if mode == ExecutionMode::Parallel {
            let filename = Path::new("simple_render.png");
            match FileSink.write(&frames.main, filename) {
                Ok(()) => println!("Saved to {}", filename.display()),
                Err(e) => eprintln!("Failed to save image: {e}"),
            }
        }
    }
}
