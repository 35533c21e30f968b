use flume::{ Receiver, Sender };
use log::info;
use rand::{ Rng, RngCore, SeedableRng };
use rand_xorshift::XorShiftRng;

use crate::bvh::Bvh;
use crate::image::Image;
use crate::scene::Scene;
use crate::tracer::Tracer;
use crate::types::V3;

// Small chunks keep the queue busy when per-pixel cost varies wildly
// across the image (mirrors, glass, dense geometry).
const ROWS_PER_CHUNK: usize = 4;

const PROGRESS_ROWS: usize = 50;

pub struct RenderSettings {
    /// Jittered rays per pixel.
    pub pixel_samples: u32,
    /// Shadow rays per light per shading point.
    pub shadow_samples: u32,
    /// Sample the shutter interval and lens disk for each ray.
    pub use_effects: bool,
    /// Worker thread count.
    pub threads: usize,
}

impl Default for RenderSettings {
    fn default() -> RenderSettings {
        RenderSettings {
            pixel_samples: 8,
            shadow_samples: 1,
            use_effects: false,
            threads: std::thread::available_parallelism().map(|n| n.get()).unwrap_or(1),
        }
    }
}

/// A contiguous band of image rows; the unit of work handed to workers.
#[derive(Clone)]
struct RowChunk {
    start: usize,
    rows: usize,
}

fn row_chunks(height: usize) -> Vec<RowChunk> {
    (0..height)
        .step_by(ROWS_PER_CHUNK)
        .map(|start| RowChunk { start, rows: usize::min(ROWS_PER_CHUNK, height - start) })
        .collect()
}

/// Renders the scene into a fresh image buffer.
///
/// Row chunks are distributed over worker threads through a shared queue;
/// each worker owns a PRNG seeded from entropy XOR'd with its index, so
/// renders are stochastic rather than bit-reproducible. The scene and BVH
/// are shared read-only; finished chunks flow back to this thread, which is
/// the only writer of the image buffer.
pub fn render(scene: &Scene, accel: Option<&Bvh>, settings: &RenderSettings) -> Image {
    let width = scene.camera.res_x;
    let height = scene.camera.res_y;
    let mut image = Image::new(width, height);

    let tracer = Tracer::new(scene, accel, settings.shadow_samples);

    let (work_sender, work_receiver) = flume::unbounded::<RowChunk>();
    let (result_sender, result_receiver) = flume::unbounded::<(RowChunk, Vec<V3>)>();
    for chunk in row_chunks(height) {
        // The receiver outlives this loop, so the send cannot fail
        let _ = work_sender.send(chunk);
    }
    drop(work_sender);

    std::thread::scope(|scope| {
        for worker_index in 0..usize::max(settings.threads, 1) {
            let work_receiver: Receiver<RowChunk> = work_receiver.clone();
            let result_sender: Sender<(RowChunk, Vec<V3>)> = result_sender.clone();
            let tracer = &tracer;
            scope.spawn(move || {
                let seed = rand::random::<u64>() ^ worker_index as u64;
                let mut rng = XorShiftRng::seed_from_u64(seed);
                for chunk in work_receiver.into_iter() {
                    let pixels = render_chunk(tracer, settings, width, &chunk, &mut rng);
                    if result_sender.send((chunk, pixels)).is_err() {
                        // Collector is gone; nothing left to do
                        return;
                    }
                }
            });
        }
        drop(result_sender);

        // Collect finished chunks; this is the only image writer
        let mut rows_done = 0;
        let mut next_report = PROGRESS_ROWS;
        for (chunk, pixels) in result_receiver.into_iter() {
            for (i, &color) in pixels.iter().enumerate() {
                image.set_pixel(i % width, chunk.start + i / width, color);
            }
            rows_done += chunk.rows;
            while rows_done >= next_report {
                info!("rendered {rows_done}/{height} rows");
                next_report += PROGRESS_ROWS;
            }
        }
    });

    image
}

fn render_chunk(
    tracer: &Tracer,
    settings: &RenderSettings,
    width: usize,
    chunk: &RowChunk,
    rng: &mut dyn RngCore,
) -> Vec<V3> {
    let camera = &tracer.scene.camera;
    let mut pixels = Vec::with_capacity(chunk.rows * width);
    for y in chunk.start..(chunk.start + chunk.rows) {
        for x in 0..width {
            let mut sum = V3::ZERO;
            for _ in 0..settings.pixel_samples {
                // Jitter the sample point across the pixel footprint
                let px = x as f64 + rng.random::<f64>() - 0.5;
                let py = y as f64 + rng.random::<f64>() - 0.5;
                let ray = if settings.use_effects {
                    let time_offset = camera.get_time_offset(rng);
                    let lens_pos = camera.sample_lens_position(rng);
                    camera.pixel_to_ray_with_effects(px, py, time_offset, lens_pos)
                } else {
                    camera.pixel_to_ray(px, py)
                };
                sum = sum + tracer.trace(&ray, 0, rng);
            }
            pixels.push(sum / settings.pixel_samples as f64);
        }
    }
    pixels
}
