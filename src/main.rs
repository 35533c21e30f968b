mod logger;

use std::io::Write;
use std::path::PathBuf;
use std::process;
use std::time::Instant;

use clap::Parser;
use log::{ error, info };
use prism_impl::bvh::Bvh;
use prism_impl::render::{ render, RenderSettings };
use prism_impl::scene::Scene;

/// Offline Whitted ray tracer with distributed sampling effects.
#[derive(Parser, Debug)]
#[command(name = "prism", version, about = "Renders a scene description to a PPM image")]
struct Cli {
    /// Scene description file
    #[arg(default_value = "../ASCII/scene.txt")]
    scene: PathBuf,

    /// Output directory for the rendered image
    #[arg(long, default_value = "../Output")]
    out_dir: PathBuf,

    /// Accelerate ray queries with a bounding volume hierarchy (the default)
    #[arg(long)]
    bvh: bool,

    /// Intersect by scanning every primitive instead of building a BVH
    #[arg(long, overrides_with = "bvh")]
    no_bvh: bool,

    /// Enable thin-lens depth of field and shutter motion blur
    #[arg(long, visible_alias = "mb")]
    motion_blur: bool,

    /// Enable distributed soft-shadow sampling
    #[arg(long, visible_alias = "dist")]
    distributed: bool,

    /// Shadow rays per light, used with --distributed
    #[arg(long, default_value_t = 4)]
    shadow_samples: u32,

    /// Jittered rays per pixel
    #[arg(long, default_value_t = 8)]
    samples: u32,

    /// Worker thread count (default: all cores)
    #[arg(long)]
    threads: Option<usize>,
}

fn main() {
    logger::init().expect("logger already installed");

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            // clap renders help/version/usage output itself
            let _ = err.print();
            process::exit(if err.use_stderr() { 1 } else { 0 });
        }
    };

    if let Err(err) = run(cli) {
        error!("render failed: {err}");
        process::exit(-1);
    }
}

type BoxError = Box<dyn std::error::Error + 'static>;

fn run(cli: Cli) -> Result<(), BoxError> {
    let use_bvh = cli.bvh || !cli.no_bvh;

    let scene = prism_scene::load_scene(&cli.scene)?;

    let bvh = if use_bvh {
        let bvh = Bvh::build(&scene.objects);
        info!("bvh ready: {} nodes over {} primitives", bvh.node_count(), scene.objects.len());
        Some(bvh)
    } else {
        info!("bvh disabled, using linear scans");
        None
    };

    let settings = RenderSettings {
        pixel_samples: cli.samples,
        shadow_samples: if cli.distributed { cli.shadow_samples } else { 1 },
        use_effects: cli.motion_blur,
        threads: cli.threads.unwrap_or_else(default_threads),
    };

    info!(
        "rendering {}x{} at {} samples/pixel on {} threads",
        scene.camera.res_x, scene.camera.res_y, settings.pixel_samples, settings.threads
    );

    let start = Instant::now();
    let image = render(&scene, bvh.as_ref(), &settings);
    info!("render finished in {:.2}s", start.elapsed().as_secs_f64());

    std::fs::create_dir_all(&cli.out_dir)?;
    let out_path = cli.out_dir.join(output_name(&cli, &scene, &settings, use_bvh));
    let mut out = std::io::BufWriter::new(std::fs::File::create(&out_path)?);
    prism_scene::ppm::write_ppm(&image, &mut out)?;
    out.flush()?;
    info!("wrote {}", out_path.display());

    Ok(())
}

fn default_threads() -> usize {
    std::thread::available_parallelism().map(|n| n.get()).unwrap_or(1)
}

fn output_name(cli: &Cli, scene: &Scene, settings: &RenderSettings, use_bvh: bool) -> String {
    let mut name = String::from("render_");
    name.push_str(if use_bvh { "bvh" } else { "linear" });
    if cli.motion_blur {
        name.push_str("_mb");
    }
    if cli.distributed {
        name.push_str(&format!("_dist{}", settings.shadow_samples));
    }
    name.push_str(&format!(
        "_{}x{}s{}.ppm",
        scene.camera.res_x, scene.camera.res_y, settings.pixel_samples
    ));
    name
}
