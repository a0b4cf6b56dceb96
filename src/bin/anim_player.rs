//! Headless skinned animation player
//!
//! Loads a skinned M3D model, plays one clip on a number of instances and
//! logs the bone palette the renderer would receive.
//!
//! Usage:
//!     anim_player [OPTIONS] [MODEL]
//!
//! Options:
//!     -c, --config <FILE>     Scene config JSON (model, clip, frame resources)
//!     --clip <NAME>           Clip to play (default from config: Take1)
//!     -n, --frames <N>        Number of frames to simulate (default: 300)
//!     --dt <SECONDS>          Fixed time step; without it frames run in real time
//!     -i, --instances <N>     Number of instances to animate
//!     --list-clips            Print the model's clips and exit
//!     -h, --help              Show this help message

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use skinmesh::asset;
use skinmesh::core::{logging, time::GameTimer};
use skinmesh::scene::{AnimatedScene, InstanceId, SceneConfig};

fn print_help() {
    eprintln!("anim_player - Headless skinned animation player");
    eprintln!();
    eprintln!("Usage: anim_player [OPTIONS] [MODEL]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("    -c, --config <FILE>     Scene config JSON (model, clip, frame resources)");
    eprintln!("    --clip <NAME>           Clip to play (default from config: Take1)");
    eprintln!("    -n, --frames <N>        Number of frames to simulate (default: 300)");
    eprintln!("    --dt <SECONDS>          Fixed time step; without it frames run in real time");
    eprintln!("    -i, --instances <N>     Number of instances to animate");
    eprintln!("    --list-clips            Print the model's clips and exit");
    eprintln!("    -h, --help              Show this help message");
    eprintln!();
    eprintln!("Example:");
    eprintln!("    anim_player --clip Take1 -n 120 --dt 0.016 models/soldier.m3d");
}

#[derive(Debug)]
struct Args {
    config: SceneConfig,
    frames: u32,
    fixed_dt: Option<f32>,
    list_clips: bool,
}

fn value<'a>(args: &'a [String], i: usize, flag: &str) -> Result<&'a str, String> {
    args.get(i)
        .map(String::as_str)
        .ok_or_else(|| format!("Missing value for {}", flag))
}

fn parse_args() -> Result<Args, String> {
    let args: Vec<String> = env::args().skip(1).collect();

    let mut config_path: Option<PathBuf> = None;
    let mut model: Option<PathBuf> = None;
    let mut clip: Option<String> = None;
    let mut instances: Option<usize> = None;
    let mut frames: u32 = 300;
    let mut fixed_dt: Option<f32> = None;
    let mut list_clips = false;

    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "-h" | "--help" => {
                print_help();
                std::process::exit(0);
            }
            "-c" | "--config" => {
                i += 1;
                config_path = Some(PathBuf::from(value(&args, i, "--config")?));
            }
            "--clip" => {
                i += 1;
                clip = Some(value(&args, i, "--clip")?.to_string());
            }
            "-n" | "--frames" => {
                i += 1;
                let raw = value(&args, i, "--frames")?;
                frames = raw.parse().map_err(|_| format!("Invalid frame count: {}", raw))?;
            }
            "--dt" => {
                i += 1;
                let raw = value(&args, i, "--dt")?;
                let dt: f32 = raw.parse().map_err(|_| format!("Invalid dt: {}", raw))?;
                if !(dt.is_finite() && dt >= 0.0) {
                    return Err(format!("Invalid dt: {}", raw));
                }
                fixed_dt = Some(dt);
            }
            "-i" | "--instances" => {
                i += 1;
                let raw = value(&args, i, "--instances")?;
                instances = Some(raw.parse().map_err(|_| format!("Invalid instance count: {}", raw))?);
            }
            "--list-clips" => list_clips = true,
            arg if arg.starts_with('-') => {
                return Err(format!("Unknown option: {}", arg));
            }
            path => {
                if model.is_some() {
                    return Err("Multiple models specified".to_string());
                }
                model = Some(PathBuf::from(path));
            }
        }
        i += 1;
    }

    let mut config = match config_path {
        Some(path) => SceneConfig::load_sync(&path)
            .map_err(|e| format!("Failed to load config {}: {}", path.display(), e))?,
        None => SceneConfig::default(),
    };

    // Command line overrides the config file
    if let Some(model) = model {
        config.model_path = model;
    }
    if let Some(clip) = clip {
        config.clip_name = clip;
    }
    if let Some(instances) = instances {
        config.instance_count = instances;
    }

    if config.model_path.extension().and_then(|e| e.to_str()) != Some(asset::m3d::M3D_FILE_EXTENSION) {
        log::warn!("{} does not have an .m3d extension", config.model_path.display());
    }

    Ok(Args {
        config,
        frames,
        fixed_dt,
        list_clips,
    })
}

fn run(args: &Args) -> skinmesh::core::Result<()> {
    if args.list_clips {
        let model = asset::load_skinned_mesh(&args.config.model_path)?;
        for name in model.skeleton.clip_names() {
            println!(
                "{}: {:.3}s .. {:.3}s",
                name,
                model.skeleton.clip_start_time(name)?,
                model.skeleton.clip_end_time(name)?
            );
        }
        return Ok(());
    }

    let mut scene = AnimatedScene::from_config(&args.config)?;
    log::info!(
        "Playing '{}' on {} instance(s), {} frame resources",
        args.config.clip_name,
        scene.instances().len(),
        scene.frame_resource_count()
    );

    let mut timer = GameTimer::new();
    let mut next_report = 1.0f32;

    for frame in 0..args.frames {
        let dt = match args.fixed_dt {
            Some(dt) => dt,
            None => {
                std::thread::sleep(Duration::from_millis(16));
                timer.tick();
                timer.delta_secs()
            }
        };

        scene.tick(dt)?;

        let elapsed = match args.fixed_dt {
            Some(dt) => dt * (frame + 1) as f32,
            None => timer.total_secs(),
        };
        if elapsed >= next_report {
            next_report += 1.0;
            if let Some(instance) = scene.instance(InstanceId(0)) {
                let root = instance.final_transforms()[0].w_axis.truncate();
                log::info!(
                    "frame {}: clip time {:.3}s, root bone at {:?}",
                    frame,
                    instance.time(),
                    root
                );
            }
        }
    }

    if let Some(ring) = scene.upload_ring(InstanceId(0)) {
        log::info!(
            "Final palette staged in frame slot {} ({} bytes)",
            ring.current_index(),
            ring.current().as_bytes().len()
        );
    }
    Ok(())
}

fn main() {
    logging::init();

    let args = match parse_args() {
        Ok(args) => args,
        Err(e) => {
            eprintln!("Error: {}", e);
            eprintln!();
            print_help();
            std::process::exit(1);
        }
    };

    if let Err(e) = run(&args) {
        log::error!("{}", e);
        std::process::exit(1);
    }
}
