//! sightline CLI - visibility estimation for scene documents
//!
//! Reads a JSON scene, builds an intersection oracle and prints how much of
//! the target object the camera can see.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::info;
use rand::rngs::StdRng;
use rand::SeedableRng;
use sightline_core::{estimate_visibility, EstimatorSettings};
use sightline_ir::Scene;
use std::fs;
use std::path::{Path, PathBuf};

mod backend;

use backend::{build_oracle, Backend, ColliderArg};

#[derive(Parser)]
#[command(name = "sightline")]
#[command(about = "Monte Carlo surface-visibility estimation", long_about = None)]
struct Cli {
    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Estimate how much of the target is visible
    Estimate {
        /// Scene document (.json)
        scene: PathBuf,
        /// Estimator settings (.toml)
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Samples per cycle (overrides the config)
        #[arg(short = 'n', long)]
        samples: Option<usize>,
        /// Number of evaluation cycles
        #[arg(long, default_value_t = 1)]
        frames: usize,
        /// Random seed (default: from entropy)
        #[arg(long)]
        seed: Option<u64>,
        /// Intersection backend
        #[arg(long, value_enum, default_value_t = Backend::Mesh)]
        backend: Backend,
        /// Collider proxy for the physics backend
        #[arg(long, value_enum, default_value_t = ColliderArg::Trimesh)]
        collider: ColliderArg,
        /// Record one debug ray per sample
        #[arg(long)]
        draw_rays: bool,
        /// Run the ray queries on all cores
        #[arg(long)]
        parallel: bool,
        /// Print each report as JSON
        #[arg(long)]
        json: bool,
    },
    /// Display information about a scene document
    Info {
        /// Scene document (.json)
        scene: PathBuf,
    },
}

/// Command-line overrides applied on top of the config file.
#[derive(Debug, Default)]
struct Overrides {
    samples: Option<usize>,
    draw_rays: bool,
    parallel: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Estimate {
            scene,
            config,
            samples,
            frames,
            seed,
            backend,
            collider,
            draw_rays,
            parallel,
            json,
        } => {
            let overrides = Overrides {
                samples,
                draw_rays,
                parallel,
            };
            let settings = load_settings(config.as_deref(), &overrides)?;
            run_estimate(&scene, &settings, frames, seed, backend, collider, json)?;
        }
        Commands::Info { scene } => {
            show_info(&scene)?;
        }
    }

    Ok(())
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
}

fn read_scene(path: &Path) -> Result<Scene> {
    let json = fs::read_to_string(path)
        .with_context(|| format!("reading scene {}", path.display()))?;
    Scene::from_json(&json).with_context(|| format!("loading scene {}", path.display()))
}

fn load_settings(config: Option<&Path>, overrides: &Overrides) -> Result<EstimatorSettings> {
    let text = match config {
        Some(path) => Some(
            fs::read_to_string(path)
                .with_context(|| format!("reading config {}", path.display()))?,
        ),
        None => None,
    };
    parse_settings(text.as_deref(), overrides)
}

fn parse_settings(toml_text: Option<&str>, overrides: &Overrides) -> Result<EstimatorSettings> {
    let mut settings: EstimatorSettings = match toml_text {
        Some(text) => toml::from_str(text).context("parsing estimator settings")?,
        None => EstimatorSettings::default(),
    };
    if let Some(samples) = overrides.samples {
        settings.sample_count = samples;
    }
    settings.draw_rays |= overrides.draw_rays;
    settings.parallel |= overrides.parallel;
    settings.validate()?;
    Ok(settings)
}

fn run_estimate(
    path: &Path,
    settings: &EstimatorSettings,
    frames: usize,
    seed: Option<u64>,
    backend: Backend,
    collider: ColliderArg,
    json: bool,
) -> Result<()> {
    let scene = read_scene(path)?;
    let resolved = scene.resolve()?;
    let oracle = build_oracle(&resolved, backend, collider)?;
    info!(
        "{} objects, target {} ({} triangles), backend {:?}",
        resolved.objects.len(),
        scene.target,
        resolved.target_mesh.num_triangles(),
        backend
    );

    let mut rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    for frame in 0..frames {
        let report = estimate_visibility(
            &resolved.target_mesh,
            &resolved.target_transform,
            resolved.target,
            &resolved.viewpoint,
            settings,
            oracle.as_ref(),
            &mut rng,
        )
        .with_context(|| format!("estimating frame {frame}"))?;

        if json {
            println!("{}", serde_json::to_string(&report)?);
        } else {
            println!("{}: {}", scene.target, report.label());
        }
    }

    Ok(())
}

fn show_info(path: &Path) -> Result<()> {
    let scene = read_scene(path)?;

    println!("sightline scene: {}", path.display());
    println!("  Version: {}", scene.version);
    println!("  Target: {}", scene.target);
    println!(
        "  Camera: eye {:?} looking at {:?}",
        scene.camera.eye, scene.camera.target
    );
    println!("  Objects: {}", scene.objects.len());

    let mut total_tris = 0;
    println!("\nObjects:");
    for object in &scene.objects {
        let mesh = object.geometry.to_mesh();
        total_tris += mesh.num_triangles();
        println!(
            "  {}: {} triangles, {} vertices",
            object.id,
            mesh.num_triangles(),
            mesh.num_vertices()
        );
    }
    println!("\nTotal triangles: {}", total_tris);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use sightline_core::SamplingStrategy;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parse_estimate_flags() {
        let cli = Cli::parse_from([
            "sightline",
            "-v",
            "estimate",
            "scene.json",
            "-n",
            "200",
            "--backend",
            "physics",
            "--collider",
            "convex-hull",
            "--json",
        ]);
        assert_eq!(cli.verbose, 1);
        match cli.command {
            Commands::Estimate {
                samples,
                backend,
                collider,
                json,
                frames,
                ..
            } => {
                assert_eq!(samples, Some(200));
                assert_eq!(backend, Backend::Physics);
                assert_eq!(collider, ColliderArg::ConvexHull);
                assert!(json);
                assert_eq!(frames, 1);
            }
            Commands::Info { .. } => panic!("expected estimate"),
        }
    }

    #[test]
    fn settings_from_toml_with_overrides() {
        let text = r#"
            sample_count = 80
            sampling = "index_remap"
            triangle_bounds_size = 2.5
        "#;
        let overrides = Overrides {
            samples: Some(120),
            draw_rays: true,
            parallel: false,
        };
        let settings = parse_settings(Some(text), &overrides).unwrap();
        assert_eq!(settings.sample_count, 120);
        assert_eq!(settings.sampling, SamplingStrategy::IndexRemap);
        assert_eq!(settings.triangle_bounds_size, 2.5);
        assert!(settings.draw_rays);
        assert!(!settings.parallel);
    }

    #[test]
    fn invalid_settings_rejected() {
        let overrides = Overrides {
            samples: Some(0),
            ..Default::default()
        };
        assert!(parse_settings(None, &overrides).is_err());
        assert!(parse_settings(Some("sample_count = \"many\""), &Overrides::default()).is_err());
    }
}
