use anyhow::Context as _;
use clap::{Parser, Subcommand};
use glam::Vec2;
use stagecraft_assets::{AssetLoader, load_model};
use stagecraft_demo::SceneConfig;
use stagecraft_render::{DebugTextRenderer, Renderer, place_labels};
use stagecraft_scene::{FixedAdvance, Label, TextureHandle};
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "stagecraft-cli", about = "CLI tool for the stagecraft demo scene")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Directory textures and models are loaded from
    #[arg(long, default_value = "./assets", global = true)]
    assets: PathBuf,

    /// YAML file overriding the scene constants
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print crate version info
    Info,
    /// Build the demo scene and print it
    Dump {
        /// Frames to advance before printing
        #[arg(short, long, default_value = "0")]
        frames: u32,
        /// Seconds to wait for asset loads before printing
        #[arg(short, long, default_value = "0", value_parser = parse_wait)]
        wait: Duration,
    },
    /// Print the effective scene config as YAML
    Config,
    /// Load an OBJ/MTL pair and summarize it
    InspectModel {
        obj: PathBuf,
        /// MTL file; defaults to the OBJ path with an .mtl extension
        #[arg(long)]
        mtl: Option<PathBuf>,
    },
    /// Size a label canvas for some text
    Label {
        text: String,
        #[arg(long, default_value = "150")]
        base_width: f32,
        #[arg(long, default_value = "32")]
        size: f32,
    },
    /// Project the demo labels into a viewport
    Labels {
        #[arg(long, default_value = "1280")]
        width: f32,
        #[arg(long, default_value = "720")]
        height: f32,
    },
}

const MAX_WAIT_SECS: f32 = 3600.0;

/// Seconds as a finite, non-negative duration, capped at an hour.
fn parse_wait(arg: &str) -> Result<Duration, String> {
    let secs: f32 = arg.parse().map_err(|e| format!("{e}"))?;
    if !secs.is_finite() || secs < 0.0 {
        return Err(format!("{arg} is not a non-negative number of seconds"));
    }
    Ok(Duration::from_secs_f32(secs.min(MAX_WAIT_SECS)))
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    match cli.command {
        Commands::Info => {
            println!("stagecraft-cli v{}", env!("CARGO_PKG_VERSION"));
            println!("assets root: {}", cli.assets.display());
        }
        Commands::Dump { frames, wait } => {
            let config = SceneConfig::load(cli.config.as_deref())?;
            let mut loader = AssetLoader::new(&cli.assets);
            let mut demo = stagecraft_demo::build(&config, &mut loader);

            let deadline = Instant::now() + wait;
            let mut loaded = 0usize;
            while let Some(event) = loader.recv_timeout(deadline.saturating_duration_since(Instant::now())) {
                demo.on_load_event(event);
                loaded += 1;
            }
            tracing::debug!(loaded, "asset events applied");

            // fixed display size, so ticking only spins and damps
            let display = (300, 150);
            let mut buffer = display;
            for _ in 0..frames {
                demo.tick(&mut buffer, display);
            }
            print!("{}", DebugTextRenderer::new().render(&demo.scene, &demo.camera));
        }
        Commands::Config => {
            let config = SceneConfig::load(cli.config.as_deref())?;
            print!("{}", config.to_yaml()?);
        }
        Commands::InspectModel { obj, mtl } => {
            let mtl = mtl.unwrap_or_else(|| obj.with_extension("mtl"));
            let mut next = 0u32;
            let model = load_model(&obj, &mtl, |_| {
                next += 1;
                TextureHandle(next - 1)
            })
            .with_context(|| format!("loading {}", obj.display()))?;

            println!(
                "Model {}: {} meshes, {} vertices, {} triangles",
                model.name,
                model.meshes.len(),
                model.vertex_count(),
                model.triangle_count()
            );
            for mesh in &model.meshes {
                let material = mesh
                    .material
                    .and_then(|i| model.materials.get(i))
                    .map_or("-", |m| m.name.as_str());
                println!(
                    "  mesh {:<24} vertices={:<8} triangles={:<8} material={material}",
                    mesh.name,
                    mesh.mesh.vertex_count(),
                    mesh.mesh.triangle_count()
                );
            }
            for material in &model.materials {
                let map = material
                    .map_path
                    .as_ref()
                    .map_or_else(|| "-".to_string(), |p| p.display().to_string());
                println!("  material {:<20} diffuse={} map={map}", material.name, material.diffuse);
            }
        }
        Commands::Label {
            text,
            base_width,
            size,
        } => {
            let label = Label::new(text, base_width, size);
            let canvas = label.canvas(&FixedAdvance::default());
            let scale = label.sprite_scale();
            println!(
                "canvas {}x{} text scale {:.3} sprite {:.2}x{:.2}",
                canvas.width, canvas.height, canvas.scale_factor, scale.x, scale.y
            );
        }
        Commands::Labels { width, height } => {
            let config = SceneConfig::load(cli.config.as_deref())?;
            let mut loader = AssetLoader::new(&cli.assets);
            let mut demo = stagecraft_demo::build(&config, &mut loader);
            if height > 0.0 {
                demo.camera.aspect = width / height;
            }
            let placements = place_labels(
                &demo.scene,
                &demo.camera,
                Vec2::new(width, height),
                &FixedAdvance::default(),
            );
            for p in placements {
                println!(
                    "{:<10} center=({:.1}, {:.1}) size={:.1}x{:.1} font={:.1}px depth={:.2} fog={:.2}",
                    p.text, p.center.x, p.center.y, p.size.x, p.size.y, p.font_px, p.depth, p.fog
                );
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dump_wait(arg: &str) -> Result<Duration, clap::Error> {
        let cli = Cli::try_parse_from(["stagecraft-cli", "dump", "--wait", arg])?;
        match cli.command {
            Commands::Dump { wait, .. } => Ok(wait),
            _ => unreachable!(),
        }
    }

    #[test]
    fn wait_rejects_non_finite_and_negative() {
        for bad in ["NaN", "inf", "-1", "soon"] {
            assert!(dump_wait(bad).is_err(), "{bad}");
        }
    }

    #[test]
    fn wait_is_capped_at_an_hour() {
        assert_eq!(dump_wait("2.5").unwrap(), Duration::from_millis(2500));
        assert_eq!(dump_wait("1e9").unwrap(), Duration::from_secs(3600));
        assert_eq!(dump_wait("0").unwrap(), Duration::ZERO);
    }
}
