//! Command-line front end: render RON scenes and raw triangles to image files

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};

use deferred_raster::rasterizer::{
    draw_flat_triangle, Color, Image, LightVectors, RasterSettings, Rasterizer, RenderPass, SamplePattern,
    ShadingPath, Triangle, Vec3,
};
use deferred_raster::scene::{load_scene, AntiAliasMode};
use deferred_raster::VERSION;

#[derive(Parser)]
#[command(name = "deferred-raster", version = VERSION, about)]
struct Cli {
    /// Log debug output (overridden by RUST_LOG)
    #[arg(short, long, global = true, default_value_t = false)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Render a scene file
    Render {
        /// Scene description (.ron)
        scene: PathBuf,

        /// Output image; the format follows the extension
        #[arg(short, long, default_value = "out.png")]
        output: PathBuf,

        /// Shade while rasterizing instead of through the G-buffer
        #[arg(long, default_value_t = false)]
        forward: bool,

        /// Use unit light and view vectors in the lighting terms
        #[arg(long, default_value_t = false)]
        normalize_light_vectors: bool,

        /// Write every mip level of the scene texture to this directory
        #[arg(long)]
        dump_mipmaps: Option<PathBuf>,

        /// Hide the progress bar
        #[arg(long, default_value_t = false)]
        quiet: bool,
    },
    /// Draw one flat-colored triangle given in pixel coordinates
    Raw {
        /// Output image
        #[arg(short, long, default_value = "raw.png")]
        output: PathBuf,

        #[arg(long, default_value_t = 256)]
        width: usize,

        #[arg(long, default_value_t = 256)]
        height: usize,

        /// x0 y0 x1 y1 x2 y2; defaults to a triangle spanning the image
        #[arg(long, num_args = 6, allow_negative_numbers = true)]
        vertices: Option<Vec<f32>>,

        #[arg(long, value_enum, default_value_t = AaArg::None)]
        aa: AaArg,

        /// Samples per pixel for ssaa/msaa
        #[arg(long, default_value_t = 16)]
        samples: u32,

        /// Jitter SSAA samples with this seed instead of using a grid
        #[arg(long)]
        jitter_seed: Option<u64>,

        /// Fill color as RRGGBB hex
        #[arg(long, default_value = "ffffff")]
        color: String,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum AaArg {
    None,
    Ssaa,
    Msaa,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter)).init();

    match cli.command {
        Command::Render {
            scene,
            output,
            forward,
            normalize_light_vectors,
            dump_mipmaps,
            quiet,
        } => {
            let settings = RasterSettings {
                shading: if forward { ShadingPath::Forward } else { ShadingPath::Deferred },
                light_vectors: if normalize_light_vectors {
                    LightVectors::Normalized
                } else {
                    LightVectors::Unnormalized
                },
                ..RasterSettings::default()
            };
            render(&scene, &output, settings, dump_mipmaps.as_deref(), quiet || cli.verbose)
        }
        Command::Raw {
            output,
            width,
            height,
            vertices,
            aa,
            samples,
            jitter_seed,
            color,
        } => {
            let mode = match aa {
                AaArg::None => AntiAliasMode::None,
                AaArg::Ssaa => AntiAliasMode::Ssaa { samples },
                AaArg::Msaa => AntiAliasMode::Msaa { samples },
            };
            let pattern = jitter_seed.map_or(SamplePattern::Grid, |seed| SamplePattern::Jittered { seed });
            let color = parse_hex_color(&color)?;
            raw(&output, width, height, vertices, mode, pattern, color)
        }
    }
}

fn render(
    scene_path: &Path,
    output: &Path,
    settings: RasterSettings,
    dump_mipmaps: Option<&Path>,
    quiet: bool,
) -> Result<()> {
    let scene = load_scene(scene_path).with_context(|| format!("loading scene {}", scene_path.display()))?;
    let mut rasterizer = Rasterizer::with_settings(&scene, settings).context("preparing renderer")?;

    if let Some(dir) = dump_mipmaps {
        dump_mip_levels(&rasterizer, dir)?;
    }

    let progress = if quiet {
        ProgressBar::hidden()
    } else {
        let pb = ProgressBar::new(RenderPass::ALL.len() as u64);
        pb.set_style(ProgressStyle::with_template("{spinner} [{bar:24}] {pos}/{len} {msg}")?);
        pb
    };

    let mut image = Image::new(scene.width, scene.height, scene.background);
    let stats = rasterizer.render_with_progress(&mut image, |pass| {
        progress.set_position(pass as u64);
        progress.set_message(pass.name());
    });
    progress.finish_and_clear();

    image.save(output).with_context(|| format!("writing {}", output.display()))?;
    log::info!(
        "Wrote {} ({} triangles, {} culled, {} pixels shaded)",
        output.display(),
        stats.triangles,
        stats.culled,
        stats.shaded_pixels
    );
    Ok(())
}

fn dump_mip_levels(rasterizer: &Rasterizer, dir: &Path) -> Result<()> {
    let Some(chain) = rasterizer.mip_chain() else {
        log::warn!("Scene has no texture, no mip levels to write");
        return Ok(());
    };

    fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
    for (i, level) in chain.levels().iter().enumerate() {
        let path = dir.join(format!("level-{}.png", i));
        level.save(&path).with_context(|| format!("writing {}", path.display()))?;
    }
    log::info!("Wrote {} mip levels to {}", chain.len(), dir.display());
    Ok(())
}

fn raw(
    output: &Path,
    width: usize,
    height: usize,
    vertices: Option<Vec<f32>>,
    mode: AntiAliasMode,
    pattern: SamplePattern,
    color: Color,
) -> Result<()> {
    let (w, h) = (width as f32, height as f32);
    let v = vertices.unwrap_or_else(|| vec![0.1 * w, 0.9 * h, 0.9 * w, 0.75 * h, 0.35 * w, 0.1 * h]);
    if v.len() != 6 {
        bail!("expected 6 vertex coordinates, got {}", v.len());
    }

    let tri = Triangle::from_positions(
        Vec3::new(v[0], v[1], 0.0),
        Vec3::new(v[2], v[3], 0.0),
        Vec3::new(v[4], v[5], 0.0),
    );

    let mut image = Image::new(width, height, Color::BLACK);
    draw_flat_triangle(&mut image, &tri, mode, pattern, color);
    image.save(output).with_context(|| format!("writing {}", output.display()))?;
    log::info!("Wrote {} ({}x{}, {:?})", output.display(), width, height, mode);
    Ok(())
}

fn parse_hex_color(hex: &str) -> Result<Color> {
    let hex = hex.trim_start_matches('#');
    if hex.len() != 6 || !hex.is_ascii() {
        bail!("color must be RRGGBB, got {:?}", hex);
    }
    let channel = |i: usize| {
        u8::from_str_radix(&hex[i..i + 2], 16).with_context(|| format!("bad hex digits in color {:?}", hex))
    };
    Ok(Color::from_bytes([channel(0)?, channel(2)?, channel(4)?, 255]))
}
