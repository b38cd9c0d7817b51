//! trailmap - Pointer-trail displacement map demo
//!
//! Headless driver: sweeps a synthetic pointer across the canvas, renders the
//! trail each frame, optionally composites it over a test pattern, and writes
//! the result to a PNG.

use clap::Parser;
use glam::Vec2;
use std::path::PathBuf;
use tracing::{info, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use trailmap::{
    config::Config,
    displace::DisplacementPass,
    gpu::HeadlessGpu,
    trail::{TrailMap, TRAIL_FORMAT},
    CanvasSize,
};

/// trailmap - render a pointer-trail displacement map to a PNG
#[derive(Parser, Debug)]
#[command(name = "trailmap", version, about, long_about = None)]
struct Args {
    /// Configuration file path
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Canvas width in pixels (overrides config)
    #[arg(long)]
    width: Option<u32>,

    /// Canvas height in pixels (overrides config)
    #[arg(long)]
    height: Option<u32>,

    /// Number of frames to simulate
    #[arg(short, long, default_value_t = 240)]
    frames: u32,

    /// Output PNG path
    #[arg(short, long, default_value = "trail.png")]
    output: PathBuf,

    /// Composite the trail over a test pattern instead of dumping the raw map
    #[arg(long)]
    displace: bool,

    /// Displacement strength (overrides config)
    #[arg(long)]
    strength: Option<f32>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Initialize logging
    let log_level = if args.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(
            EnvFilter::builder()
                .with_default_directive(log_level.into())
                .from_env_lossy(),
        )
        .init();

    info!("Starting {} v{}", trailmap::NAME, trailmap::VERSION);

    let mut config = match &args.config {
        Some(path) => Config::from_file(path)?,
        None => Config::load()?,
    };

    if let Some(width) = args.width {
        config.canvas.width = width;
    }
    if let Some(height) = args.height {
        config.canvas.height = height;
    }
    if let Some(strength) = args.strength {
        config.displacement.strength = strength;
    }
    if args.displace {
        config.displacement.enabled = true;
    }
    config.validate()?;

    let gpu = HeadlessGpu::new()?;
    let canvas = config.canvas;
    let mut trail = TrailMap::new(&gpu.device, &gpu.queue, canvas)?;

    let sweep = PointerSweep::new(canvas);
    for frame in 0..args.frames {
        trail.update(&gpu.device, &gpu.queue, sweep.at(frame))?;
    }
    info!(
        "Simulated {} frames, {} sprites visible",
        args.frames,
        trail.pool().visible_count()
    );

    let rgba = if config.displacement.enabled {
        let scene = checkerboard_texture(&gpu, canvas);
        let scene_view = scene.create_view(&Default::default());

        let output = gpu.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("demo_output"),
            size: wgpu::Extent3d {
                width: canvas.width,
                height: canvas.height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: TRAIL_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::COPY_SRC,
            view_formats: &[],
        });
        let output_view = output.create_view(&Default::default());

        let mut pass = DisplacementPass::new(&gpu.device, TRAIL_FORMAT);
        pass.strength = config.displacement.strength;
        pass.set_params(&gpu.queue);

        let mut encoder = gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("demo_encoder"),
            });
        pass.apply(
            &gpu.device,
            &mut encoder,
            &scene_view,
            trail.texture_view(),
            &output_view,
        );
        gpu.queue.submit(std::iter::once(encoder.finish()));

        gpu.read_texture_rgba(&output, canvas.width, canvas.height)?
    } else {
        gpu.read_texture_rgba(trail.target_texture(), canvas.width, canvas.height)?
    };

    let image = image::RgbaImage::from_raw(canvas.width, canvas.height, rgba)
        .ok_or_else(|| anyhow::anyhow!("readback returned unexpected pixel count"))?;
    image.save(&args.output)?;
    info!("Wrote {}", args.output.display());

    trail.dispose()?;

    Ok(())
}

/// Synthetic pointer path: a Lissajous sweep covering most of the canvas at a
/// plausible hand speed (roughly 10-20 pixels per frame).
struct PointerSweep {
    amp_x: f32,
    amp_y: f32,
}

impl PointerSweep {
    fn new(canvas: CanvasSize) -> Self {
        Self {
            amp_x: canvas.width as f32 * 0.4,
            amp_y: canvas.height as f32 * 0.4,
        }
    }

    fn at(&self, frame: u32) -> Vec2 {
        let t = frame as f32 / 60.0;
        Vec2::new(
            self.amp_x * (1.9 * t).sin(),
            self.amp_y * (2.7 * t + 0.5).sin(),
        )
    }
}

/// Checkerboard scene texture for the displacement demo.
fn checkerboard_texture(gpu: &HeadlessGpu, canvas: CanvasSize) -> wgpu::Texture {
    const CELL: u32 = 40;

    let mut pixels = Vec::with_capacity((canvas.width * canvas.height * 4) as usize);
    for y in 0..canvas.height {
        for x in 0..canvas.width {
            let lit = ((x / CELL) + (y / CELL)) % 2 == 0;
            let value = if lit { 220 } else { 40 };
            pixels.extend_from_slice(&[value, value, value, 255]);
        }
    }

    let texture = gpu.device.create_texture(&wgpu::TextureDescriptor {
        label: Some("demo_scene"),
        size: wgpu::Extent3d {
            width: canvas.width,
            height: canvas.height,
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: TRAIL_FORMAT,
        usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
        view_formats: &[],
    });

    gpu.queue.write_texture(
        wgpu::ImageCopyTexture {
            texture: &texture,
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
            aspect: wgpu::TextureAspect::All,
        },
        &pixels,
        wgpu::ImageDataLayout {
            offset: 0,
            bytes_per_row: Some(canvas.width * 4),
            rows_per_image: Some(canvas.height),
        },
        wgpu::Extent3d {
            width: canvas.width,
            height: canvas.height,
            depth_or_array_layers: 1,
        },
    );

    texture
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sweep_moves_within_emission_bounds() {
        let sweep = PointerSweep::new(CanvasSize::new(1280, 720));

        for frame in 1..600 {
            let step = sweep.at(frame).distance(sweep.at(frame - 1));
            assert!(step > 0.1, "frame {frame} moved only {step}");
            assert!(step < 300.0, "frame {frame} jumped {step}");
        }
    }

    #[test]
    fn test_sweep_stays_on_canvas() {
        let canvas = CanvasSize::new(1280, 720);
        let sweep = PointerSweep::new(canvas);

        for frame in 0..600 {
            let p = sweep.at(frame);
            assert!(p.x.abs() <= canvas.width as f32 / 2.0);
            assert!(p.y.abs() <= canvas.height as f32 / 2.0);
        }
    }
}
