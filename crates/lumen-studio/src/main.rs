mod demos;
mod session;

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;

use lumen_engine::device::GpuInit;
use lumen_engine::logging::{init_logging, LoggingConfig};
use lumen_engine::surface::{OverlayConfig, SurfaceConfig, UniformPolicy};
use lumen_engine::window::Runtime;

use demos::composite::{CompositeDemo, DEFAULT_SCALE as COMPOSITE_SCALE};
use demos::fractal::FractalDemo;
use demos::triangle::TriangleDemo;
use demos::DemoKind;

#[derive(Debug, Parser)]
#[command(name = "lumen-studio", about = "Real-time shader demos")]
struct Args {
    /// Demo to run.
    #[arg(long, value_enum, default_value_t = DemoKind::Triangle)]
    demo: DemoKind,

    /// Displayed width in logical pixels.
    #[arg(long, default_value_t = 600.0)]
    width: f32,

    /// Displayed height in logical pixels.
    #[arg(long, default_value_t = 600.0)]
    height: f32,

    /// Display pixels per backing-surface pixel (composite defaults to 4).
    #[arg(long)]
    scale: Option<f32>,

    /// Fail on uniforms and attributes the program does not declare.
    #[arg(long)]
    strict_uniforms: bool,

    /// Disable the frame-time graph and debug text.
    #[arg(long)]
    no_overlay: bool,

    /// Monospace font for overlay text.
    #[arg(long)]
    font: Option<PathBuf>,

    /// Present without waiting for vertical sync.
    #[arg(long)]
    no_vsync: bool,

    /// Log filter, e.g. "debug" or "lumen_engine=trace".
    #[arg(long)]
    log: Option<String>,
}

impl Args {
    fn surface_config(&self) -> SurfaceConfig {
        let scale = self.scale.unwrap_or(match self.demo {
            DemoKind::Composite => COMPOSITE_SCALE,
            DemoKind::Triangle | DemoKind::Fractal => 1.0,
        });

        SurfaceConfig {
            title: format!("lumen - {:?}", self.demo).to_lowercase(),
            width: self.width,
            height: self.height,
            scale,
            uniform_policy: if self.strict_uniforms {
                UniformPolicy::Strict
            } else {
                UniformPolicy::Lenient
            },
            overlay: OverlayConfig {
                enabled: !self.no_overlay,
                font_path: self.font.clone(),
                ..OverlayConfig::default()
            },
        }
    }
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    init_logging(LoggingConfig {
        filter: args.log.clone(),
        ..LoggingConfig::default()
    });

    let config = args.surface_config();
    let gpu_init = GpuInit::default().with_vsync(!args.no_vsync);

    log::info!("starting {:?} demo", args.demo);

    let result = match args.demo {
        DemoKind::Triangle => Runtime::run(config, gpu_init, TriangleDemo::default()),
        DemoKind::Composite => Runtime::run(config, gpu_init, CompositeDemo::default()),
        DemoKind::Fractal => Runtime::run(config, gpu_init, FractalDemo::default()),
    };

    result.context("demo terminated with an error")
}
