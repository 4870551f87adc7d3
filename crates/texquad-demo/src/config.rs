use std::path::PathBuf;

use texquad_engine::device::GpuInit;
use texquad_engine::logging::LoggingConfig;
use texquad_engine::paint::Color;
use texquad_engine::window::RuntimeConfig;
use winit::dpi::LogicalSize;

/// Side length of the square window and of the raw image, in pixels.
pub const SIZE: u32 = 512;

/// Everything the demo needs, fixed at build time.
#[derive(Debug, Clone)]
pub struct DemoConfig {
    pub title: String,
    pub window_size: u32,
    pub vertex_shader: PathBuf,
    pub fragment_shader: PathBuf,
    pub image: PathBuf,
    pub image_width: u32,
    pub image_height: u32,
    pub clear_color: Color,
    pub sample_count: u32,
    pub log_filter: String,
}

impl Default for DemoConfig {
    fn default() -> Self {
        let assets = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("assets");
        Self {
            title: "texquad".to_string(),
            window_size: SIZE,
            vertex_shader: assets.join("quad.vert.wgsl"),
            fragment_shader: assets.join("quad.frag.wgsl"),
            image: assets.join("quad.rgb"),
            image_width: SIZE,
            image_height: SIZE,
            clear_color: Color::rgba(0.5, 0.5, 0.5, 0.0),
            sample_count: 4,
            log_filter: "info,wgpu_core=warn,wgpu_hal=warn,naga=warn".to_string(),
        }
    }
}

impl DemoConfig {
    pub fn logging(&self) -> LoggingConfig {
        LoggingConfig {
            default_filter: self.log_filter.clone(),
            ..LoggingConfig::default()
        }
    }

    pub fn runtime(&self) -> RuntimeConfig {
        let side = self.window_size as f64;
        RuntimeConfig {
            title: self.title.clone(),
            initial_size: LogicalSize::new(side, side),
            ..RuntimeConfig::default()
        }
    }

    pub fn gpu(&self) -> GpuInit {
        GpuInit {
            sample_count: self.sample_count,
            ..GpuInit::default()
        }
    }
}
