//! Renders one textured quad until the window is closed.

mod config;

use anyhow::Result;
use texquad_engine::core::{App, AppControl, FrameCtx};
use texquad_engine::logging::init_logging;
use texquad_engine::paint::Color;
use texquad_engine::render::QuadRenderer;
use texquad_engine::shader::ShaderProgram;
use texquad_engine::texture::RawRgbImage;
use texquad_engine::window::Runtime;

use config::DemoConfig;

struct TexturedQuad {
    renderer: QuadRenderer,
    clear: Color,
}

impl App for TexturedQuad {
    fn on_frame(&mut self, ctx: &mut FrameCtx<'_, '_>) -> AppControl {
        let renderer = &mut self.renderer;
        ctx.render(self.clear, |rctx, target| renderer.render(rctx, target))
    }
}

fn main() -> Result<()> {
    let config = DemoConfig::default();
    init_logging(config.logging());

    let program = ShaderProgram::from_files(&config.vertex_shader, &config.fragment_shader);
    let image = RawRgbImage::load(&config.image, config.image_width, config.image_height);

    let app = TexturedQuad {
        renderer: QuadRenderer::new(program, image),
        clear: config.clear_color,
    };

    Runtime::run(config.runtime(), config.gpu(), app)?;
    log::info!("exiting");
    Ok(())
}
