use egui::Context as EguiContext;
use winit::window::Window;

use crate::render::SurfaceSize;
use crate::stats::FrameStats;

/// Frame-rate readout drawn in the top-left corner after the scene pass.
pub struct StatsOverlay {
    ctx: EguiContext,
    state: egui_winit::State,
    renderer: egui_wgpu::Renderer,
}

impl StatsOverlay {
    pub fn new(window: &Window, device: &wgpu::Device, format: wgpu::TextureFormat) -> Self {
        let ctx = EguiContext::default();
        let state = egui_winit::State::new(
            ctx.clone(),
            egui::ViewportId::ROOT,
            window,
            Some(window.scale_factor() as f32),
            None,
            None,
        );
        let renderer = egui_wgpu::Renderer::new(device, format, None, 1, false);
        Self {
            ctx,
            state,
            renderer,
        }
    }

    /// Draws the overlay on top of an already rendered frame.
    pub fn draw(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        window: &Window,
        view: &wgpu::TextureView,
        size: SurfaceSize,
        stats: &FrameStats,
    ) {
        let raw_input = self.state.take_egui_input(window);
        let full_output = self.ctx.run(raw_input, |ctx| {
            draw_panel(ctx, stats);
        });
        self.state
            .handle_platform_output(window, full_output.platform_output);

        let paint_jobs = self
            .ctx
            .tessellate(full_output.shapes, full_output.pixels_per_point);
        let screen_descriptor = egui_wgpu::ScreenDescriptor {
            size_in_pixels: [size.width, size.height],
            pixels_per_point: full_output.pixels_per_point,
        };

        for (id, image_delta) in &full_output.textures_delta.set {
            self.renderer.update_texture(device, queue, *id, image_delta);
        }
        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("overlay-encoder"),
        });
        self.renderer.update_buffers(
            device,
            queue,
            &mut encoder,
            &paint_jobs,
            &screen_descriptor,
        );
        {
            let mut pass = encoder
                .begin_render_pass(&wgpu::RenderPassDescriptor {
                    label: Some("overlay-pass"),
                    color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                        view,
                        resolve_target: None,
                        ops: wgpu::Operations {
                            load: wgpu::LoadOp::Load,
                            store: wgpu::StoreOp::Store,
                        },
                    })],
                    depth_stencil_attachment: None,
                    ..Default::default()
                })
                .forget_lifetime();
            self.renderer.render(&mut pass, &paint_jobs, &screen_descriptor);
        }
        queue.submit(std::iter::once(encoder.finish()));
        for id in &full_output.textures_delta.free {
            self.renderer.free_texture(id);
        }
    }
}

fn draw_panel(ctx: &EguiContext, stats: &FrameStats) {
    egui::Window::new("frame-stats")
        .anchor(egui::Align2::LEFT_TOP, egui::vec2(8.0, 8.0))
        .title_bar(false)
        .resizable(false)
        .interactable(false)
        .show(ctx, |ui| {
            ui.monospace(format!("{:5.0} fps", stats.fps()));
            ui.monospace(format!(
                "{:6.2} ms ({:.2}-{:.2})",
                stats.last_ms(),
                stats.min_ms(),
                stats.max_ms()
            ));
        });
}
