//! imgui side panel: reference list, active-entry details, split slider.

use std::time::Instant;

use anyhow::{Context as _, Result};
use imgui::Condition;
use imgui_winit_support::{HiDpiMode, WinitPlatform};
use winit::event::Event;
use winit::window::Window;

use crate::comparison::ComparisonState;
use crate::gallery::Gallery;
use crate::hover::HoverRegistry;

/// Mutable app state the HUD reads and writes during one frame.
pub struct HudState<'a> {
    pub gallery: &'a mut Gallery,
    pub hover: &'a mut HoverRegistry,
    pub comparison: &'a mut ComparisonState,
    pub diff_mode: &'a mut bool,
    pub status: &'a str,
    pub diff_mean: Option<f32>,
}

pub struct Hud {
    context: imgui::Context,
    platform: WinitPlatform,
    renderer: imgui_wgpu::Renderer,
    last_frame: Instant,
}

impl Hud {
    pub fn new(
        window: &Window,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        format: wgpu::TextureFormat,
    ) -> Self {
        let mut context = imgui::Context::create();
        context.set_ini_filename(None);

        let mut platform = WinitPlatform::init(&mut context);
        platform.attach_window(context.io_mut(), window, HiDpiMode::Default);

        let hidpi_factor = platform.hidpi_factor();
        let font_size = (13.0 * hidpi_factor) as f32;
        context.io_mut().font_global_scale = (1.0 / hidpi_factor) as f32;
        context
            .fonts()
            .add_font(&[imgui::FontSource::DefaultFontData {
                config: Some(imgui::FontConfig {
                    size_pixels: font_size,
                    ..Default::default()
                }),
            }]);

        let renderer_config = imgui_wgpu::RendererConfig {
            texture_format: format,
            ..Default::default()
        };
        let renderer = imgui_wgpu::Renderer::new(&mut context, device, queue, renderer_config);

        Self {
            context,
            platform,
            renderer,
            last_frame: Instant::now(),
        }
    }

    pub fn handle_event(&mut self, window: &Window, event: &Event<'_, ()>) {
        self.platform
            .handle_event(self.context.io_mut(), window, event);
    }

    /// True while the HUD owns the pointer; canvas pointer moves are not
    /// applied then.
    pub fn wants_pointer(&self) -> bool {
        self.context.io().want_capture_mouse
    }

    /// Builds the panel and renders it into the current pass. Hovering a
    /// row emits its enter before any stale leave, so the registry's guard
    /// resolves same-frame row skips to the newer index.
    pub fn draw<'r>(
        &'r mut self,
        window: &Window,
        state: HudState<'_>,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        rpass: &mut wgpu::RenderPass<'r>,
    ) -> Result<()> {
        let now = Instant::now();
        self.context.io_mut().update_delta_time(now - self.last_frame);
        self.last_frame = now;

        self.platform
            .prepare_frame(self.context.io_mut(), window)
            .context("failed to prepare HUD frame")?;
        let ui = self.context.frame();

        let HudState {
            gallery,
            hover,
            comparison,
            diff_mode,
            status,
            diff_mean,
        } = state;

        let mut clicked = None;
        let mut hovered_row = None;
        ui.window("References")
            .position([16.0, 16.0], Condition::FirstUseEver)
            .size([340.0, 480.0], Condition::FirstUseEver)
            .build(|| {
                for (index, entry) in gallery.entries().iter().enumerate() {
                    let label = format!("({:02}) {}", index + 1, entry.title.replace('\n', " "));
                    let selected = index == gallery.active();
                    if ui.selectable_config(&label).selected(selected).build() {
                        clicked = Some(index);
                    }
                    if ui.is_item_hovered() {
                        hovered_row = Some(index);
                    }
                }

                ui.separator();
                if let Some(entry) = gallery.active_entry() {
                    for line in entry.title_lines() {
                        ui.text(line);
                    }
                    if !entry.subtitle.is_empty() {
                        ui.text_disabled(&entry.subtitle);
                    }
                    if !entry.company.is_empty() {
                        ui.text(&entry.company);
                    }
                    if !entry.details.is_empty() {
                        ui.text_wrapped(&entry.details);
                    }
                }

                ui.separator();
                let mut split = comparison.fraction();
                if ui.slider("Split", 0.0f32, 100.0f32, &mut split) {
                    comparison.set_fraction(split);
                }
                ui.checkbox("FLIP diff", diff_mode);
                if let Some(mean) = diff_mean {
                    ui.text(format!("FLIP mean error: {mean:.4}"));
                }
                ui.text_disabled(status);
            });

        if let Some(index) = clicked {
            gallery.set_active(index);
        }
        match hovered_row {
            Some(index) => hover.on_enter(index),
            None => {
                if let Some(previous) = hover.active() {
                    hover.on_leave(previous);
                }
            }
        }

        self.platform.prepare_render(ui, window);
        let draw_data = self.context.render();
        self.renderer
            .render(draw_data, queue, device, rpass)
            .context("failed to render HUD")?;
        Ok(())
    }
}
