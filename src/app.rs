//! Application state and event wiring.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use anyhow::Result;
use log::{debug, info};
use winit::event::{ElementState, Event, KeyboardInput, VirtualKeyCode, WindowEvent};
use winit::window::Window;

use crate::clip;
use crate::comparison::{BoundedRegion, ComparisonState};
use crate::diff::DiffCache;
use crate::gallery::Gallery;
use crate::hover::HoverRegistry;
use crate::hud::{Hud, HudState};
use crate::image_loader::{self, ImageCache};
use crate::renderer::{DrawLayer, Renderer};
use crate::view;

pub struct AppConfig {
    pub before_dir: String,
    pub after_dir: String,
    pub manifest: Option<String>,
    pub cache_size: usize,
    pub preload_ahead: usize,
    pub preload_behind: usize,
    pub load_threads: usize,
    pub initial_split: f32,
}

pub struct AppState {
    config: AppConfig,
    gallery: Gallery,
    comparison: ComparisonState,
    hover: HoverRegistry,
    cache: ImageCache,
    diffs: DiffCache,
    renderer: Renderer,
    hud: Hud,
    diff_mode: bool,
    cursor_x: f32,
    view_region: BoundedRegion,
}

fn texture_key(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

fn diff_key(index: usize) -> String {
    format!("flip-diff:{index}")
}

impl AppState {
    pub async fn new(window: &Window, config: AppConfig) -> Result<Self> {
        info!("Initializing viewer state");
        let gallery = image_loader::build_gallery(
            Path::new(&config.before_dir),
            Path::new(&config.after_dir),
            config.manifest.as_deref().map(Path::new),
        )?;
        info!("Loaded {} reference pairs", gallery.len());

        let cache = ImageCache::new(config.cache_size, config.load_threads);
        let diffs = DiffCache::new(cache.pool().clone());
        let renderer = Renderer::new(window).await?;
        let hud = Hud::new(window, renderer.device(), renderer.queue(), renderer.format());
        let comparison = ComparisonState::new(config.initial_split);

        Ok(Self {
            config,
            gallery,
            comparison,
            hover: HoverRegistry::new(),
            cache,
            diffs,
            renderer,
            hud,
            diff_mode: false,
            cursor_x: 0.0,
            view_region: BoundedRegion::empty(),
        })
    }

    pub fn handle_event(&mut self, window: &Window, event: &Event<'_, ()>) {
        self.hud.handle_event(window, event);
        if let Event::WindowEvent { event, .. } = event {
            match event {
                WindowEvent::Resized(size) => {
                    self.renderer.resize(size.width, size.height);
                }
                WindowEvent::ScaleFactorChanged { new_inner_size, .. } => {
                    self.renderer.resize(new_inner_size.width, new_inner_size.height);
                }
                WindowEvent::CursorMoved { position, .. } => {
                    self.cursor_x = position.x as f32;
                    if !self.hud.wants_pointer() {
                        let region = self.view_region;
                        self.comparison.update(self.cursor_x, &region);
                    }
                }
                WindowEvent::KeyboardInput {
                    input:
                        KeyboardInput {
                            state: ElementState::Pressed,
                            virtual_keycode: Some(keycode),
                            ..
                        },
                    ..
                } => self.handle_key(*keycode),
                _ => {}
            }
        }
    }

    fn handle_key(&mut self, keycode: VirtualKeyCode) {
        match keycode {
            VirtualKeyCode::Right => {
                self.gallery.next();
            }
            VirtualKeyCode::Left => {
                self.gallery.previous();
            }
            VirtualKeyCode::D => {
                self.diff_mode = !self.diff_mode;
                debug!("diff mode: {}", self.diff_mode);
            }
            VirtualKeyCode::Space => {
                self.comparison.set_fraction(self.config.initial_split);
                debug!("split re-centred to {}", self.comparison.fraction());
            }
            _ => {}
        }
    }

    /// Schedules decodes for the preload window around the active entry,
    /// prunes the caches, and kicks off the active diff when needed.
    pub fn update(&mut self) {
        self.hover.sync_len(self.gallery.len());
        if self.gallery.is_empty() {
            return;
        }

        let active = self.gallery.active();
        let first = active.saturating_sub(self.config.preload_behind);
        let last = (active + self.config.preload_ahead).min(self.gallery.len() - 1);

        let mut protected = HashSet::new();
        for index in first..=last {
            if let Some(entry) = self.gallery.get(index) {
                for path in [&entry.media.before, &entry.media.after]
                    .into_iter()
                    .flatten()
                {
                    self.cache.request(path);
                    protected.insert(path.clone());
                }
            }
        }

        // The hovered row's overlay image is part of the working set too.
        if let Some(hovered) = self.hover.active() {
            if let Some(entry) = self.gallery.get(hovered) {
                if let Some(path) = &entry.media.after {
                    self.cache.request(path);
                    protected.insert(path.clone());
                }
            }
        }

        let evicted: Vec<PathBuf> = self.cache.prune(&protected);
        for path in &evicted {
            self.renderer.drop_page(&texture_key(path));
        }

        // Diffs follow the same window: anything outside it is dropped from
        // both the CPU cache and its GPU page.
        let protected_diffs: HashSet<usize> = (first..=last).collect();
        for index in self.diffs.prune(&protected_diffs) {
            self.renderer.drop_page(&diff_key(index));
        }

        if self.diff_mode && self.diffs.get(active).is_none() {
            if let Some(entry) = self.gallery.active_entry() {
                let before = entry.media.before.as_ref().and_then(|p| self.cache.get(p));
                let after = entry.media.after.as_ref().and_then(|p| self.cache.get(p));
                if let (Some(before), Some(after)) = (before, after) {
                    self.diffs.request(active, before, after);
                }
            }
        }
    }

    pub fn render(&mut self, window: &Window) -> Result<()> {
        let (surface_w, surface_h) = self.renderer.size();
        let mut layers: Vec<DrawLayer> = Vec::new();
        let mut diff_mean = None;
        let mut region = BoundedRegion::empty();
        let active = self.gallery.active();

        if let Some(entry) = self.gallery.active_entry() {
            let before = entry.media.before.as_ref().and_then(|p| self.cache.get(p));
            let after = entry.media.after.as_ref().and_then(|p| self.cache.get(p));
            if let Some(image) = before.as_ref().or(after.as_ref()) {
                region = view::letterbox(
                    surface_w,
                    surface_h,
                    image.width() as f32,
                    image.height() as f32,
                );
            }

            if self.diff_mode {
                if let Some(diff) = self.diffs.get(active) {
                    region = view::letterbox(
                        surface_w,
                        surface_h,
                        diff.image.width() as f32,
                        diff.image.height() as f32,
                    );
                    let key = diff_key(active);
                    self.renderer.upload(&key, &diff.image);
                    let rect = view::clip_to_pixels(&region, &clip::ClipRect::FULL);
                    let quad =
                        view::pixel_rect_to_ndc(&rect, &clip::ClipRect::FULL, surface_w, surface_h);
                    if !quad.is_degenerate() {
                        layers.push(DrawLayer { key, quad });
                    }
                    diff_mean = Some(diff.mean_error);
                }
            } else if before.is_some() && after.is_some() {
                for layer in clip::clip_layers(&entry.media, self.comparison.fraction()) {
                    let Some(image) = self.cache.get(layer.source) else {
                        continue;
                    };
                    let key = texture_key(layer.source);
                    self.renderer.upload(&key, &image);
                    let rect = view::clip_to_pixels(&region, &layer.clip);
                    let quad = view::pixel_rect_to_ndc(&rect, &layer.clip, surface_w, surface_h);
                    if !quad.is_degenerate() {
                        layers.push(DrawLayer { key, quad });
                    }
                }
            }
        }

        if let Some(hovered) = self.hover.active() {
            if let Some(path) = self.gallery.get(hovered).and_then(|e| e.media.after.as_ref()) {
                if let Some(image) = self.cache.get(path) {
                    let key = texture_key(path);
                    self.renderer.upload(&key, &image);
                    let base = if region.is_usable() {
                        region
                    } else {
                        BoundedRegion::new(0.0, 0.0, surface_w, surface_h)
                    };
                    let rect = view::overlay_rect(&base);
                    let quad =
                        view::pixel_rect_to_ndc(&rect, &clip::ClipRect::FULL, surface_w, surface_h);
                    if !quad.is_degenerate() {
                        layers.push(DrawLayer { key, quad });
                    }
                }
            }
        }

        self.view_region = region;

        let (ready, pending, failed) = self.cache.counts();
        let status = format!(
            "{} pairs | {} decoded, {} loading, {} failed",
            self.gallery.len(),
            ready,
            pending,
            failed
        );
        let state = HudState {
            gallery: &mut self.gallery,
            hover: &mut self.hover,
            comparison: &mut self.comparison,
            diff_mode: &mut self.diff_mode,
            status: &status,
            diff_mean,
        };
        self.renderer.render(window, &layers, &mut self.hud, state)
    }
}
