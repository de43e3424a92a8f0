//! Perceptual difference maps of the active pair, via NV FLIP.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use anyhow::{ensure, Context as _, Result};
use image::RgbaImage;
use log::{debug, warn};
use parking_lot::Mutex;
use threadpool::ThreadPool;

use crate::image_loader::CacheSlot;

/// A computed FLIP visualization and its mean error over the pair.
#[derive(Clone)]
pub struct DiffMap {
    pub image: Arc<RgbaImage>,
    pub mean_error: f32,
}

/// Computes the FLIP error map of a pair and renders it through the magma
/// LUT. The images must have identical dimensions.
pub fn flip_map(before: &RgbaImage, after: &RgbaImage) -> Result<(RgbaImage, f32)> {
    ensure!(
        before.dimensions() == after.dimensions(),
        "image dimensions differ: {}x{} vs {}x{}",
        before.width(),
        before.height(),
        after.width(),
        after.height()
    );
    let (width, height) = before.dimensions();
    let to_rgb = |img: &RgbaImage| image::DynamicImage::ImageRgba8(img.clone()).to_rgb8();
    let reference = nv_flip::FlipImageRgb8::with_data(width, height, to_rgb(before).as_raw());
    let test = nv_flip::FlipImageRgb8::with_data(width, height, to_rgb(after).as_raw());

    let error_map = nv_flip::flip(reference, test, nv_flip::DEFAULT_PIXELS_PER_DEGREE);
    let mut pool = nv_flip::FlipPool::from_image(&error_map);
    let mean_error = pool.mean();

    let visualized = error_map.apply_color_lut(&nv_flip::magma_lut());
    let rgb = image::RgbImage::from_raw(width, height, visualized.to_vec())
        .context("FLIP produced an unexpected buffer size")?;
    Ok((image::DynamicImage::ImageRgb8(rgb).to_rgba8(), mean_error))
}

/// Lazily computed diff maps, keyed by gallery index. Computation runs on
/// the shared decode pool; the event thread polls with `get`.
pub struct DiffCache {
    slots: Arc<Mutex<HashMap<usize, CacheSlot<DiffMap>>>>,
    pool: ThreadPool,
}

impl DiffCache {
    pub fn new(pool: ThreadPool) -> Self {
        Self {
            slots: Arc::new(Mutex::new(HashMap::new())),
            pool,
        }
    }

    /// Schedules a diff for `index` unless one is already pending or done.
    /// A failed computation is recorded and logged once, never retried.
    pub fn request(&self, index: usize, before: Arc<RgbaImage>, after: Arc<RgbaImage>) {
        {
            let mut slots = self.slots.lock();
            if slots.contains_key(&index) {
                return;
            }
            slots.insert(index, CacheSlot::Pending);
        }
        debug!("scheduling FLIP diff for entry {}", index);
        let slots = Arc::clone(&self.slots);
        self.pool.execute(move || {
            let slot = match flip_map(&before, &after) {
                Ok((image, mean_error)) => CacheSlot::Ready(DiffMap {
                    image: Arc::new(image),
                    mean_error,
                }),
                Err(err) => {
                    warn!("FLIP diff for entry {} failed: {:#}", index, err);
                    CacheSlot::Failed(format!("{err:#}"))
                }
            };
            slots.lock().insert(index, slot);
        });
    }

    pub fn get(&self, index: usize) -> Option<DiffMap> {
        match self.slots.lock().get(&index) {
            Some(CacheSlot::Ready(diff)) => Some(diff.clone()),
            _ => None,
        }
    }

    /// Evicts computed diffs outside the protected window, mirroring the
    /// image cache. Pending and failed slots are kept; a failed diff is
    /// computed (and logged) exactly once. Returns the evicted indices so
    /// their GPU pages can be dropped alongside.
    pub fn prune(&self, protected: &HashSet<usize>) -> Vec<usize> {
        let mut slots = self.slots.lock();
        let evicted: Vec<usize> = slots
            .iter()
            .filter(|(index, slot)| {
                matches!(slot, CacheSlot::Ready(_)) && !protected.contains(index)
            })
            .map(|(index, _)| *index)
            .collect();
        for index in &evicted {
            slots.remove(index);
            debug!("evicted FLIP diff for entry {}", index);
        }
        evicted
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mismatched_dimensions_are_an_error() {
        let before = RgbaImage::new(4, 4);
        let after = RgbaImage::new(4, 8);
        let err = flip_map(&before, &after).unwrap_err();
        assert!(err.to_string().contains("dimensions differ"));
    }

    #[test]
    fn identical_images_produce_a_map_of_matching_size() {
        let image = RgbaImage::from_pixel(8, 8, image::Rgba([120, 90, 60, 255]));
        let (map, mean_error) = flip_map(&image, &image).unwrap();
        assert_eq!(map.dimensions(), (8, 8));
        assert!(mean_error.abs() < 1e-3);
    }

    #[test]
    fn mismatched_pair_fails_through_the_cache() {
        let cache = DiffCache::new(ThreadPool::new(1));
        let before = Arc::new(RgbaImage::new(4, 4));
        let after = Arc::new(RgbaImage::new(4, 8));
        cache.request(0, before, after);
        cache.pool.join();
        assert!(cache.get(0).is_none());
    }

    #[test]
    fn prune_evicts_diffs_outside_the_protected_window() {
        let cache = DiffCache::new(ThreadPool::new(1));
        let image = Arc::new(RgbaImage::from_pixel(4, 4, image::Rgba([30, 60, 90, 255])));
        for index in 0..3 {
            cache.request(index, Arc::clone(&image), Arc::clone(&image));
        }
        cache.pool.join();
        assert!(cache.get(0).is_some());

        let protected: HashSet<usize> = [1, 2].into_iter().collect();
        let evicted = cache.prune(&protected);
        assert_eq!(evicted, vec![0]);
        assert!(cache.get(0).is_none());
        assert!(cache.get(1).is_some());
        assert!(cache.get(2).is_some());

        // Nothing left outside the window.
        assert!(cache.prune(&protected).is_empty());
    }

    #[test]
    fn prune_keeps_failed_slots() {
        let cache = DiffCache::new(ThreadPool::new(1));
        let before = Arc::new(RgbaImage::new(4, 4));
        let after = Arc::new(RgbaImage::new(4, 8));
        cache.request(0, Arc::clone(&before), Arc::clone(&after));
        cache.pool.join();

        assert!(cache.prune(&HashSet::new()).is_empty());
        // The failed slot still blocks a retry.
        cache.request(0, before, after);
        assert!(cache.get(0).is_none());
    }
}
