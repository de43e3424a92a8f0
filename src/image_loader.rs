//! Directory scanning, stem pairing, caption manifests, and the decode cache.
//!
//! Decoding runs on a worker pool; the event thread only polls cache slots.

use std::collections::{HashMap, HashSet};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::OnceLock;

use anyhow::{ensure, Context as _, Result};
use image::RgbaImage;
use log::{debug, info, warn};
use memmap2::Mmap;
use parking_lot::Mutex;
use regex::Regex;
use threadpool::ThreadPool;

use crate::clip::MediaPair;
use crate::gallery::{Gallery, Reference};

const IMAGE_EXTENSIONS: &[&str] = &[
    "png", "jpg", "jpeg", "bmp", "gif", "tga", "tif", "tiff", "webp",
];

/// Collects the image files directly under `dir`, in natural order.
pub fn scan_directory(dir: &Path) -> Result<Vec<PathBuf>> {
    info!("Scanning {} for images", dir.display());
    let entries = std::fs::read_dir(dir)
        .with_context(|| format!("failed to read directory {}", dir.display()))?;
    let mut paths = Vec::new();
    for entry in entries {
        let path = entry?.path();
        let is_image = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| IMAGE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
            .unwrap_or(false);
        if is_image {
            paths.push(path);
        }
    }
    sort_naturally(&mut paths);
    debug!("Found {} images in {}", paths.len(), dir.display());
    Ok(paths)
}

/// Orders filenames by (prefix, numeric index), where the index is the last
/// run of digits in the stem, so `img_2` sorts before `img_10`.
pub fn sort_naturally(paths: &mut [PathBuf]) {
    paths.sort_by(|a, b| natural_stem_key(stem_of(a)).cmp(&natural_stem_key(stem_of(b))));
}

fn stem_of(path: &Path) -> &str {
    path.file_stem().and_then(|s| s.to_str()).unwrap_or("")
}

fn natural_stem_key(stem: &str) -> (String, Option<u64>, String) {
    static INDEX_RE: OnceLock<Regex> = OnceLock::new();
    let re = INDEX_RE.get_or_init(|| Regex::new(r"(\d+)\D*$").expect("valid index regex"));
    if let Some(captures) = re.captures(stem) {
        let digits = captures.get(1).expect("regex has one capture group");
        if let Ok(index) = digits.as_str().parse::<u64>() {
            return (stem[..digits.start()].to_string(), Some(index), stem.to_string());
        }
    }
    (stem.to_string(), None, stem.to_string())
}

/// Pairs the two directory listings by file stem, in natural stem order.
/// A stem present on only one side still yields an entry; its missing side
/// stays `None` and the viewer shows no slider surface for it.
pub fn pair_by_stem(before: &[PathBuf], after: &[PathBuf]) -> Vec<(String, MediaPair)> {
    let before_map: HashMap<&str, &PathBuf> =
        before.iter().map(|path| (stem_of(path), path)).collect();
    let after_map: HashMap<&str, &PathBuf> =
        after.iter().map(|path| (stem_of(path), path)).collect();

    let mut stems: Vec<&str> = before_map.keys().chain(after_map.keys()).copied().collect();
    stems.sort_by(|a, b| natural_stem_key(a).cmp(&natural_stem_key(b)));
    stems.dedup();

    stems
        .into_iter()
        .map(|stem| {
            let pair = MediaPair {
                before: before_map.get(stem).map(|path| (*path).clone()),
                after: after_map.get(stem).map(|path| (*path).clone()),
            };
            if pair.before.is_none() {
                warn!("reference '{}' has no before image", stem);
            }
            if pair.after.is_none() {
                warn!("reference '{}' has no after image", stem);
            }
            (stem.to_string(), pair)
        })
        .collect()
}

/// Display metadata attached to a stem by the caption manifest.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Caption {
    pub title: String,
    pub subtitle: String,
    pub company: String,
    pub details: String,
}

/// Parses one `stem | title | subtitle | company | details` manifest line.
/// Trailing fields are optional; `\n` in a title becomes a line break.
/// Comment and blank lines yield `None`.
pub fn parse_manifest_line(line: &str) -> Option<(String, Caption)> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return None;
    }
    let mut fields = line.split('|').map(str::trim);
    let stem = fields.next().filter(|stem| !stem.is_empty())?;
    let title = fields
        .next()
        .filter(|title| !title.is_empty())
        .map(|title| title.replace("\\n", "\n"))
        .unwrap_or_else(|| prettify_stem(stem));
    let caption = Caption {
        title,
        subtitle: fields.next().unwrap_or("").to_string(),
        company: fields.next().unwrap_or("").to_string(),
        details: fields.next().unwrap_or("").to_string(),
    };
    Some((stem.to_string(), caption))
}

pub fn load_manifest(path: &Path) -> Result<HashMap<String, Caption>> {
    info!("Loading caption manifest from {}", path.display());
    let file = File::open(path)
        .with_context(|| format!("failed to open manifest {}", path.display()))?;
    let mut captions = HashMap::new();
    for (number, line) in BufReader::new(file).lines().enumerate() {
        let line = line.context("failed to read manifest line")?;
        if let Some((stem, caption)) = parse_manifest_line(&line) {
            captions.insert(stem, caption);
        } else if !line.trim().is_empty() && !line.trim_start().starts_with('#') {
            warn!("skipping malformed manifest line {}", number + 1);
        }
    }
    Ok(captions)
}

/// Title fallback for stems without a manifest entry: separators become
/// spaces and each word is capitalized, so `kitchen_2` reads "Kitchen 2".
pub fn prettify_stem(stem: &str) -> String {
    stem.split(['_', '-', ' '])
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Scans both directories, pairs by stem, and attaches captions.
pub fn build_gallery(
    before_dir: &Path,
    after_dir: &Path,
    manifest: Option<&Path>,
) -> Result<Gallery> {
    let before = scan_directory(before_dir)?;
    let after = scan_directory(after_dir)?;
    let pairs = pair_by_stem(&before, &after);
    ensure!(
        !pairs.is_empty(),
        "no images found under {} or {}",
        before_dir.display(),
        after_dir.display()
    );

    let mut captions = match manifest {
        Some(path) => load_manifest(path)?,
        None => HashMap::new(),
    };

    let entries = pairs
        .into_iter()
        .map(|(stem, media)| match captions.remove(&stem) {
            Some(caption) => Reference {
                title: caption.title,
                subtitle: caption.subtitle,
                company: caption.company,
                details: caption.details,
                media,
            },
            None => Reference {
                title: prettify_stem(&stem),
                subtitle: String::new(),
                company: String::new(),
                details: String::new(),
                media,
            },
        })
        .collect();

    for stem in captions.keys() {
        warn!("manifest entry '{}' does not match any image pair", stem);
    }

    Ok(Gallery::new(entries))
}

/// State of one path in the decode cache. Workers move a slot from
/// `Pending` to `Ready` or `Failed`; it is never moved back.
#[derive(Clone)]
pub enum CacheSlot<T> {
    Pending,
    Ready(T),
    Failed(String),
}

type ImageSlots = HashMap<PathBuf, CacheSlot<Arc<RgbaImage>>>;

/// Shared decode cache. `request` schedules a decode on the worker pool;
/// the event thread polls with `get` and prunes with `prune`.
pub struct ImageCache {
    slots: Arc<Mutex<ImageSlots>>,
    pool: ThreadPool,
    capacity: usize,
}

impl ImageCache {
    pub fn new(capacity: usize, threads: usize) -> Self {
        info!(
            "Image cache: capacity {} images, {} decode threads",
            capacity, threads
        );
        Self {
            slots: Arc::new(Mutex::new(HashMap::new())),
            pool: ThreadPool::new(threads.max(1)),
            capacity: capacity.max(1),
        }
    }

    pub fn pool(&self) -> &ThreadPool {
        &self.pool
    }

    /// Schedules a decode unless the path already has a slot. Failures are
    /// recorded in the slot and logged once; they are never retried.
    pub fn request(&self, path: &Path) {
        {
            let mut slots = self.slots.lock();
            if slots.contains_key(path) {
                return;
            }
            slots.insert(path.to_owned(), CacheSlot::Pending);
        }
        debug!("scheduling decode of {}", path.display());
        let slots = Arc::clone(&self.slots);
        let path = path.to_owned();
        self.pool.execute(move || {
            let slot = match decode_image(&path) {
                Ok(img) => CacheSlot::Ready(Arc::new(img)),
                Err(err) => {
                    warn!("failed to decode {}: {:#}", path.display(), err);
                    CacheSlot::Failed(format!("{err:#}"))
                }
            };
            slots.lock().insert(path, slot);
        });
    }

    pub fn get(&self, path: &Path) -> Option<Arc<RgbaImage>> {
        match self.slots.lock().get(path) {
            Some(CacheSlot::Ready(image)) => Some(Arc::clone(image)),
            _ => None,
        }
    }

    /// (ready, pending, failed) slot counts, for the status line.
    pub fn counts(&self) -> (usize, usize, usize) {
        let slots = self.slots.lock();
        let mut counts = (0, 0, 0);
        for slot in slots.values() {
            match slot {
                CacheSlot::Ready(_) => counts.0 += 1,
                CacheSlot::Pending => counts.1 += 1,
                CacheSlot::Failed(_) => counts.2 += 1,
            }
        }
        counts
    }

    /// Evicts decoded images outside the protected window once the cache is
    /// over capacity. Pending and failed slots are kept; failed slots are
    /// cheap and keeping them prevents retry loops. Returns the evicted
    /// paths so GPU pages can be dropped alongside.
    pub fn prune(&self, protected: &HashSet<PathBuf>) -> Vec<PathBuf> {
        let mut slots = self.slots.lock();
        let mut ready: Vec<PathBuf> = slots
            .iter()
            .filter(|(_, slot)| matches!(slot, CacheSlot::Ready(_)))
            .map(|(path, _)| path.clone())
            .collect();
        if ready.len() <= self.capacity {
            return Vec::new();
        }
        let mut evicted = Vec::new();
        let mut excess = ready.len() - self.capacity;
        ready.retain(|path| !protected.contains(path));
        for path in ready {
            if excess == 0 {
                break;
            }
            slots.remove(&path);
            debug!("evicted {} from image cache", path.display());
            evicted.push(path);
            excess -= 1;
        }
        evicted
    }

    #[cfg(test)]
    fn insert_ready(&self, path: &Path, image: RgbaImage) {
        self.slots
            .lock()
            .insert(path.to_owned(), CacheSlot::Ready(Arc::new(image)));
    }
}

/// Memory-maps and decodes a single image file into RGBA8.
pub fn decode_image(path: &Path) -> Result<RgbaImage> {
    let file =
        File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
    let mmap = unsafe { Mmap::map(&file) }
        .with_context(|| format!("failed to map {}", path.display()))?;
    let decoded = image::load_from_memory(&mmap)
        .with_context(|| format!("failed to decode {}", path.display()))?;
    Ok(decoded.to_rgba8())
}
