//! Ordered list of reference pairs and the active selection.

use log::debug;

use crate::clip::MediaPair;

/// One before/after reference with its display metadata. Titles may span
/// multiple lines; `title_lines` splits them for display.
#[derive(Clone, Debug)]
pub struct Reference {
    pub title: String,
    pub subtitle: String,
    pub company: String,
    pub details: String,
    pub media: MediaPair,
}

impl Reference {
    pub fn title_lines(&self) -> impl Iterator<Item = &str> {
        self.title.split('\n')
    }
}

pub struct Gallery {
    entries: Vec<Reference>,
    active: usize,
}

impl Gallery {
    pub fn new(entries: Vec<Reference>) -> Self {
        Self { entries, active: 0 }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[Reference] {
        &self.entries
    }

    pub fn get(&self, index: usize) -> Option<&Reference> {
        self.entries.get(index)
    }

    pub fn active(&self) -> usize {
        self.active
    }

    pub fn active_entry(&self) -> Option<&Reference> {
        self.entries.get(self.active)
    }

    /// Steps forward, saturating at the last entry.
    pub fn next(&mut self) {
        let last = self.entries.len().saturating_sub(1);
        self.active = (self.active + 1).min(last);
        debug!("gallery advanced to entry {}", self.active);
    }

    /// Steps backward, saturating at the first entry.
    pub fn previous(&mut self) {
        self.active = self.active.saturating_sub(1);
        debug!("gallery stepped back to entry {}", self.active);
    }

    /// Activates an entry directly, clamping to the valid range.
    pub fn set_active(&mut self, index: usize) {
        let last = self.entries.len().saturating_sub(1);
        self.active = index.min(last);
        debug!("gallery entry {} activated", self.active);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(title: &str) -> Reference {
        Reference {
            title: title.to_string(),
            subtitle: String::new(),
            company: String::new(),
            details: String::new(),
            media: MediaPair::default(),
        }
    }

    fn gallery_of(n: usize) -> Gallery {
        Gallery::new((0..n).map(|i| entry(&format!("Entry {i}"))).collect())
    }

    #[test]
    fn stepping_saturates_at_both_ends() {
        let mut gallery = gallery_of(3);
        gallery.previous();
        assert_eq!(gallery.active(), 0);
        gallery.next();
        gallery.next();
        gallery.next();
        assert_eq!(gallery.active(), 2);
    }

    #[test]
    fn set_active_clamps() {
        let mut gallery = gallery_of(3);
        gallery.set_active(99);
        assert_eq!(gallery.active(), 2);
        gallery.set_active(1);
        assert_eq!(gallery.active(), 1);
    }

    #[test]
    fn empty_gallery_has_no_active_entry() {
        let mut gallery = gallery_of(0);
        gallery.next();
        gallery.previous();
        gallery.set_active(5);
        assert!(gallery.active_entry().is_none());
        assert_eq!(gallery.active(), 0);
    }

    #[test]
    fn multi_line_titles_split_for_display() {
        let reference = entry("KITCHEN\nRENOVATION");
        let lines: Vec<&str> = reference.title_lines().collect();
        assert_eq!(lines, vec!["KITCHEN", "RENOVATION"]);
    }
}
