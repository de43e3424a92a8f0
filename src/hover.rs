//! Exclusive hover tracking for the reference list.
//!
//! At most one row is active at a time. The transition table:
//!
//! | state | event          | next      |
//! |-------|----------------|-----------|
//! | none  | enter(i)       | i         |
//! | i     | enter(j), j≠i  | j         |
//! | i     | leave(i)       | none      |
//! | i     | leave(j), j≠i  | i         |
//!
//! The guarded leave is what prevents flicker when the pointer skips
//! between adjacent rows: a stale leave from the previous row must not
//! clear a newer enter.

#[derive(Debug, Default)]
pub struct HoverRegistry {
    active: Option<usize>,
    len: usize,
}

impl HoverRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Last writer wins; a later enter always replaces an earlier one that
    /// has not left yet.
    pub fn on_enter(&mut self, index: usize) {
        self.active = Some(index);
    }

    /// Clears the active index only if it is the one leaving.
    pub fn on_leave(&mut self, index: usize) {
        if self.active == Some(index) {
            self.active = None;
        }
    }

    pub fn is_active(&self, index: usize) -> bool {
        self.active == Some(index)
    }

    pub fn active(&self) -> Option<usize> {
        self.active
    }

    /// Resets the registry whenever the owning list is rebuilt with a
    /// different item count, so a stale index never points past the new end.
    pub fn sync_len(&mut self, len: usize) {
        if len != self.len {
            self.len = len;
            self.active = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enter_activates() {
        let mut hover = HoverRegistry::new();
        assert_eq!(hover.active(), None);
        hover.on_enter(3);
        assert!(hover.is_active(3));
        assert!(!hover.is_active(2));
    }

    #[test]
    fn later_enter_wins() {
        let mut hover = HoverRegistry::new();
        hover.on_enter(0);
        hover.on_enter(1);
        assert!(hover.is_active(1));
        assert!(!hover.is_active(0));
    }

    #[test]
    fn stale_leave_does_not_clear_newer_enter() {
        let mut hover = HoverRegistry::new();
        hover.on_enter(0);
        hover.on_enter(1);
        hover.on_leave(0);
        assert!(hover.is_active(1));
        assert!(!hover.is_active(0));
    }

    #[test]
    fn matching_leave_clears() {
        let mut hover = HoverRegistry::new();
        hover.on_enter(2);
        hover.on_leave(2);
        assert!(!hover.is_active(2));
        assert_eq!(hover.active(), None);
    }

    #[test]
    fn leave_on_empty_registry_is_a_no_op() {
        let mut hover = HoverRegistry::new();
        hover.on_leave(5);
        assert_eq!(hover.active(), None);
    }

    #[test]
    fn sync_len_resets_on_count_change() {
        let mut hover = HoverRegistry::new();
        hover.sync_len(4);
        hover.on_enter(3);
        hover.sync_len(4);
        assert!(hover.is_active(3));
        hover.sync_len(2);
        assert_eq!(hover.active(), None);
    }
}
