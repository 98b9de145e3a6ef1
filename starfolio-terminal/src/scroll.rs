/// Virtual page scroll driven by mouse wheel and keys

/// Tracks a browser-style scroll offset: 0 at the top, negative below it
#[derive(Debug, Clone)]
pub struct ScrollTracker {
    offset: f32,
    step: f32,
    max_scroll: f32,
}

impl ScrollTracker {
    pub fn new(step: f32, max_scroll: f32) -> Self {
        Self {
            offset: 0.0,
            step,
            max_scroll: max_scroll.max(0.0),
        }
    }

    pub fn offset(&self) -> f32 {
        self.offset
    }

    /// Scroll toward the bottom of the page. Returns the new offset if it moved.
    pub fn scroll_down(&mut self, notches: u32) -> Option<f32> {
        self.move_to(self.offset - self.step * notches as f32)
    }

    /// Scroll toward the top of the page. Returns the new offset if it moved.
    pub fn scroll_up(&mut self, notches: u32) -> Option<f32> {
        self.move_to(self.offset + self.step * notches as f32)
    }

    pub fn jump_to_top(&mut self) -> Option<f32> {
        self.move_to(0.0)
    }

    // Like a page, reaching an edge fires no further scroll events
    fn move_to(&mut self, target: f32) -> Option<f32> {
        let clamped = target.clamp(-self.max_scroll, 0.0);
        if clamped == self.offset {
            return None;
        }
        self.offset = clamped;
        Some(clamped)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scrolling_down_goes_negative() {
        let mut scroll = ScrollTracker::new(60.0, 1000.0);
        assert_eq!(scroll.scroll_down(1), Some(-60.0));
        assert_eq!(scroll.scroll_down(2), Some(-180.0));
        assert_eq!(scroll.offset(), -180.0);
    }

    #[test]
    fn top_edge_fires_nothing() {
        let mut scroll = ScrollTracker::new(60.0, 1000.0);
        assert_eq!(scroll.scroll_up(1), None);
        scroll.scroll_down(1);
        assert_eq!(scroll.scroll_up(5), Some(0.0));
        assert_eq!(scroll.jump_to_top(), None);
    }

    #[test]
    fn bottom_edge_is_clamped() {
        let mut scroll = ScrollTracker::new(600.0, 1000.0);
        scroll.scroll_down(1);
        assert_eq!(scroll.scroll_down(1), Some(-1000.0));
        assert_eq!(scroll.scroll_down(1), None);
    }
}
