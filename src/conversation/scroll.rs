/// Distance from the bottom, in viewport units, that still counts as "at the bottom".
pub const DEFAULT_THRESHOLD: u32 = 50;

/// Where new content came from. Local appends re-anchor the view; remote ones must not
/// steal a reader's position.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AppendCause {
    Local,
    Remote,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScrollAction {
    ToBottom,
    Stay,
}

/// Geometry reported by the presentation layer after the user scrolls.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Viewport {
    pub scroll_top: u32,
    pub scroll_height: u32,
    pub client_height: u32,
}

impl Viewport {
    pub fn distance_from_bottom(&self) -> u32 {
        self.scroll_height.saturating_sub(self.scroll_top).saturating_sub(self.client_height)
    }
}

#[derive(Debug, Clone)]
pub struct ScrollPolicy {
    threshold: u32,
    user_scrolled: bool,
}

impl Default for ScrollPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_THRESHOLD)
    }
}

impl ScrollPolicy {
    pub fn new(threshold: u32) -> Self {
        Self { threshold, user_scrolled: false }
    }

    pub fn on_scroll(&mut self, viewport: Viewport) {
        self.user_scrolled = viewport.distance_from_bottom() >= self.threshold;
    }

    pub fn decide(&mut self, cause: AppendCause) -> ScrollAction {
        match cause {
            AppendCause::Local => {
                self.user_scrolled = false;
                ScrollAction::ToBottom
            }
            AppendCause::Remote if self.user_scrolled => ScrollAction::Stay,
            AppendCause::Remote => ScrollAction::ToBottom,
        }
    }

    pub fn reset(&mut self) {
        self.user_scrolled = false;
    }
}
