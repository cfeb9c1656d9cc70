//! Spinner shown while a field's lookup is outstanding.

/// Spinner animation frames.
const SPINNER_FRAMES: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

/// A small inline spinner.
///
/// The spinner does not track activity itself; callers pass whether the
/// field is loading when asking for the frame.
#[derive(Debug, Clone, Default)]
pub struct InlineLoader {
    spinner_state: usize,
}

impl InlineLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance the animation. Call on each tick.
    pub fn tick(&mut self) {
        self.spinner_state = (self.spinner_state + 1) % SPINNER_FRAMES.len();
    }

    /// Get the current frame, or an empty string when not loading.
    pub fn frame(&self, loading: bool) -> &'static str {
        if loading {
            SPINNER_FRAMES[self.spinner_state]
        } else {
            ""
        }
    }
}
