//! Speaker color assignment.
//!
//! Colors identify speakers across caption blocks. The map is an explicit value
//! owned by the sync controller and scoped to one track's lifetime; there is no
//! process-global state here, and a track change resets the map.

/// Insertion-ordered map of speaker name to display color.
///
/// Assignment rules:
/// - the first time a speaker is seen, it takes the next unused preset color
/// - once the preset palette is exhausted, colors are synthesized as
///   `hsl(base_hue + hue_shift * overflow_index, 100%, 50%)`, where
///   `overflow_index` counts only speakers beyond the palette
/// - colors are permanent for the lifetime of the map; never reassigned
#[derive(Debug, Clone)]
pub struct SpeakerColorMap {
    palette: Vec<String>,
    base_hue: f32,
    hue_shift: f32,
    assigned: Vec<(String, String)>,
}

impl SpeakerColorMap {
    /// Default hue for the first synthesized overflow color.
    pub const DEFAULT_BASE_HUE: f32 = 210.0;

    /// Default hue step between synthesized overflow colors.
    pub const DEFAULT_HUE_SHIFT: f32 = 137.5;

    /// Create a map backed by a preset palette.
    pub fn new(palette: Vec<String>) -> Self {
        Self {
            palette,
            base_hue: Self::DEFAULT_BASE_HUE,
            hue_shift: Self::DEFAULT_HUE_SHIFT,
            assigned: Vec::new(),
        }
    }

    /// Create a map with custom hue parameters for synthesized colors.
    pub fn with_hues(palette: Vec<String>, base_hue: f32, hue_shift: f32) -> Self {
        Self {
            palette,
            base_hue,
            hue_shift,
            assigned: Vec::new(),
        }
    }

    /// Look up the color for `speaker`, assigning one on first sight.
    pub fn color_for(&mut self, speaker: &str) -> &str {
        if let Some(idx) = self.assigned.iter().position(|(name, _)| name == speaker) {
            return &self.assigned[idx].1;
        }

        let color = match self.palette.get(self.assigned.len()) {
            Some(preset) => preset.clone(),
            None => {
                let overflow_index = (self.assigned.len() - self.palette.len()) as f32;
                let hue = self.base_hue + self.hue_shift * overflow_index;
                format!("hsl({hue}, 100%, 50%)")
            }
        };

        let idx = self.assigned.len();
        self.assigned.push((speaker.to_string(), color));
        &self.assigned[idx].1
    }

    /// The color already assigned to `speaker`, if any.
    pub fn get(&self, speaker: &str) -> Option<&str> {
        self.assigned
            .iter()
            .find(|(name, _)| name == speaker)
            .map(|(_, color)| color.as_str())
    }

    /// Speakers in first-appearance order.
    pub fn speakers(&self) -> impl Iterator<Item = &str> {
        self.assigned.iter().map(|(name, _)| name.as_str())
    }

    /// Forget all assignments. Called when the active track changes.
    pub fn reset(&mut self) {
        self.assigned.clear();
    }
}

impl Default for SpeakerColorMap {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}
