/// Characters ordered from sparsest to densest.
pub const DENSITY_CHARS: [char; 11] = ['.', ',', ':', ';', '+', '*', '?', '%', 'S', '#', '@'];

/// Width of the luminance bucket that maps onto one table entry.
const BUCKET_WIDTH: i32 = 25;

/// A read-only view over [`DENSITY_CHARS`], optionally reversed.
///
/// Reversal never touches the base table; it only flips how indices are read.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DensityTable {
    inverse: bool,
}

impl DensityTable {
    pub fn new(inverse: bool) -> Self {
        Self { inverse }
    }

    pub fn is_inverse(&self) -> bool {
        self.inverse
    }

    pub fn len(&self) -> usize {
        DENSITY_CHARS.len()
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    /// Character at `index` as seen through this view.
    pub fn get(&self, index: usize) -> Option<char> {
        if index >= DENSITY_CHARS.len() {
            return None;
        }
        if self.inverse {
            Some(DENSITY_CHARS[DENSITY_CHARS.len() - 1 - index])
        } else {
            Some(DENSITY_CHARS[index])
        }
    }

    /// Map a luminance value plus an additive bias to a character.
    ///
    /// The biased value is clamped to `0..=255` before bucketing, so the
    /// resulting index is always within `0..=10`.
    pub fn map(&self, luminance: u8, bias: i32) -> char {
        let adjusted = i32::from(luminance).saturating_add(bias).clamp(0, 255);
        let index = (adjusted / BUCKET_WIDTH) as usize;
        let index = index.min(DENSITY_CHARS.len() - 1);
        if self.inverse {
            DENSITY_CHARS[DENSITY_CHARS.len() - 1 - index]
        } else {
            DENSITY_CHARS[index]
        }
    }
}

/// Convenience wrapper around [`DensityTable::map`].
pub fn map_intensity(luminance: u8, bias: i32, inverse: bool) -> char {
    DensityTable::new(inverse).map(luminance, bias)
}
