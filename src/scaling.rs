//! Display scaling policy.
//!
//! Decides how a source image of arbitrary size is shown in the two panes:
//! the "original" pane draws true pixels or nothing, and the preview pane
//! always fills a fixed bound on the longest side.

/// How the preview relates to the source image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreviewMode {
    /// Longest side already equals the bound.
    Native,
    /// Enlarged to the bound.
    Upscale,
    /// Reduced to the bound.
    Downscale,
}

/// Target of the preview pane.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Preview {
    pub mode: PreviewMode,
    pub width: u32,
    pub height: u32,
}

/// What the original-size pane should show.
///
/// When `show` is false the bitmap is not drawn and `width`/`height` are the
/// source dimensions to print in the placeholder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OriginalDisplay {
    pub show: bool,
    pub width: u32,
    pub height: u32,
}

impl OriginalDisplay {
    /// Placeholder text for an image too large to draw natively.
    pub fn placeholder(&self) -> Option<String> {
        (!self.show).then(|| {
            format!(
                "Image too large\n({}x{}px)\n\n→ See resized\nversion",
                self.width, self.height
            )
        })
    }
}

/// Compute the preview target so the longest side equals `bound`.
///
/// Both axes use the same factor `bound / max(width, height)`, floored, so
/// the longer side lands exactly on `bound`. A side never collapses below
/// one pixel. Inputs must be positive.
pub fn decide_preview(width: u32, height: u32, bound: u32) -> Preview {
    debug_assert!(width > 0 && height > 0 && bound > 0);

    let longest = width.max(height);
    let mode = match longest.cmp(&bound) {
        std::cmp::Ordering::Equal => {
            return Preview {
                mode: PreviewMode::Native,
                width,
                height,
            };
        }
        std::cmp::Ordering::Less => PreviewMode::Upscale,
        std::cmp::Ordering::Greater => PreviewMode::Downscale,
    };

    Preview {
        mode,
        width: scale_side(width, bound, longest),
        height: scale_side(height, bound, longest),
    }
}

/// Decide whether the original pane draws the bitmap at native size.
pub fn decide_original_display(width: u32, height: u32, bound: u32) -> OriginalDisplay {
    OriginalDisplay {
        show: width.max(height) <= bound,
        width,
        height,
    }
}

// floor(side * bound / longest) in integer math, so the factor is exact.
fn scale_side(side: u32, bound: u32, longest: u32) -> u32 {
    let scaled = u64::from(side) * u64::from(bound) / u64::from(longest);
    u32::try_from(scaled).unwrap_or(u32::MAX).max(1)
}
