//! Viewport geometry
//!
//! Answers a single question: is the trailing edge of the content within
//! `buffer` pixels of the trailing edge of the viewport? Covers both content
//! that is shorter than the viewport and content that has been scrolled near
//! its end.

/// A snapshot of the numbers needed to decide whether more content is needed
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ViewportGeometry {
    /// Distance scrolled from the top of the scroll container
    pub scroll_offset: f64,
    /// Visible height of the scroll container
    pub viewport_size: f64,
    /// Trailing edge of the tracked content, relative to the scroll container
    pub content_extent: f64,
}

impl ViewportGeometry {
    /// Create a geometry snapshot
    pub fn new(scroll_offset: f64, viewport_size: f64, content_extent: f64) -> Self {
        Self {
            scroll_offset,
            viewport_size,
            content_extent,
        }
    }

    /// Position of the viewport's trailing edge (`scroll_offset + viewport_size`)
    pub fn scroll_extent(&self) -> f64 {
        scroll_extent(self.scroll_offset, self.viewport_size)
    }

    /// See [`needs_more`]
    pub fn needs_more(&self, buffer: f64) -> bool {
        needs_more(
            self.scroll_offset,
            self.viewport_size,
            self.content_extent,
            buffer,
        )
    }
}

/// Returns true when the content's trailing edge is at most `buffer` pixels
/// beyond the viewport's trailing edge.
///
/// Negative numbers are clamped to zero. Non-finite numbers mean the geometry
/// could not be measured, which answers `false` so nothing is fetched.
pub fn needs_more(scroll_offset: f64, viewport_size: f64, content_extent: f64, buffer: f64) -> bool {
    let (Some(offset), Some(viewport), Some(content), Some(buffer)) = (
        clamp(scroll_offset),
        clamp(viewport_size),
        clamp(content_extent),
        clamp(buffer),
    ) else {
        return false;
    };

    content <= offset + viewport + buffer
}

/// Trailing edge of the viewport. Negative or non-finite inputs count as zero.
pub fn scroll_extent(scroll_offset: f64, viewport_size: f64) -> f64 {
    clamp(scroll_offset).unwrap_or(0.0) + clamp(viewport_size).unwrap_or(0.0)
}

fn clamp(value: f64) -> Option<f64> {
    if value.is_finite() {
        Some(value.max(0.0))
    } else {
        None
    }
}
