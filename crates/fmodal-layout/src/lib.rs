#![forbid(unsafe_code)]

//! Panel and overlay geometry for FrankenModal.
//!
//! Pure functions from viewport/scroll state and a requested panel size to
//! the rectangles the modal applies. Nothing here touches a document.
//!
//! # Invariants
//!
//! - The overlay always spans the whole scrollable document at the origin,
//!   independent of the panel.
//! - Each axis is solved independently. A panel that fits (including twice
//!   its offset) keeps its requested size and is centred, shifted by the
//!   offset. A panel that does not fit is clamped to `viewport - 2 * offset`
//!   (never below zero) with a zero margin.
//! - `actual_*` always carry the requested size so overflow can be detected
//!   after clamping.
//!
//! # Failure Modes
//!
//! - An offset larger than half the viewport clamps the panel to zero size.
//!   The panel then renders empty; callers are expected to keep offsets small.
//! - A fitting panel with a large offset gets a negative margin, placing it
//!   partially off-screen.

use fmodal_core::geometry::{Point, Rect, Size};

/// Requested panel size and offsets, already resolved against defaults.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PanelRequest {
    pub width: f64,
    pub height: f64,
    pub x_offset: f64,
    pub y_offset: f64,
}

impl PanelRequest {
    /// A request with zero offsets.
    pub const fn new(width: f64, height: f64) -> Self {
        Self {
            width,
            height,
            x_offset: 0.0,
            y_offset: 0.0,
        }
    }

    /// Set both offsets.
    #[must_use]
    pub const fn offset(mut self, x: f64, y: f64) -> Self {
        self.x_offset = x;
        self.y_offset = y;
        self
    }
}

/// Computed panel dimensions and margins.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PanelGeometry {
    pub x_margin: f64,
    pub y_margin: f64,
    /// Applied (possibly clamped) width.
    pub width: f64,
    /// Applied (possibly clamped) height.
    pub height: f64,
    /// Requested width before clamping.
    pub actual_width: f64,
    /// Requested height before clamping.
    pub actual_height: f64,
}

impl PanelGeometry {
    /// Applied size.
    pub const fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    /// True if either axis had to be clamped to fit the viewport.
    pub fn is_clamped(&self) -> bool {
        self.width < self.actual_width || self.height < self.actual_height
    }
}

/// Panel coordinates to apply. `None` leaves the previous coordinate untouched.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PanelPosition {
    pub left: Option<f64>,
    pub top: Option<f64>,
}

/// Overflow behaviour for the panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Overflow {
    /// Content is larger than the applied panel; always show scrollbars.
    Scroll,
    Auto,
}

impl Overflow {
    /// CSS keyword.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Scroll => "scroll",
            Self::Auto => "auto",
        }
    }
}

/// Overlay rectangle covering the full scrollable document.
#[must_use]
pub fn overlay_rect(scroll_size: Size) -> Rect {
    Rect::from_size(scroll_size)
}

/// Solve one axis: returns `(margin, applied)`.
fn solve_axis(viewport: f64, requested: f64, offset: f64) -> (f64, f64) {
    if viewport >= requested + 2.0 * offset {
        ((viewport - requested) / 2.0 - offset, requested)
    } else {
        (0.0, (viewport - 2.0 * offset).max(0.0))
    }
}

/// Compute the panel geometry for a viewport.
#[must_use]
pub fn panel_geometry(viewport: Size, request: PanelRequest) -> PanelGeometry {
    let (x_margin, width) = solve_axis(viewport.width, request.width, request.x_offset);
    let (y_margin, height) = solve_axis(viewport.height, request.height, request.y_offset);
    PanelGeometry {
        x_margin,
        y_margin,
        width,
        height,
        actual_width: request.width,
        actual_height: request.height,
    }
}

/// Compute where the panel should sit for the current scroll position.
///
/// An axis is only positioned while the requested panel plus both margins,
/// shifted by the scroll offset, still fits in the scrollable document. Past
/// that point the panel keeps its previous coordinate so the user can scroll
/// through oversized content instead of dragging the panel along.
#[must_use]
pub fn panel_position(geometry: &PanelGeometry, scroll: Point, scroll_size: Size) -> PanelPosition {
    let fits = |actual: f64, margin: f64, scroll: f64, extent: f64| {
        actual + margin * 2.0 + scroll <= extent
    };
    PanelPosition {
        left: fits(
            geometry.actual_width,
            geometry.x_margin,
            scroll.x,
            scroll_size.width,
        )
        .then_some(geometry.x_margin + scroll.x),
        top: fits(
            geometry.actual_height,
            geometry.y_margin,
            scroll.y,
            scroll_size.height,
        )
        .then_some(geometry.y_margin + scroll.y),
    }
}

/// Overflow policy for a computed geometry.
#[must_use]
pub fn overflow_policy(geometry: &PanelGeometry) -> Overflow {
    if geometry.is_clamped() {
        Overflow::Scroll
    } else {
        Overflow::Auto
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn centred_in_large_viewport() {
        let geometry = panel_geometry(Size::new(1024.0, 768.0), PanelRequest::new(600.0, 600.0));
        assert_eq!(geometry.x_margin, 212.0);
        assert_eq!(geometry.y_margin, 84.0);
        assert_eq!(geometry.size(), Size::new(600.0, 600.0));
        assert!(!geometry.is_clamped());
    }

    #[test]
    fn narrow_viewport_clamps_width_only() {
        let geometry = panel_geometry(Size::new(500.0, 768.0), PanelRequest::new(600.0, 600.0));
        assert_eq!(geometry.width, 500.0);
        assert_eq!(geometry.x_margin, 0.0);
        assert_eq!(geometry.actual_width, 600.0);
        assert_eq!(geometry.height, 600.0);
        assert_eq!(geometry.y_margin, 84.0);
        assert_eq!(overflow_policy(&geometry), Overflow::Scroll);
    }

    #[test]
    fn odd_difference_keeps_half_pixel() {
        let geometry = panel_geometry(Size::new(1023.0, 600.0), PanelRequest::new(600.0, 600.0));
        assert_eq!(geometry.x_margin, 211.5);
        assert_eq!(geometry.y_margin, 0.0);
        assert_eq!(geometry.height, 600.0);
    }

    #[test]
    fn offsets_shift_margin() {
        let request = PanelRequest::new(600.0, 600.0).offset(10.0, 20.0);
        let geometry = panel_geometry(Size::new(1024.0, 768.0), request);
        assert_eq!(geometry.x_margin, 202.0);
        assert_eq!(geometry.y_margin, 64.0);
        assert_eq!(geometry.width, 600.0);
    }

    #[test]
    fn offsets_that_break_fit_clamp_to_remaining_space() {
        // 600 + 2*100 > 768, so the height is clamped to 768 - 200.
        let request = PanelRequest::new(600.0, 600.0).offset(0.0, 100.0);
        let geometry = panel_geometry(Size::new(1024.0, 768.0), request);
        assert_eq!(geometry.y_margin, 0.0);
        assert_eq!(geometry.height, 568.0);
        assert_eq!(geometry.actual_height, 600.0);
    }

    #[test]
    fn huge_offset_clamps_to_zero() {
        let request = PanelRequest::new(600.0, 600.0).offset(400.0, 0.0);
        let geometry = panel_geometry(Size::new(500.0, 768.0), request);
        assert_eq!(geometry.width, 0.0);
        assert_eq!(geometry.x_margin, 0.0);
    }

    #[test]
    fn overlay_covers_scroll_size() {
        let rect = overlay_rect(Size::new(1024.0, 4000.0));
        assert_eq!(rect, Rect::new(0.0, 0.0, 1024.0, 4000.0));
    }

    #[test]
    fn position_follows_scroll_while_it_fits() {
        let geometry = panel_geometry(Size::new(1024.0, 768.0), PanelRequest::new(600.0, 600.0));
        let position = panel_position(
            &geometry,
            Point::new(0.0, 300.0),
            Size::new(1024.0, 2000.0),
        );
        assert_eq!(position.left, Some(212.0));
        assert_eq!(position.top, Some(384.0));
    }

    #[test]
    fn position_axis_omitted_past_document_end() {
        let geometry = panel_geometry(Size::new(1024.0, 768.0), PanelRequest::new(600.0, 600.0));
        // 600 + 168 + 1300 > 2000.
        let position = panel_position(
            &geometry,
            Point::new(0.0, 1300.0),
            Size::new(1024.0, 2000.0),
        );
        assert_eq!(position.left, Some(212.0));
        assert_eq!(position.top, None);
    }

    #[test]
    fn clamped_panel_in_unscrollable_page_is_not_positioned() {
        // Requested 600 wide in a 500 wide page can never fit.
        let geometry = panel_geometry(Size::new(500.0, 768.0), PanelRequest::new(600.0, 600.0));
        let position = panel_position(&geometry, Point::ORIGIN, Size::new(500.0, 768.0));
        assert_eq!(position.left, None);
        assert_eq!(position.top, Some(84.0));
    }

    #[test]
    fn overflow_auto_when_unclamped() {
        let geometry = panel_geometry(Size::new(800.0, 800.0), PanelRequest::new(200.0, 100.0));
        assert_eq!(overflow_policy(&geometry), Overflow::Auto);
        assert_eq!(Overflow::Auto.as_str(), "auto");
        assert_eq!(Overflow::Scroll.as_str(), "scroll");
    }
}
