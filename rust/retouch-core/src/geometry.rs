//! Page geometry: absolute element rectangles across nested frames, and the
//! placement rules for the floating controls.

use serde::{Deserialize, Serialize};

use crate::Dom;

/// An axis-aligned rectangle in CSS pixels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    pub fn right(&self) -> f64 {
        self.left + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.top + self.height
    }
}

/// A pair of horizontal/vertical offsets (scroll positions, borders).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Offset {
    pub x: f64,
    pub y: f64,
}

impl Offset {
    pub const ZERO: Offset = Offset { x: 0.0, y: 0.0 };

    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Width and height of a rendered control.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

/// A position in absolute page coordinates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

/// The visible region of the top-level page, in page coordinates.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Viewport {
    /// Current scroll of the top document
    pub scroll: Offset,
    /// Size of the visible area
    pub size: Size,
}

/// The first non-zero of the given offsets, matching how browsers expose
/// scroll positions inconsistently between the window, root and body.
pub fn first_nonzero(candidates: &[f64]) -> f64 {
    candidates
        .iter()
        .copied()
        .find(|value| *value != 0.0 && !value.is_nan())
        .unwrap_or(0.0)
}

/// Resolve the element's rectangle in the coordinate space of the top-level
/// page.
///
/// The element's own rectangle is offset by its document's scroll (less the
/// root element's client edge), and then by each enclosing frame's rectangle
/// and that frame's parent document scroll, up to the top document.
pub fn absolute_rect<D: Dom>(dom: &D, element: &D::Node) -> Rect {
    let local = dom.bounding_rect(element);
    let Some(document) = dom.owner_document(element) else {
        return local;
    };

    let scroll = dom.scroll_offset(&document);
    let edge = dom.client_edge(&document);

    let mut x = local.left + scroll.x - edge.x;
    let mut y = local.top + scroll.y - edge.y;

    let mut frame = dom.frame_element(&document);
    while let Some(frame_element) = frame {
        let frame_rect = dom.bounding_rect(&frame_element);
        x += frame_rect.left;
        y += frame_rect.top;

        let Some(parent) = dom.owner_document(&frame_element) else {
            break;
        };
        let parent_scroll = dom.scroll_offset(&parent);
        x += parent_scroll.x;
        y += parent_scroll.y;

        frame = dom.frame_element(&parent);
    }

    Rect::new(x, y, local.width, local.height)
}

/// Where to put a control so its bottom-right corner meets the surface's.
pub fn anchor_bottom_right(surface: Rect, control: Size) -> Point {
    Point {
        x: surface.right() - control.width,
        y: surface.bottom() - control.height,
    }
}

/// Where to put a floating panel relative to the surface it describes.
///
/// The panel goes above the surface, separated by `gap`. If that would push
/// it above the visible area it goes below instead. Horizontally it starts at
/// the surface's left edge and is clamped to stay within the viewport.
pub fn place_panel(target: Rect, panel: Size, viewport: Viewport, gap: f64) -> Point {
    let above = target.top - panel.height - gap;
    let y = if above >= viewport.scroll.y {
        above
    } else {
        target.bottom() + gap
    };

    let min_x = viewport.scroll.x + gap;
    let max_x = viewport.scroll.x + viewport.size.width - panel.width - gap;
    let x = if max_x < min_x {
        min_x
    } else {
        target.left.clamp(min_x, max_x)
    };

    Point { x, y }
}
