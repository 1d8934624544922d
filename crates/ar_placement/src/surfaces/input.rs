//! Touch input and screen-space UI regions.
use glam::Vec2;

use crate::surfaces::UiHitTest;

/// Lifecycle phase of a touch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TouchPhase {
    Began,
    Moved,
    Stationary,
    Ended,
    Canceled,
}

/// A touch sample in screen pixels (origin top-left).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Touch {
    pub position: Vec2,
    pub phase: TouchPhase,
}

impl Touch {
    pub fn new(position: Vec2, phase: TouchPhase) -> Self {
        Self { position, phase }
    }

    /// A finger lifting off at `position`.
    pub fn ended(position: Vec2) -> Self {
        Self::new(position, TouchPhase::Ended)
    }

    /// A finger touching down at `position`.
    pub fn began(position: Vec2) -> Self {
        Self::new(position, TouchPhase::Began)
    }
}

/// Axis-aligned rectangle in screen pixels, inclusive on all edges.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScreenRect {
    pub min: Vec2,
    pub max: Vec2,
}

impl ScreenRect {
    pub fn new(min: Vec2, max: Vec2) -> Self {
        Self {
            min: min.min(max),
            max: min.max(max),
        }
    }

    pub fn from_origin_size(origin: Vec2, size: Vec2) -> Self {
        Self::new(origin, origin + size)
    }

    pub fn contains(&self, point: Vec2) -> bool {
        point.cmpge(self.min).all() && point.cmple(self.max).all()
    }
}

impl UiHitTest for [ScreenRect] {
    fn is_over_interactive_ui(&self, point: Vec2) -> bool {
        self.iter().any(|rect| rect.contains(point))
    }
}

impl UiHitTest for Vec<ScreenRect> {
    fn is_over_interactive_ui(&self, point: Vec2) -> bool {
        self.as_slice().is_over_interactive_ui(point)
    }
}
