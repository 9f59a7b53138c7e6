use crate::error::SnapshotError;
use crate::history::History;
use crate::surface::Surface;
use egui::{Color32, Pos2};
use std::ops::RangeInclusive;

pub const DEFAULT_LINE_WIDTH: f32 = 5.0;
pub const DEFAULT_MIN_LINE_WIDTH: f32 = 1.0;
pub const DEFAULT_MAX_LINE_WIDTH: f32 = 100.0;

/// Color and width applied to every segment of a stroke
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StrokeStyle {
    pub color: Color32,
    pub width: f32,
}

impl Default for StrokeStyle {
    fn default() -> Self {
        Self {
            color: Color32::BLACK,
            width: DEFAULT_LINE_WIDTH,
        }
    }
}

/// Transient state of the gesture in progress
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum StrokeState {
    #[default]
    Idle,
    /// Painting; `current` is where the next segment starts
    Drawing { current: Pos2 },
}

/// Turns a pointer gesture into line segments and marks action boundaries.
///
/// Every action records a snapshot before its first pixel is drawn.
#[derive(Debug, Clone)]
pub struct StrokeController {
    state: StrokeState,
    style: StrokeStyle,
    width_range: RangeInclusive<f32>,
}

impl Default for StrokeController {
    fn default() -> Self {
        Self::new(StrokeStyle::default(), DEFAULT_MIN_LINE_WIDTH..=DEFAULT_MAX_LINE_WIDTH)
    }
}

impl StrokeController {
    /// Creates an idle controller. An empty or non-finite width range falls
    /// back to the default range.
    pub fn new(style: StrokeStyle, width_range: RangeInclusive<f32>) -> Self {
        let (min, max) = (*width_range.start(), *width_range.end());
        let width_range = if min.is_finite() && max.is_finite() && min <= max {
            width_range
        } else {
            log::warn!("Invalid line width range {}..={}, using defaults", min, max);
            DEFAULT_MIN_LINE_WIDTH..=DEFAULT_MAX_LINE_WIDTH
        };
        let mut controller = Self {
            state: StrokeState::Idle,
            style: StrokeStyle::default(),
            width_range,
        };
        controller.set_color(style.color);
        controller.set_line_width(style.width);
        controller
    }

    /// Returns the current gesture state
    pub fn state(&self) -> StrokeState {
        self.state
    }

    /// Returns true while a stroke is in progress
    pub fn is_painting(&self) -> bool {
        matches!(self.state, StrokeState::Drawing { .. })
    }

    /// Returns the style applied to new segments
    pub fn style(&self) -> StrokeStyle {
        self.style
    }

    /// Sets the color for subsequent segments
    pub fn set_color(&mut self, color: Color32) {
        self.style.color = color;
    }

    /// Set the stroke width, clamped to the configured range. Non-finite widths are ignored.
    pub fn set_line_width(&mut self, width: f32) {
        if !width.is_finite() {
            log::warn!("Ignoring non-finite line width {}", width);
            return;
        }
        self.style.width = width.clamp(*self.width_range.start(), *self.width_range.end());
    }

    /// Start a new action at `point`. The pre-action snapshot is recorded
    /// first; if that fails the controller stays idle.
    pub fn begin_action<S: Surface + 'static>(
        &mut self,
        point: Pos2,
        history: &mut History<S>,
    ) -> Result<(), SnapshotError> {
        history.record()?;
        self.state = StrokeState::Drawing { current: point };
        Ok(())
    }

    /// Draw from the current point to `point`. Returns false when not painting.
    pub fn continue_action<S: Surface + ?Sized>(&mut self, point: Pos2, surface: &mut S) -> bool {
        let StrokeState::Drawing { current } = self.state else {
            return false;
        };
        surface.set_stroke_color(self.style.color);
        surface.set_line_width(self.style.width);
        surface.draw_line_segment(current, point);
        self.state = StrokeState::Drawing { current: point };
        true
    }

    /// Finish the gesture; the next begin starts a fresh path
    pub fn end_action(&mut self) {
        self.state = StrokeState::Idle;
    }

    /// Clear the whole surface as its own undoable action
    pub fn clear<S: Surface + 'static>(&mut self, history: &mut History<S>) -> Result<(), SnapshotError> {
        self.end_action();
        history.record()?;
        history.surface().borrow_mut().clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::SnapshotStore;
    use crate::surface::RasterSurface;
    use egui::pos2;

    fn history() -> History<RasterSurface> {
        History::new(RasterSurface::new(32, 32).into_handle(), SnapshotStore::default())
    }

    #[test]
    fn test_continue_without_begin_is_noop() {
        let history = history();
        let mut controller = StrokeController::default();

        let drew = controller.continue_action(pos2(5.0, 5.0), &mut *history.surface().borrow_mut());
        assert!(!drew);
        assert!(history.surface().borrow().is_blank());
    }

    #[test]
    fn test_begin_records_before_drawing() {
        let mut history = history();
        let mut controller = StrokeController::default();

        controller.begin_action(pos2(4.0, 4.0), &mut history).unwrap();
        assert_eq!(history.undo_depth(), 1);
        assert_eq!(controller.state(), StrokeState::Drawing { current: pos2(4.0, 4.0) });
        // Nothing drawn yet
        assert!(history.surface().borrow().is_blank());
    }

    #[test]
    fn test_segments_use_active_style() {
        let mut history = history();
        let mut controller = StrokeController::default();
        controller.set_color(Color32::BLUE);
        controller.set_line_width(3.0);

        controller.begin_action(pos2(4.0, 16.0), &mut history).unwrap();
        controller.continue_action(pos2(28.0, 16.0), &mut *history.surface().borrow_mut());
        controller.end_action();

        let surface = history.surface().borrow();
        assert_eq!(surface.pixel(16, 16), Some([0, 0, 255, 255]));
        assert_eq!(surface.line_width(), 3.0);
        assert_eq!(controller.state(), StrokeState::Idle);
    }

    #[test]
    fn test_end_prevents_joining_strokes() {
        let mut history = history();
        let mut controller = StrokeController::default();
        controller.set_line_width(1.0);

        controller.begin_action(pos2(2.0, 2.0), &mut history).unwrap();
        controller.continue_action(pos2(2.0, 10.0), &mut *history.surface().borrow_mut());
        controller.end_action();

        controller.begin_action(pos2(20.0, 20.0), &mut history).unwrap();
        controller.continue_action(pos2(20.0, 28.0), &mut *history.surface().borrow_mut());
        controller.end_action();

        // A joined path would cross the diagonal between the strokes
        assert_eq!(history.surface().borrow().pixel(11, 15), Some([0, 0, 0, 0]));
        assert_eq!(history.undo_depth(), 2);
    }

    #[test]
    fn test_line_width_is_clamped() {
        let mut controller = StrokeController::new(StrokeStyle::default(), 1.0..=50.0);
        controller.set_line_width(0.0);
        assert_eq!(controller.style().width, 1.0);
        controller.set_line_width(80.0);
        assert_eq!(controller.style().width, 50.0);
        controller.set_line_width(f32::NAN);
        assert_eq!(controller.style().width, 50.0);
    }

    #[test]
    fn test_inverted_width_range_falls_back_to_default() {
        let mut controller = StrokeController::new(StrokeStyle::default(), 10.0..=5.0);
        controller.set_line_width(80.0);
        assert_eq!(controller.style().width, 80.0);

        let mut controller = StrokeController::new(StrokeStyle::default(), f32::NAN..=5.0);
        controller.set_line_width(0.0);
        assert_eq!(controller.style().width, DEFAULT_MIN_LINE_WIDTH);
    }

    #[test]
    fn test_clear_is_an_action_boundary() {
        let mut history = history();
        let mut controller = StrokeController::default();
        controller.begin_action(pos2(1.0, 1.0), &mut history).unwrap();
        controller.continue_action(pos2(30.0, 30.0), &mut *history.surface().borrow_mut());

        controller.clear(&mut history).unwrap();
        assert!(!controller.is_painting());
        assert_eq!(history.undo_depth(), 2);
        assert!(history.surface().borrow().is_blank());
    }
}
