//! One drawing-surface instance: the surface, its history and the stroke pipeline.
//!
//! Input and toolbar handlers hold a `Board` (or a reference to it) instead of
//! reaching for shared globals, so several boards can coexist and each can be
//! driven without a window.

use crate::error::{ExportError, SnapshotError};
use crate::event::EventHandler;
use crate::export::{export_png, ExportedImage};
use crate::history::{History, Restore};
use crate::input::{InputEvent, InputMapper, StrokeInput};
use crate::settings::Settings;
use crate::snapshot::SnapshotStore;
use crate::stroke::{StrokeController, StrokeStyle};
use crate::surface::{Surface, SurfaceHandle};
use egui::{Color32, Vec2};

/// Actions triggered from the toolbar
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ToolbarAction {
    Clear,
    SetColor(Color32),
    SetLineWidth(f32),
    Undo,
    Redo,
}

#[derive(Debug)]
pub struct Board<S: Surface> {
    history: History<S>,
    controller: StrokeController,
    mapper: InputMapper,
}

impl<S: Surface + 'static> Board<S> {
    /// Creates a board over `surface` with an empty history
    pub fn new(surface: SurfaceHandle<S>, store: SnapshotStore, controller: StrokeController) -> Self {
        Self {
            history: History::new(surface, store),
            controller,
            mapper: InputMapper::default(),
        }
    }

    /// Creates a board using the stroke style and width range from `settings`
    pub fn with_settings(surface: SurfaceHandle<S>, settings: &Settings) -> Self {
        let controller = StrokeController::new(settings.stroke_style(), settings.line_width_range());
        Self::new(surface, SnapshotStore::default(), controller)
    }

    /// Returns the surface being drawn on
    pub fn surface(&self) -> &SurfaceHandle<S> {
        self.history.surface()
    }

    /// Returns the undo/redo history
    pub fn history(&self) -> &History<S> {
        &self.history
    }

    /// Returns the stroke controller
    pub fn controller(&self) -> &StrokeController {
        &self.controller
    }

    /// Returns the active stroke style
    pub fn style(&self) -> StrokeStyle {
        self.controller.style()
    }

    /// Registers a handler for history events
    pub fn subscribe(&self, handler: impl EventHandler + 'static) {
        self.history.subscribe(handler);
    }

    /// Where the surface sits on screen, used to map device coordinates
    pub fn set_surface_offset(&mut self, offset: Vec2) {
        self.mapper.set_surface_offset(offset);
    }

    /// Feed one raw input event through the stroke pipeline.
    ///
    /// A failed pre-action snapshot aborts the action before anything is drawn.
    pub fn handle_input(&mut self, event: &InputEvent) -> Result<(), SnapshotError> {
        let Some(input) = self.mapper.normalize(event) else {
            return Ok(());
        };
        match input {
            StrokeInput::Begin(point) => self.controller.begin_action(point, &mut self.history)?,
            StrokeInput::Continue(point) => {
                let mut surface = self.history.surface().borrow_mut();
                self.controller.continue_action(point, &mut *surface);
            }
            StrokeInput::End => self.controller.end_action(),
        }
        Ok(())
    }

    /// Apply a toolbar action. Undo and redo hand back their pending restore.
    pub fn apply(&mut self, action: ToolbarAction) -> Result<Option<Restore>, SnapshotError> {
        match action {
            ToolbarAction::Clear => self.clear().map(|()| None),
            ToolbarAction::SetColor(color) => {
                self.controller.set_color(color);
                Ok(None)
            }
            ToolbarAction::SetLineWidth(width) => {
                self.controller.set_line_width(width);
                Ok(None)
            }
            ToolbarAction::Undo => self.undo(),
            ToolbarAction::Redo => self.redo(),
        }
    }

    /// Clears the surface as one undoable action
    pub fn clear(&mut self) -> Result<(), SnapshotError> {
        self.controller.clear(&mut self.history)
    }

    /// Ends any stroke in progress and steps back one action
    pub fn undo(&mut self) -> Result<Option<Restore>, SnapshotError> {
        self.controller.end_action();
        self.history.undo()
    }

    /// Ends any stroke in progress and reapplies one undone action
    pub fn redo(&mut self) -> Result<Option<Restore>, SnapshotError> {
        self.controller.end_action();
        self.history.redo()
    }

    /// Returns true if there is an action to undo
    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    /// Returns true if there is an undone action to redo
    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    /// Flattened PNG of the current content
    pub fn export(&self) -> Result<ExportedImage, ExportError> {
        export_png(&*self.history.surface().borrow())
    }
}
