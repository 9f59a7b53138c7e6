use crate::board::{Board, ToolbarAction};
use crate::event::{Availability, AvailabilityHandler, HistoryEvent};
use crate::export::{share_drawing, ShareTarget};
use crate::history::Restore;
use crate::input::InputCollector;
use crate::panels::{canvas_panel, toolbar_panel};
use crate::settings::Settings;
use crate::surface::{RasterSurface, Surface};
use crate::tasks::TaskRunner;
use egui::{TextureHandle, TextureId, TextureOptions, Vec2};
use std::cell::RefCell;
use std::rc::Rc;

/// The eframe application: a toolbar above a single drawing board
pub struct SketchApp {
    settings: Settings,
    /// Created on the first frame, once the available canvas size is known
    board: Option<Board<RasterSurface>>,
    availability: AvailabilityHandler,
    input: InputCollector,
    tasks: TaskRunner,
    share_target: Rc<dyn ShareTarget>,
    canvas_texture: Option<TextureHandle>,
    uploaded_version: Option<u64>,
    /// Last diagnostic worth showing in the toolbar; written by async tasks too
    status: Rc<RefCell<Option<String>>>,
}

impl std::fmt::Debug for SketchApp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SketchApp")
            .field("settings", &self.settings)
            .field("board", &self.board)
            .field("availability", &self.availability.get())
            .finish_non_exhaustive()
    }
}

impl SketchApp {
    /// Called once before the first frame.
    pub fn new(_cc: &eframe::CreationContext<'_>, settings: Settings, share_target: Rc<dyn ShareTarget>) -> Self {
        Self {
            settings,
            board: None,
            availability: AvailabilityHandler::new(),
            input: InputCollector::new(),
            tasks: TaskRunner::new(),
            share_target,
            canvas_texture: None,
            uploaded_version: None,
            status: Rc::new(RefCell::new(None)),
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn board(&self) -> Option<&Board<RasterSurface>> {
        self.board.as_ref()
    }

    pub fn availability(&self) -> Availability {
        self.availability.get()
    }

    pub fn status(&self) -> Option<String> {
        self.status.borrow().clone()
    }

    /// Build the board the first time the canvas size is known
    pub(crate) fn ensure_board(&mut self, available: Vec2) -> &mut Board<RasterSurface> {
        let settings = &self.settings;
        let availability = &self.availability;
        let status = &self.status;
        self.board.get_or_insert_with(|| {
            let [width, height] = settings
                .canvas_size
                .unwrap_or([available.x.max(1.0) as u32, available.y.max(1.0) as u32]);
            log::info!("Creating {}x{} drawing board", width, height);

            let board = Board::with_settings(RasterSurface::new(width, height).into_handle(), settings);
            board.subscribe(availability.clone());
            let status = Rc::clone(status);
            board.subscribe(move |event: &HistoryEvent| {
                if let HistoryEvent::RestoreFailed { direction, reason, .. } = event {
                    *status.borrow_mut() = Some(format!("Could not {}: {}", direction, reason));
                }
            });
            board
        })
    }

    /// Run a toolbar action, scheduling any restore it produces
    pub(crate) fn apply(&mut self, action: ToolbarAction, ctx: &egui::Context) {
        let Some(board) = self.board.as_mut() else {
            return;
        };
        match board.apply(action) {
            Ok(Some(restore)) => self.schedule_restore(restore, ctx),
            Ok(None) => {}
            Err(err) => {
                log::error!("{:?} failed: {}", action, err);
                *self.status.borrow_mut() = Some(err.to_string());
            }
        }
    }

    fn schedule_restore(&self, restore: Restore, ctx: &egui::Context) {
        let ctx = ctx.clone();
        self.tasks.spawn(async move {
            // Failures are logged and reported on the event bus by the history
            let _ = restore.await;
            ctx.request_repaint();
        });
    }

    /// Export the drawing and hand it to the share target
    pub(crate) fn share(&mut self, ctx: &egui::Context) {
        let Some(board) = self.board.as_ref() else {
            return;
        };
        let image = match board.export() {
            Ok(image) => image,
            Err(err) => {
                log::error!("Failed to export drawing: {}", err);
                *self.status.borrow_mut() = Some(err.to_string());
                return;
            }
        };

        let target = Rc::clone(&self.share_target);
        let status = Rc::clone(&self.status);
        let ctx = ctx.clone();
        self.tasks.spawn(async move {
            let message = match share_drawing(&*target, image).await {
                Ok(()) => "Drawing shared".to_owned(),
                Err(err) => err.to_string(),
            };
            *status.borrow_mut() = Some(message);
            ctx.request_repaint();
        });
    }

    /// Feed this frame's pointer and touch events to the board
    pub(crate) fn handle_canvas_input(&mut self, ctx: &egui::Context, canvas: egui::Rect, hovered: bool) {
        let Some(board) = self.board.as_mut() else {
            return;
        };
        board.set_surface_offset(canvas.min.to_vec2());

        let events = ctx.input(|i| i.events.clone());
        for event in self.input.collect(&events, canvas, hovered) {
            if let Err(err) = board.handle_input(&event) {
                log::error!("Dropped stroke, could not record history: {}", err);
            }
        }
    }

    /// Re-upload the raster buffer when the surface changed since the last frame
    pub(crate) fn canvas_texture(&mut self, ctx: &egui::Context) -> Option<(TextureId, Vec2)> {
        let board = self.board.as_ref()?;
        let surface = board.surface().borrow();
        let [width, height] = surface.size();

        if self.uploaded_version != Some(surface.version()) || self.canvas_texture.is_none() {
            let image = egui::ColorImage::from_rgba_unmultiplied(
                [width as usize, height as usize],
                surface.pixels().as_raw(),
            );
            match &mut self.canvas_texture {
                Some(texture) => texture.set(image, TextureOptions::LINEAR),
                None => self.canvas_texture = Some(ctx.load_texture("canvas", image, TextureOptions::LINEAR)),
            }
            self.uploaded_version = Some(surface.version());
        }

        let size = egui::vec2(width as f32, height as f32);
        self.canvas_texture.as_ref().map(|texture| (texture.id(), size))
    }
}

impl eframe::App for SketchApp {
    /// Called each time the UI needs repainting, which may be many times per second.
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.tasks.run_pending();
        toolbar_panel(self, ctx);
        // Toolbar actions may have scheduled restores that are already decodable
        self.tasks.run_pending();
        canvas_panel(self, ctx);
    }
}
