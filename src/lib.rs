#![warn(clippy::all, rust_2018_idioms)]

pub mod app;
pub mod board;
pub mod error;
pub mod event;
pub mod export;
pub mod history;
pub mod input;
pub mod panels;
pub mod settings;
pub mod snapshot;
pub mod stroke;
pub mod surface;
pub mod tasks;

pub use app::SketchApp;
pub use board::{Board, ToolbarAction};
pub use error::{ExportError, SettingsError, ShareError, SnapshotError};
pub use event::{EventBus, EventHandler, HistoryEvent, RestoreDirection};
pub use export::{export_png, share_drawing, ExportedImage, ShareTarget};
pub use history::{History, Restore};
pub use input::{InputEvent, InputMapper, StrokeInput};
pub use settings::Settings;
pub use snapshot::{PngDecoder, Snapshot, SnapshotDecoder, SnapshotStore};
pub use stroke::{StrokeController, StrokeStyle};
pub use surface::{RasterSurface, Surface, SurfaceHandle};
