use crate::error::SnapshotError;
use crate::surface::{Surface, SurfaceHandle};
use futures::future::{self, FutureExt, LocalBoxFuture};
use image::{ImageFormat, RgbaImage};
use std::io::Cursor;
use std::rc::Rc;
use std::sync::atomic::{AtomicUsize, Ordering};

// Static counter for snapshot ids, only used in diagnostics
static NEXT_SNAPSHOT_ID: AtomicUsize = AtomicUsize::new(1);

/// Lossless encoding of a whole surface at one instant.
///
/// Snapshots are deliberately not `Clone`: each one is owned by exactly one
/// history stack entry or one in-flight restore.
pub struct Snapshot {
    id: usize,
    size: [u32; 2],
    data: Vec<u8>,
}

impl Snapshot {
    /// Encode `pixels` as PNG
    pub fn encode(pixels: &RgbaImage) -> Result<Self, SnapshotError> {
        let mut data = Vec::new();
        pixels
            .write_to(&mut Cursor::new(&mut data), ImageFormat::Png)
            .map_err(SnapshotError::Encode)?;
        Ok(Self::from_encoded([pixels.width(), pixels.height()], data))
    }

    /// Wrap already-encoded bytes. Nothing is validated until the snapshot is decoded.
    pub fn from_encoded(size: [u32; 2], data: Vec<u8>) -> Self {
        Self {
            id: NEXT_SNAPSHOT_ID.fetch_add(1, Ordering::SeqCst),
            size,
            data,
        }
    }

    /// Copy of the encoded content under a fresh id
    pub(crate) fn duplicate(&self) -> Self {
        Self::from_encoded(self.size, self.data.clone())
    }

    pub fn id(&self) -> usize {
        self.id
    }

    pub fn size(&self) -> [u32; 2] {
        self.size
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }
}

impl std::fmt::Debug for Snapshot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Snapshot")
            .field("id", &self.id)
            .field("size", &self.size)
            .field("bytes", &self.data.len())
            .finish()
    }
}

/// Turns a snapshot back into pixels. Decoding may suspend, so the result is a future.
pub trait SnapshotDecoder {
    fn decode(&self, snapshot: &Snapshot) -> LocalBoxFuture<'static, Result<RgbaImage, SnapshotError>>;
}

/// Decodes PNG snapshots in place; the returned future is already resolved
#[derive(Debug, Default, Clone, Copy)]
pub struct PngDecoder;

impl SnapshotDecoder for PngDecoder {
    fn decode(&self, snapshot: &Snapshot) -> LocalBoxFuture<'static, Result<RgbaImage, SnapshotError>> {
        future::ready(decode_png(snapshot.data())).boxed_local()
    }
}

pub fn decode_png(bytes: &[u8]) -> Result<RgbaImage, SnapshotError> {
    image::load_from_memory_with_format(bytes, ImageFormat::Png)
        .map(|decoded| decoded.into_rgba8())
        .map_err(SnapshotError::Decode)
}

/// A restore that could not decode its snapshot. The snapshot is handed
/// back so the caller can decide whether to keep it.
#[derive(Debug)]
pub struct RestoreFailure {
    pub snapshot: Snapshot,
    pub error: SnapshotError,
}

/// Captures and restores full surface content
#[derive(Clone)]
pub struct SnapshotStore {
    decoder: Rc<dyn SnapshotDecoder>,
}

impl Default for SnapshotStore {
    fn default() -> Self {
        Self::new(PngDecoder)
    }
}

impl std::fmt::Debug for SnapshotStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SnapshotStore").finish_non_exhaustive()
    }
}

impl SnapshotStore {
    pub fn new(decoder: impl SnapshotDecoder + 'static) -> Self {
        Self {
            decoder: Rc::new(decoder),
        }
    }

    /// Synchronously encode the current surface content
    pub fn capture<S: Surface + ?Sized>(&self, surface: &S) -> Result<Snapshot, SnapshotError> {
        Snapshot::encode(surface.pixels())
    }

    /// Restore `snapshot` onto the surface once it has been decoded.
    ///
    /// The surface is cleared and redrawn in a single step after decoding
    /// succeeds. If decoding fails the surface is not touched.
    pub fn restore<S: Surface + 'static>(
        &self,
        surface: SurfaceHandle<S>,
        snapshot: Snapshot,
    ) -> LocalBoxFuture<'static, Result<(), RestoreFailure>> {
        let decoding = self.decoder.decode(&snapshot);
        async move {
            match decoding.await {
                Ok(pixels) => {
                    let mut surface = surface.borrow_mut();
                    surface.clear();
                    surface.draw_image(&pixels);
                    log::debug!("Restored snapshot {} ({}x{})", snapshot.id(), pixels.width(), pixels.height());
                    Ok(())
                }
                Err(error) => Err(RestoreFailure { snapshot, error }),
            }
        }
        .boxed_local()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::RasterSurface;
    use egui::{pos2, Color32};
    use futures::executor::block_on;

    fn painted_surface() -> RasterSurface {
        let mut surface = RasterSurface::new(16, 16);
        surface.set_stroke_color(Color32::from_rgb(10, 200, 30));
        surface.set_line_width(4.0);
        surface.draw_line_segment(pos2(2.0, 2.0), pos2(14.0, 12.0));
        surface
    }

    #[test]
    fn test_capture_is_lossless() {
        let surface = painted_surface();
        let store = SnapshotStore::default();

        let snapshot = store.capture(&surface).unwrap();
        assert_eq!(snapshot.size(), [16, 16]);

        let decoded = decode_png(snapshot.data()).unwrap();
        assert_eq!(decoded.as_raw(), surface.pixels().as_raw());
    }

    #[test]
    fn test_snapshot_ids_are_unique() {
        let surface = RasterSurface::new(2, 2);
        let store = SnapshotStore::default();
        let a = store.capture(&surface).unwrap();
        let b = store.capture(&surface).unwrap();
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn test_restore_replaces_content() {
        let store = SnapshotStore::default();
        let snapshot = store.capture(&painted_surface()).unwrap();

        let surface = RasterSurface::new(16, 16).into_handle();
        surface.borrow_mut().set_line_width(16.0);
        surface.borrow_mut().draw_line_segment(pos2(0.0, 8.0), pos2(16.0, 8.0));

        block_on(store.restore(surface.clone(), snapshot)).unwrap();
        assert_eq!(surface.borrow().pixels().as_raw(), painted_surface().pixels().as_raw());
    }

    #[test]
    fn test_corrupt_snapshot_leaves_surface_untouched() {
        let store = SnapshotStore::default();
        let surface = painted_surface().into_handle();
        let version = surface.borrow().version();

        let corrupt = Snapshot::from_encoded([16, 16], b"not a png".to_vec());
        let corrupt_id = corrupt.id();
        let failure = block_on(store.restore(surface.clone(), corrupt)).unwrap_err();

        assert!(matches!(failure.error, SnapshotError::Decode(_)));
        assert_eq!(failure.snapshot.id(), corrupt_id);
        assert_eq!(surface.borrow().version(), version);
    }
}
