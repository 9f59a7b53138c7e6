use crate::error::{ExportError, ShareError};
use crate::surface::{composite_over, Surface};
use futures::future::LocalBoxFuture;
use image::{ImageFormat, Rgba, RgbaImage};
use std::io::Cursor;

pub const SHARE_FILE_NAME: &str = "drawing.png";
pub const SHARE_MIME_TYPE: &str = "image/png";

/// A flattened PNG ready to hand to a share target
#[derive(Clone, PartialEq, Eq)]
pub struct ExportedImage {
    pub file_name: String,
    pub mime_type: String,
    pub size: [u32; 2],
    pub bytes: Vec<u8>,
}

impl std::fmt::Debug for ExportedImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExportedImage")
            .field("file_name", &self.file_name)
            .field("mime_type", &self.mime_type)
            .field("size", &self.size)
            .field("bytes", &self.bytes.len())
            .finish()
    }
}

/// Composite the surface over an opaque white background
pub fn flatten(pixels: &RgbaImage) -> RgbaImage {
    let mut flattened = RgbaImage::from_pixel(pixels.width(), pixels.height(), Rgba([255, 255, 255, 255]));
    composite_over(&mut flattened, pixels);
    flattened
}

/// Flatten and encode the surface. Neither the surface nor the history is touched.
pub fn export_png<S: Surface + ?Sized>(surface: &S) -> Result<ExportedImage, ExportError> {
    let flattened = flatten(surface.pixels());
    let mut bytes = Vec::new();
    flattened.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)?;
    Ok(ExportedImage {
        file_name: SHARE_FILE_NAME.to_owned(),
        mime_type: SHARE_MIME_TYPE.to_owned(),
        size: [flattened.width(), flattened.height()],
        bytes,
    })
}

/// Platform share mechanism
pub trait ShareTarget {
    fn can_share(&self, image: &ExportedImage) -> bool;

    fn share(&self, image: ExportedImage) -> LocalBoxFuture<'static, Result<(), ShareError>>;
}

/// Hand `image` to `target`, reporting the outcome through the log
pub async fn share_drawing<T: ShareTarget + ?Sized>(target: &T, image: ExportedImage) -> Result<(), ShareError> {
    if !target.can_share(&image) {
        log::warn!("Sharing not supported on this platform");
        return Err(ShareError::Unsupported);
    }
    match target.share(image).await {
        Ok(()) => {
            log::info!("Drawing shared successfully");
            Ok(())
        }
        Err(err) => {
            log::error!("Error sharing drawing: {}", err);
            Err(err)
        }
    }
}

#[cfg(not(target_arch = "wasm32"))]
pub use native::DirectoryShare;

#[cfg(target_arch = "wasm32")]
pub use web::WebShare;

#[cfg(not(target_arch = "wasm32"))]
mod native {
    use super::{ExportedImage, ShareTarget};
    use crate::error::ShareError;
    use futures::future::{self, FutureExt, LocalBoxFuture};
    use std::path::PathBuf;

    /// Shares by writing the image into a directory
    #[derive(Debug, Clone)]
    pub struct DirectoryShare {
        dir: PathBuf,
    }

    impl DirectoryShare {
        pub fn new(dir: impl Into<PathBuf>) -> Self {
            Self { dir: dir.into() }
        }

        pub fn dir(&self) -> &std::path::Path {
            &self.dir
        }
    }

    impl ShareTarget for DirectoryShare {
        fn can_share(&self, _image: &ExportedImage) -> bool {
            self.dir.is_dir()
        }

        fn share(&self, image: ExportedImage) -> LocalBoxFuture<'static, Result<(), ShareError>> {
            let path = self.dir.join(&image.file_name);
            let written = std::fs::write(&path, &image.bytes).map_err(ShareError::from);
            if written.is_ok() {
                log::debug!("Wrote {} ({} bytes)", path.display(), image.bytes.len());
            }
            future::ready(written).boxed_local()
        }
    }
}

#[cfg(target_arch = "wasm32")]
mod web {
    use super::{ExportedImage, ShareTarget};
    use crate::error::ShareError;
    use futures::future::{FutureExt, LocalBoxFuture};
    use wasm_bindgen::JsValue;

    /// Shares through the browser's Web Share API
    #[derive(Debug, Clone, Copy, Default)]
    pub struct WebShare;

    fn share_data(image: &ExportedImage) -> Result<web_sys::ShareData, JsValue> {
        let parts = js_sys::Array::new();
        parts.push(&js_sys::Uint8Array::from(image.bytes.as_slice()));

        let options = web_sys::FilePropertyBag::new();
        options.set_type(&image.mime_type);
        options.set_last_modified(js_sys::Date::now());

        let file = web_sys::File::new_with_u8_array_sequence_and_options(&parts, &image.file_name, &options)?;
        let files = js_sys::Array::new();
        files.push(&file);

        let data = web_sys::ShareData::new();
        js_sys::Reflect::set(&data, &JsValue::from_str("files"), &files)?;
        Ok(data)
    }

    fn describe(value: JsValue) -> String {
        value.as_string().unwrap_or_else(|| format!("{:?}", value))
    }

    impl ShareTarget for WebShare {
        fn can_share(&self, image: &ExportedImage) -> bool {
            let Some(window) = web_sys::window() else {
                return false;
            };
            match share_data(image) {
                Ok(data) => window.navigator().can_share_with_data(&data),
                Err(_) => false,
            }
        }

        fn share(&self, image: ExportedImage) -> LocalBoxFuture<'static, Result<(), ShareError>> {
            async move {
                let window = web_sys::window().ok_or(ShareError::Unsupported)?;
                let data = share_data(&image).map_err(|err| ShareError::Failed(describe(err)))?;
                let promise = window.navigator().share_with_data(&data);
                wasm_bindgen_futures::JsFuture::from(promise)
                    .await
                    .map(|_| ())
                    .map_err(|err| ShareError::Failed(describe(err)))
            }
            .boxed_local()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::decode_png;
    use crate::surface::RasterSurface;
    use egui::{pos2, Color32};
    use futures::executor::block_on;
    use futures::future::{self, FutureExt};
    use std::cell::Cell;

    struct FakeShare {
        supported: bool,
        reject: bool,
        calls: Cell<usize>,
    }

    impl ShareTarget for FakeShare {
        fn can_share(&self, _image: &ExportedImage) -> bool {
            self.supported
        }

        fn share(&self, _image: ExportedImage) -> LocalBoxFuture<'static, Result<(), ShareError>> {
            self.calls.set(self.calls.get() + 1);
            let result = if self.reject {
                Err(ShareError::Failed("AbortError".to_owned()))
            } else {
                Ok(())
            };
            future::ready(result).boxed_local()
        }
    }

    fn fake(supported: bool, reject: bool) -> FakeShare {
        FakeShare {
            supported,
            reject,
            calls: Cell::new(0),
        }
    }

    #[test]
    fn test_flatten_puts_white_beneath_strokes() {
        let mut surface = RasterSurface::new(10, 10);
        surface.set_stroke_color(Color32::RED);
        surface.set_line_width(2.0);
        surface.draw_line_segment(pos2(0.0, 5.0), pos2(10.0, 5.0));

        let flattened = flatten(surface.pixels());
        assert_eq!(flattened.get_pixel(5, 5).0, [255, 0, 0, 255]);
        assert_eq!(flattened.get_pixel(5, 0).0, [255, 255, 255, 255]);
    }

    #[test]
    fn test_export_png_leaves_surface_alone() {
        let mut surface = RasterSurface::new(6, 4);
        surface.set_line_width(2.0);
        surface.draw_line_segment(pos2(0.0, 2.0), pos2(6.0, 2.0));
        let before = surface.clone();

        let exported = export_png(&surface).unwrap();
        assert_eq!(exported.file_name, "drawing.png");
        assert_eq!(exported.mime_type, "image/png");
        assert_eq!(exported.size, [6, 4]);
        assert_eq!(decode_png(&exported.bytes).unwrap(), flatten(before.pixels()));
        assert_eq!(surface.pixels(), before.pixels());
        assert_eq!(surface.version(), before.version());
    }

    #[test]
    fn test_unsupported_share_is_not_attempted() {
        let target = fake(false, false);
        let image = export_png(&RasterSurface::new(2, 2)).unwrap();

        let result = block_on(share_drawing(&target, image));
        assert!(matches!(result, Err(ShareError::Unsupported)));
        assert_eq!(target.calls.get(), 0);
    }

    #[test]
    fn test_rejected_share_is_reported() {
        let target = fake(true, true);
        let image = export_png(&RasterSurface::new(2, 2)).unwrap();

        let result = block_on(share_drawing(&target, image));
        assert!(matches!(result, Err(ShareError::Failed(_))));
        assert_eq!(target.calls.get(), 1);
    }

    #[test]
    fn test_directory_share_writes_file() {
        let dir = std::env::temp_dir().join(format!("sketchboard-share-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let target = DirectoryShare::new(&dir);
        let image = export_png(&RasterSurface::new(3, 3)).unwrap();
        let bytes = image.bytes.clone();

        block_on(share_drawing(&target, image)).unwrap();
        assert_eq!(std::fs::read(dir.join(SHARE_FILE_NAME)).unwrap(), bytes);
        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_directory_share_without_directory_is_unsupported() {
        let target = DirectoryShare::new("/definitely/not/a/real/dir");
        let image = export_png(&RasterSurface::new(1, 1)).unwrap();
        assert!(matches!(block_on(share_drawing(&target, image)), Err(ShareError::Unsupported)));
    }
}
