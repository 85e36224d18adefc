use eframe::egui;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ImageLoadError {
    #[error("Failed to read image file: {0}")]
    Read(#[from] std::io::Error),

    #[error("Failed to decode image: {0}")]
    Decode(#[from] image::ImageError),

    #[error("Dropped file is not a supported type: {0}")]
    Unsupported(String),

    #[error("Dropped file has no accessible data: {0}")]
    NoData(String),

    #[error("Image {0} has no pixels")]
    Empty(String),
}

/// A decoded picture ready to be shown on a canvas.
pub struct LoadedImage {
    pub name: String,
    pub pixels: egui::ColorImage,
}

impl LoadedImage {
    /// Size in image pixels, which is the world size of the canvas showing it.
    pub fn world_size(&self) -> egui::Vec2 {
        egui::vec2(self.pixels.size[0] as f32, self.pixels.size[1] as f32)
    }
}

impl std::fmt::Debug for LoadedImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoadedImage")
            .field("name", &self.name)
            .field("size", &self.pixels.size)
            .finish()
    }
}

/// Decodes image bytes with the `image` crate.
pub fn decode_image(name: impl Into<String>, bytes: &[u8]) -> Result<LoadedImage, ImageLoadError> {
    let name = name.into();
    let rgba = image::load_from_memory(bytes)?.to_rgba8();
    let (width, height) = rgba.dimensions();
    if width == 0 || height == 0 {
        return Err(ImageLoadError::Empty(name));
    }
    log::debug!("Decoded image {}: {}x{}", name, width, height);
    let pixels = egui::ColorImage::from_rgba_unmultiplied([width as usize, height as usize], rgba.as_raw());
    Ok(LoadedImage { name, pixels })
}

/// Collects files dropped onto the window.
#[derive(Debug, Default)]
pub struct FileHandler {
    dropped_files: Vec<egui::DroppedFile>,
}

impl FileHandler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Picks up files dropped this frame. Returns true if there are any.
    pub fn check_for_dropped_files(&mut self, ctx: &egui::Context) -> bool {
        ctx.input(|i| {
            if !i.raw.dropped_files.is_empty() {
                self.dropped_files = i.raw.dropped_files.clone();
            }
        });
        !self.dropped_files.is_empty()
    }

    /// Decodes the pending dropped files, dropping the ones that fail.
    pub fn take_images(&mut self) -> Vec<LoadedImage> {
        std::mem::take(&mut self.dropped_files)
            .iter()
            .filter_map(|file| match load_dropped_file(file) {
                Ok(image) => {
                    log::info!("Loaded image {}", image.name);
                    Some(image)
                }
                Err(err) => {
                    log::error!("{}", err);
                    None
                }
            })
            .collect()
    }

    /// Shows an overlay listing the files being dragged over the window.
    pub fn preview_files_being_dropped(&self, ctx: &egui::Context) {
        use egui::{Align2, Color32, Id, LayerId, Order, TextStyle};

        if ctx.input(|i| i.raw.hovered_files.is_empty()) {
            return;
        }

        let text = ctx.input(|i| {
            let mut text = "Dropping files:\n".to_owned();
            for file in &i.raw.hovered_files {
                match &file.path {
                    Some(path) => text += &format!("\n{}", path.display()),
                    None => text += "\n(Path not available)",
                }
            }
            text
        });

        let painter = ctx.layer_painter(LayerId::new(Order::Foreground, Id::new("file_drop_target")));
        let screen_rect = ctx.screen_rect();
        painter.rect_filled(screen_rect, 0.0, Color32::from_black_alpha(192));
        painter.text(
            screen_rect.center(),
            Align2::CENTER_CENTER,
            text,
            TextStyle::Heading.resolve(&ctx.style()),
            Color32::WHITE,
        );
    }
}

fn file_name(file: &egui::DroppedFile) -> String {
    if let Some(path) = &file.path {
        path.display().to_string()
    } else if !file.name.is_empty() {
        file.name.clone()
    } else {
        "unknown".to_owned()
    }
}

/// Checks the MIME type, falling back to the extension.
fn is_image_file(file: &egui::DroppedFile) -> bool {
    if !file.mime.is_empty() {
        return file.mime.starts_with("image/");
    }
    file.path
        .as_ref()
        .and_then(|path| path.extension())
        .map(|ext| ext.to_string_lossy().to_lowercase())
        .is_some_and(|ext| matches!(ext.as_str(), "png" | "jpg" | "jpeg" | "gif" | "webp" | "bmp" | "tif" | "tiff"))
}

fn load_dropped_file(file: &egui::DroppedFile) -> Result<LoadedImage, ImageLoadError> {
    let name = file_name(file);
    if !is_image_file(file) {
        return Err(ImageLoadError::Unsupported(name));
    }
    if let Some(bytes) = &file.bytes {
        return decode_image(name, bytes);
    }
    match &file.path {
        Some(path) => {
            let bytes = std::fs::read(path)?;
            decode_image(name, &bytes)
        }
        None => Err(ImageLoadError::NoData(name)),
    }
}
