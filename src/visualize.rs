//! Bounding-box overlays for eyeballing a dataset.

use std::path::{Path, PathBuf};

use ab_glyph::{FontVec, PxScale};
use image::{DynamicImage, Rgba, RgbaImage};
use imageproc::drawing::{draw_hollow_rect_mut, draw_text_mut};
use imageproc::rect::Rect;

use crate::color::CategoryColors;
use crate::data::model::{Annotation, CategoryMap};
use crate::error::{DatasetError, Result};

const LABEL_COLOR: Rgba<u8> = Rgba([255, 0, 0, 255]);

/// Fonts tried when the configured one is missing or unreadable.
const FALLBACK_FONTS: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/Library/Fonts/Arial.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
];

#[derive(Debug, Clone)]
pub struct VisConfig {
    pub font_path: Option<PathBuf>,
    pub font_size: f32,
    /// Box outline thickness in pixels.
    pub line_width: u32,
}

impl Default for VisConfig {
    fn default() -> Self {
        Self {
            font_path: None,
            font_size: 25.0,
            line_width: 3,
        }
    }
}

fn read_font(path: &Path) -> Option<FontVec> {
    let data = std::fs::read(path).ok()?;
    FontVec::try_from_vec(data).ok()
}

/// The configured font, else the first readable system font, else `None`.
pub fn load_font(path: Option<&Path>) -> Option<FontVec> {
    if let Some(path) = path {
        match read_font(path) {
            Some(font) => return Some(font),
            None => log::warn!("Cannot load font {}, using a default font", path.display()),
        }
    }
    let font = FALLBACK_FONTS
        .iter()
        .find_map(|candidate| read_font(Path::new(candidate)));
    if font.is_none() {
        log::warn!("No usable font found, labels will not be drawn");
    }
    font
}

/// Draw every annotation's box and category name over a copy of `image`.
pub fn visualize(
    image: &DynamicImage,
    annotations: &[Annotation],
    categories: &CategoryMap,
    config: &VisConfig,
) -> Result<RgbaImage> {
    let mut canvas = image.to_rgba8();
    let colors = CategoryColors::new(&categories.ids());
    let font = load_font(config.font_path.as_deref());
    let scale = PxScale::from(config.font_size);

    for ann in annotations {
        let name = categories.name(ann.category_id)?;
        let x = ann.bbox.x.round() as i32;
        let y = ann.bbox.y.round() as i32;
        let w = ann.bbox.width.round().max(0.0) as u32;
        let h = ann.bbox.height.round().max(0.0) as u32;

        let color = colors.color_for(ann.category_id);
        for t in 0..config.line_width {
            let inner_w = w.saturating_sub(2 * t);
            let inner_h = h.saturating_sub(2 * t);
            if inner_w == 0 || inner_h == 0 {
                break;
            }
            let rect = Rect::at(x + t as i32, y + t as i32).of_size(inner_w, inner_h);
            draw_hollow_rect_mut(&mut canvas, rect, color);
        }

        if let Some(font) = &font {
            draw_text_mut(&mut canvas, LABEL_COLOR, x, y, scale, font, name);
        }
    }

    Ok(canvas)
}

/// Save an image, dropping the alpha channel for JPEG output.
pub fn save_image(image: &DynamicImage, path: &Path) -> Result<()> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let saved = if ext == "jpg" || ext == "jpeg" {
        image.to_rgb8().save(path)
    } else {
        image.save(path)
    };
    saved.map_err(|source| DatasetError::Image {
        path: path.to_path_buf(),
        source,
    })
}
