use std::collections::{BTreeMap, BTreeSet};

use image::Rgba;
use palette::{Hsl, IntoColor, Srgb};

use crate::data::model::CategoryId;

// ---------------------------------------------------------------------------
// Color palette generator
// ---------------------------------------------------------------------------

/// Generates `n` visually distinct colours using evenly spaced hues.
pub fn generate_palette(n: usize) -> Vec<Rgba<u8>> {
    if n == 0 {
        return Vec::new();
    }
    (0..n)
        .map(|i| {
            let hue = (i as f32 / n as f32) * 360.0;
            let hsl = Hsl::new(hue, 0.75, 0.45);
            let rgb: Srgb = hsl.into_color();
            Rgba([
                (rgb.red * 255.0) as u8,
                (rgb.green * 255.0) as u8,
                (rgb.blue * 255.0) as u8,
                255,
            ])
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Color mapping: category → box colour
// ---------------------------------------------------------------------------

/// Maps each category of a dataset to a distinct box colour.
#[derive(Debug, Clone)]
pub struct CategoryColors {
    mapping: BTreeMap<CategoryId, Rgba<u8>>,
    default_color: Rgba<u8>,
}

impl CategoryColors {
    pub fn new(categories: &BTreeSet<CategoryId>) -> Self {
        let palette = generate_palette(categories.len());
        let mapping = categories.iter().copied().zip(palette).collect();

        CategoryColors {
            mapping,
            default_color: Rgba([0, 128, 0, 255]),
        }
    }

    pub fn color_for(&self, category: CategoryId) -> Rgba<u8> {
        self.mapping
            .get(&category)
            .copied()
            .unwrap_or(self.default_color)
    }
}
