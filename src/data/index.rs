use std::collections::HashMap;
use std::path::{Path, PathBuf};

use image::DynamicImage;

use super::loader;
use super::model::{Annotation, Category, ImageId, ImageInfo, RawSnapshot};
use crate::error::{DatasetError, Result};

/// Raw COCO annotations grouped by image.
///
/// Image order is the order in which each image id first appears in the
/// annotation list; per-image annotation order is preserved.
#[derive(Debug, Clone)]
pub struct AnnotationIndex {
    categories: Vec<Category>,
    order: Vec<ImageId>,
    by_image: HashMap<ImageId, Vec<Annotation>>,
    images: HashMap<ImageId, ImageInfo>,
}

impl AnnotationIndex {
    pub fn build(raw: RawSnapshot) -> Self {
        let mut order = Vec::new();
        let mut by_image: HashMap<ImageId, Vec<Annotation>> = HashMap::new();

        for ann in raw.annotations {
            let Some(image_id) = ann.image_id else {
                log::warn!(
                    "Skipping annotation of category {} without image_id",
                    ann.category_id
                );
                continue;
            };
            by_image
                .entry(image_id)
                .or_insert_with(|| {
                    order.push(image_id);
                    Vec::new()
                })
                .push(ann);
        }

        let images = raw.images.into_iter().map(|img| (img.id, img)).collect();

        log::debug!("Indexed annotations for {} images", order.len());
        AnnotationIndex {
            categories: raw.categories,
            order,
            by_image,
            images,
        }
    }

    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    /// Ids of every image that has at least one annotation.
    pub fn image_ids(&self) -> &[ImageId] {
        &self.order
    }

    /// Annotations of one image; empty when the image has none.
    pub fn annotations(&self, id: ImageId) -> &[Annotation] {
        self.by_image.get(&id).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn image_info(&self, id: ImageId) -> Result<&ImageInfo> {
        self.images.get(&id).ok_or(DatasetError::NotFound(id))
    }

    pub fn image_path(&self, dataset_root: &Path, id: ImageId) -> Result<PathBuf> {
        let info = self.image_info(id)?;
        Ok(loader::image_path(dataset_root, &info.file_name))
    }

    /// Pixel data and annotations of one image.
    pub fn load_image(
        &self,
        dataset_root: &Path,
        id: ImageId,
    ) -> Result<(DynamicImage, &[Annotation])> {
        let path = self.image_path(dataset_root, id)?;
        let image = loader::load_image(&path)?;
        Ok((image, self.annotations(id)))
    }
}
