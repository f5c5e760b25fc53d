use std::path::PathBuf;

use image::DynamicImage;

use crate::data::loader;
use crate::data::model::{CategoryMap, ImageId, ImageRecord, Snapshot};
use crate::error::{DatasetError, Result};

// ---------------------------------------------------------------------------
// Spatial dataset: a snapshot bound to its image directory
// ---------------------------------------------------------------------------

/// A loaded snapshot plus the dataset root its images live under.
pub struct SpatialDataset {
    /// Directory holding `val2014/`.
    pub root: PathBuf,

    pub snapshot: Snapshot,

    /// Category names resolved once at load time.
    pub categories: CategoryMap,
}

impl SpatialDataset {
    pub fn new(root: impl Into<PathBuf>, snapshot: Snapshot) -> Self {
        let categories = snapshot.category_map();
        Self {
            root: root.into(),
            snapshot,
            categories,
        }
    }

    /// Load a snapshot from a local path or `https://` URL.
    pub fn open(root: impl Into<PathBuf>, source: &str) -> Result<Self> {
        let snapshot = loader::load_snapshot(source)?;
        Ok(Self::new(root, snapshot))
    }

    pub fn len(&self) -> usize {
        self.snapshot.len()
    }

    /// Image id at `index` in snapshot order.
    pub fn image_id(&self, index: usize) -> Result<ImageId> {
        self.snapshot
            .image_ids
            .get(index)
            .copied()
            .ok_or(DatasetError::IndexOutOfRange {
                index,
                len: self.len(),
            })
    }

    pub fn record(&self, id: ImageId) -> Result<&ImageRecord> {
        self.snapshot.get(id)
    }

    pub fn image_path(&self, record: &ImageRecord) -> PathBuf {
        loader::image_path(&self.root, &record.file_name)
    }

    /// Pixel data and record of the image at `index`.
    pub fn get(&self, index: usize) -> Result<(ImageId, DynamicImage, &ImageRecord)> {
        let id = self.image_id(index)?;
        let record = self.record(id)?;
        let image = loader::load_image(&self.image_path(record))?;
        Ok((id, image, record))
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::*;
    use crate::data::model::{Annotation, BBox, Category};

    fn dataset(root: &Path) -> SpatialDataset {
        let mut snap = Snapshot::new(vec![Category {
            id: 1,
            name: "person".into(),
            extra: Default::default(),
        }]);
        for (id, name) in [(30, "b.png"), (10, "a.png")] {
            snap.push(
                id,
                ImageRecord {
                    annotations: vec![Annotation::new(1, BBox::new(0.0, 0.0, 1.0, 1.0))],
                    file_name: name.into(),
                    height: 2,
                    width: 3,
                    good_pairs: None,
                },
            );
        }
        SpatialDataset::new(root, snap)
    }

    #[test]
    fn indexes_follow_snapshot_order() {
        let ds = dataset(Path::new("/data/coco"));
        assert_eq!(ds.len(), 2);
        assert_eq!(ds.image_id(0).unwrap(), 30);
        assert_eq!(ds.image_id(1).unwrap(), 10);
        assert!(matches!(
            ds.image_id(2),
            Err(DatasetError::IndexOutOfRange { index: 2, len: 2 })
        ));
        assert_eq!(
            ds.image_path(ds.record(10).unwrap()),
            PathBuf::from("/data/coco/val2014/a.png")
        );
        assert_eq!(ds.categories.name(1).unwrap(), "person");
    }

    #[test]
    fn get_loads_pixels() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("val2014")).unwrap();
        image::RgbImage::new(3, 2)
            .save(dir.path().join("val2014/b.png"))
            .unwrap();

        let ds = dataset(dir.path());
        let (id, image, record) = ds.get(0).unwrap();
        assert_eq!(id, 30);
        assert_eq!((image.width(), image.height()), (3, 2));
        assert_eq!(record.file_name, "b.png");

        assert!(matches!(ds.get(1), Err(DatasetError::Image { .. })));
    }
}
