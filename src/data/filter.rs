use std::collections::HashMap;

use super::index::AnnotationIndex;
use super::model::{Annotation, CategoryId, ImageRecord, Snapshot};
use crate::error::Result;

// ---------------------------------------------------------------------------
// Uniqueness filter: keep images with ≥ 2 categories that occur exactly once
// ---------------------------------------------------------------------------

/// Images need this many uniquely-occurring categories to qualify.
pub const MIN_UNIQUE_CATEGORIES: usize = 2;

/// Categories that occur exactly once among `annotations`, in order of
/// first occurrence.
pub fn unique_categories(annotations: &[Annotation]) -> Vec<CategoryId> {
    let mut counts: HashMap<CategoryId, usize> = HashMap::new();
    let mut order = Vec::new();
    for ann in annotations {
        let count = counts.entry(ann.category_id).or_insert(0);
        if *count == 0 {
            order.push(ann.category_id);
        }
        *count += 1;
    }
    order.retain(|cat| counts[cat] == 1);
    order
}

/// The annotations of an image that survive the filter, or `None` when the
/// image does not qualify.  Returned annotations have no segmentation.
pub fn filter_annotations(annotations: &[Annotation]) -> Option<Vec<Annotation>> {
    let unique = unique_categories(annotations);
    if unique.len() < MIN_UNIQUE_CATEGORIES {
        return None;
    }
    Some(
        annotations
            .iter()
            .filter(|ann| unique.contains(&ann.category_id))
            .map(Annotation::stripped)
            .collect(),
    )
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FilterReport {
    pub images_seen: usize,
    pub images_kept: usize,
}

impl FilterReport {
    pub fn images_dropped(&self) -> usize {
        self.images_seen - self.images_kept
    }
}

/// Build the filtered snapshot from indexed raw annotations.
///
/// Non-qualifying images are omitted; a qualifying image without metadata is
/// a `NotFound` error.
pub fn filter_unique(index: &AnnotationIndex) -> Result<(Snapshot, FilterReport)> {
    let mut snapshot = Snapshot::new(index.categories().to_vec());
    let mut report = FilterReport::default();

    for &image_id in index.image_ids() {
        report.images_seen += 1;
        let Some(kept) = filter_annotations(index.annotations(image_id)) else {
            log::debug!("Image {image_id}: fewer than {MIN_UNIQUE_CATEGORIES} unique categories");
            continue;
        };
        let info = index.image_info(image_id)?;
        snapshot.push(image_id, ImageRecord::from_info(info, kept));
        report.images_kept += 1;
    }

    log::info!(
        "Uniqueness filter kept {} of {} images ({} dropped)",
        report.images_kept,
        report.images_seen,
        report.images_dropped()
    );
    Ok((snapshot, report))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::{BBox, ImageId, ImageInfo, RawSnapshot};
    use crate::error::DatasetError;

    fn ann(image_id: ImageId, category_id: CategoryId) -> Annotation {
        let mut a = Annotation::new(category_id, BBox::new(0.0, 0.0, 1.0, 1.0));
        a.image_id = Some(image_id);
        a.segmentation = Some(serde_json::json!([[0, 0, 1, 0, 1, 1]]));
        a
    }

    fn info(id: ImageId) -> ImageInfo {
        ImageInfo {
            id,
            file_name: format!("{id}.jpg"),
            height: 480,
            width: 640,
            extra: Default::default(),
        }
    }

    #[test]
    fn counts_only_single_occurrences() {
        let anns = vec![ann(1, 5), ann(1, 3), ann(1, 5), ann(1, 8), ann(1, 3), ann(1, 2)];
        assert_eq!(unique_categories(&anns), vec![8, 2]);
    }

    #[test]
    fn duplicated_only_image_is_dropped() {
        let anns = vec![ann(1, 5), ann(1, 3), ann(1, 5), ann(1, 3)];
        assert!(unique_categories(&anns).is_empty());
        assert!(filter_annotations(&anns).is_none());
    }

    #[test]
    fn single_unique_category_is_not_enough() {
        let anns = vec![ann(1, 5), ann(1, 3), ann(1, 3)];
        assert!(filter_annotations(&anns).is_none());
    }

    #[test]
    fn filtered_snapshot_holds_unique_stripped_annotations() {
        let raw = RawSnapshot {
            categories: Vec::new(),
            images: vec![info(1), info(2), info(3)],
            annotations: vec![
                ann(1, 5),
                ann(1, 6),
                ann(1, 6),
                ann(1, 7),
                ann(2, 5),
                ann(2, 5),
                ann(3, 1),
                ann(3, 2),
            ],
        };
        let original = raw.annotations.clone();
        let index = AnnotationIndex::build(raw);
        let (snap, report) = filter_unique(&index).unwrap();

        assert_eq!(snap.image_ids, vec![1, 3]);
        assert_eq!(report, FilterReport { images_seen: 3, images_kept: 2 });
        assert_eq!(report.images_dropped(), 1);

        for (id, rec) in snap.iter() {
            assert!(rec.annotations.len() >= MIN_UNIQUE_CATEGORIES);
            for kept in &rec.annotations {
                assert!(kept.segmentation.is_none());
                let occurrences = original
                    .iter()
                    .filter(|a| a.image_id == Some(id) && a.category_id == kept.category_id)
                    .count();
                assert_eq!(occurrences, 1);
            }
        }
        let rec = snap.get(1).unwrap();
        assert_eq!(rec.file_name, "1.jpg");
        assert_eq!((rec.height, rec.width), (480, 640));
        assert!(rec.good_pairs.is_none());
    }

    #[test]
    fn qualifying_image_without_metadata_fails() {
        let raw = RawSnapshot {
            categories: Vec::new(),
            images: Vec::new(),
            annotations: vec![ann(4, 1), ann(4, 2)],
        };
        let index = AnnotationIndex::build(raw);
        assert!(matches!(
            filter_unique(&index),
            Err(DatasetError::NotFound(4))
        ));
    }
}
