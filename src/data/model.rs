use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};

use crate::error::{DatasetError, Result};

pub type ImageId = u64;
pub type CategoryId = u64;

// ---------------------------------------------------------------------------
// Category
// ---------------------------------------------------------------------------

/// One entry of the COCO `categories` list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    /// `supercategory` and anything else the source file carries.
    #[serde(flatten)]
    pub extra: Map<String, JsonValue>,
}

/// Category id → human-readable name.
#[derive(Debug, Clone, Default)]
pub struct CategoryMap {
    names: BTreeMap<CategoryId, String>,
}

impl CategoryMap {
    pub fn new(categories: &[Category]) -> Self {
        let names = categories
            .iter()
            .map(|cat| (cat.id, cat.name.clone()))
            .collect();
        CategoryMap { names }
    }

    pub fn name(&self, id: CategoryId) -> Result<&str> {
        self.names
            .get(&id)
            .map(String::as_str)
            .ok_or(DatasetError::UnknownCategory(id))
    }

    /// Names for a list of annotations, in the same order.
    pub fn names_of(&self, annotations: &[Annotation]) -> Result<Vec<&str>> {
        annotations
            .iter()
            .map(|ann| self.name(ann.category_id))
            .collect()
    }

    pub fn ids(&self) -> BTreeSet<CategoryId> {
        self.names.keys().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }
}

// ---------------------------------------------------------------------------
// BBox – COCO `[x, y, width, height]`, origin top-left
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 4]", into = "[f64; 4]")]
pub struct BBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl BBox {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        BBox {
            x,
            y,
            width,
            height,
        }
    }

    /// Horizontal coordinate of the right edge.
    pub fn right(&self) -> f64 {
        self.x + self.width
    }
}

impl From<[f64; 4]> for BBox {
    fn from([x, y, width, height]: [f64; 4]) -> Self {
        BBox::new(x, y, width, height)
    }
}

impl From<BBox> for [f64; 4] {
    fn from(b: BBox) -> Self {
        [b.x, b.y, b.width, b.height]
    }
}

// ---------------------------------------------------------------------------
// Annotation – one detected object
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Annotation {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_id: Option<ImageId>,
    pub category_id: CategoryId,
    pub bbox: BBox,
    /// Pixel-level mask; dropped by the uniqueness filter.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub segmentation: Option<JsonValue>,
    /// `id`, `area`, `iscrowd`, ... carried through untouched.
    #[serde(flatten)]
    pub extra: Map<String, JsonValue>,
}

impl Annotation {
    /// Copy without the heavy auxiliary payload.
    pub fn stripped(&self) -> Self {
        Annotation {
            segmentation: None,
            ..self.clone()
        }
    }
}

// ---------------------------------------------------------------------------
// Raw COCO instances file
// ---------------------------------------------------------------------------

/// Image metadata as listed in the COCO `images` array.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageInfo {
    pub id: ImageId,
    pub file_name: String,
    pub height: u32,
    pub width: u32,
    #[serde(flatten)]
    pub extra: Map<String, JsonValue>,
}

/// A COCO instances file. `info` and `licenses` are ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawSnapshot {
    pub categories: Vec<Category>,
    pub images: Vec<ImageInfo>,
    pub annotations: Vec<Annotation>,
}

// ---------------------------------------------------------------------------
// Filtered / spatial snapshot
// ---------------------------------------------------------------------------

/// `(left, right)` indices into an image's sorted-by-x annotation list.
/// Stored as a two-element JSON array.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "(usize, usize)", into = "(usize, usize)")]
pub struct GoodPair {
    pub left: usize,
    pub right: usize,
}

impl From<(usize, usize)> for GoodPair {
    fn from((left, right): (usize, usize)) -> Self {
        GoodPair { left, right }
    }
}

impl From<GoodPair> for (usize, usize) {
    fn from(p: GoodPair) -> Self {
        (p.left, p.right)
    }
}

/// Per-image entry of a snapshot's `data` map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageRecord {
    pub annotations: Vec<Annotation>,
    pub file_name: String,
    pub height: u32,
    pub width: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub good_pairs: Option<Vec<GoodPair>>,
}

impl ImageRecord {
    pub fn from_info(info: &ImageInfo, annotations: Vec<Annotation>) -> Self {
        ImageRecord {
            annotations,
            file_name: info.file_name.clone(),
            height: info.height,
            width: info.width,
            good_pairs: None,
        }
    }

    pub fn pairs(&self) -> &[GoodPair] {
        self.good_pairs.as_deref().unwrap_or(&[])
    }
}

/// The on-disk unit passed between pipeline stages.
///
/// `image_ids` fixes the iteration order; JSON object order is never relied on.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Snapshot {
    pub categories: Vec<Category>,
    #[serde(default)]
    pub image_ids: Vec<ImageId>,
    pub data: BTreeMap<ImageId, ImageRecord>,
}

impl Snapshot {
    pub fn new(categories: Vec<Category>) -> Self {
        Snapshot {
            categories,
            image_ids: Vec::new(),
            data: BTreeMap::new(),
        }
    }

    /// Append an image, keeping its position in the iteration order.
    pub fn push(&mut self, id: ImageId, record: ImageRecord) {
        if self.data.insert(id, record).is_none() {
            self.image_ids.push(id);
        }
    }

    /// Make `image_ids` agree with `data`.
    ///
    /// Listed ids that exist keep their order; unlisted ids (all of them, for
    /// files written without `image_ids`) follow in ascending order.
    pub fn normalize_order(&mut self) {
        let mut seen = BTreeSet::new();
        let data = &self.data;
        self.image_ids
            .retain(|id| data.contains_key(id) && seen.insert(*id));
        let missing: Vec<ImageId> = self
            .data
            .keys()
            .filter(|id| !seen.contains(id))
            .copied()
            .collect();
        self.image_ids.extend(missing);
    }

    pub fn iter(&self) -> impl Iterator<Item = (ImageId, &ImageRecord)> {
        self.image_ids
            .iter()
            .filter_map(|id| self.data.get(id).map(|rec| (*id, rec)))
    }

    pub fn get(&self, id: ImageId) -> Result<&ImageRecord> {
        self.data.get(&id).ok_or(DatasetError::NotFound(id))
    }

    pub fn category_map(&self) -> CategoryMap {
        CategoryMap::new(&self.categories)
    }

    pub fn len(&self) -> usize {
        self.image_ids.len()
    }

    pub fn pair_count(&self) -> usize {
        self.data.values().map(|rec| rec.pairs().len()).sum()
    }
}

#[cfg(test)]
impl Annotation {
    pub fn new(category_id: CategoryId, bbox: BBox) -> Self {
        Annotation {
            image_id: None,
            category_id,
            bbox,
            segmentation: None,
            extra: Map::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn annotation_keeps_unknown_fields() {
        let json = r#"{"id": 7, "image_id": 3, "category_id": 18,
                       "bbox": [1, 2.5, 3, 4], "area": 12.0, "iscrowd": 0,
                       "segmentation": [[1, 2, 3, 4]]}"#;
        let ann: Annotation = serde_json::from_str(json).unwrap();
        assert_eq!(ann.image_id, Some(3));
        assert_eq!(ann.bbox, BBox::new(1.0, 2.5, 3.0, 4.0));
        assert!(ann.segmentation.is_some());
        assert_eq!(ann.extra.get("id"), Some(&JsonValue::from(7)));

        let stripped = ann.stripped();
        let out = serde_json::to_value(&stripped).unwrap();
        assert!(out.get("segmentation").is_none());
        assert_eq!(out["iscrowd"], JsonValue::from(0));
        assert_eq!(out["bbox"][3], JsonValue::from(4.0));
    }

    #[test]
    fn missing_optional_fields_are_absent() {
        let json = r#"{"annotations": [{"category_id": 1, "bbox": [0, 0, 1, 1]}],
                       "file_name": "a.jpg", "height": 10, "width": 20}"#;
        let rec: ImageRecord = serde_json::from_str(json).unwrap();
        assert!(rec.good_pairs.is_none());
        assert!(rec.pairs().is_empty());
        assert!(rec.annotations[0].segmentation.is_none());
    }

    #[test]
    fn good_pair_is_a_json_array() {
        let pair = GoodPair { left: 0, right: 2 };
        assert_eq!(serde_json::to_string(&pair).unwrap(), "[0,2]");
        let back: GoodPair = serde_json::from_str("[1, 3]").unwrap();
        assert_eq!(back, GoodPair { left: 1, right: 3 });
    }

    #[test]
    fn snapshot_data_keys_are_strings() {
        let json = r#"{"categories": [{"id": 1, "name": "dog"}],
                       "data": {"42": {"annotations": [], "file_name": "x.jpg",
                                       "height": 1, "width": 1}}}"#;
        let snap: Snapshot = serde_json::from_str(json).unwrap();
        assert!(snap.data.contains_key(&42));
        assert_eq!(snap.category_map().name(1).unwrap(), "dog");
        assert!(matches!(
            snap.category_map().name(2),
            Err(DatasetError::UnknownCategory(2))
        ));
    }

    #[test]
    fn normalize_order_keeps_listed_then_appends_rest() {
        let record = ImageRecord {
            annotations: Vec::new(),
            file_name: String::new(),
            height: 1,
            width: 1,
            good_pairs: None,
        };
        let mut snap = Snapshot::new(Vec::new());
        for id in [5, 1, 9, 3] {
            snap.data.insert(id, record.clone());
        }
        snap.image_ids = vec![9, 42, 5, 9];
        snap.normalize_order();
        assert_eq!(snap.image_ids, vec![9, 5, 1, 3]);
        let order: Vec<ImageId> = snap.iter().map(|(id, _)| id).collect();
        assert_eq!(order, vec![9, 5, 1, 3]);
    }
}
