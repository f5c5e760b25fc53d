/// Data layer: core types, loading, and the filtering/pairing stages.
///
/// Architecture:
/// ```text
///  instances_val2014.json
///        │
///        ▼
///   ┌──────────┐
///   │  index    │  group annotations by image id
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  filter   │  keep images with ≥ 2 unique categories → Snapshot
///   └──────────┘
///        │  coco_spatial_unique_obj.json
///        ▼
///   ┌──────────┐
///   │  pairs    │  sort by x, attach good pairs → Snapshot
///   └──────────┘
///        │  coco_spatial.json
///        ▼
///    questions
/// ```

pub mod filter;
pub mod index;
pub mod loader;
pub mod model;
pub mod pairs;
