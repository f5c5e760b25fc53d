use super::model::{Annotation, GoodPair, Snapshot};

// ---------------------------------------------------------------------------
// Spatial pairs: objects that are unambiguously left/right of each other
// ---------------------------------------------------------------------------

/// Stable ascending sort by the left edge of the bounding box.
pub fn sort_by_x(annotations: &mut [Annotation]) {
    annotations.sort_by(|a, b| a.bbox.x.total_cmp(&b.bbox.x));
}

/// All `(a, b)` with `a < b` where object `a` ends strictly before object `b`
/// begins.  `sorted` must already be in [`sort_by_x`] order.
pub fn good_pairs(sorted: &[Annotation]) -> Vec<GoodPair> {
    let mut pairs = Vec::new();
    for (left, left_ann) in sorted.iter().enumerate() {
        let right_edge = left_ann.bbox.right();
        for (right, right_ann) in sorted.iter().enumerate().skip(left + 1) {
            if right_edge < right_ann.bbox.x {
                pairs.push(GoodPair { left, right });
            }
        }
    }
    pairs
}

#[derive(Debug, Clone, Copy, Default)]
pub struct PairOptions {
    /// Drop images whose objects all overlap horizontally instead of keeping
    /// them with an empty `good_pairs` list.
    pub drop_empty: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PairReport {
    pub images_seen: usize,
    pub images_kept: usize,
    pub total_pairs: usize,
}

/// Sort every image's annotations by x and attach its good pairs.
pub fn attach_good_pairs(snapshot: Snapshot, options: PairOptions) -> (Snapshot, PairReport) {
    let Snapshot {
        categories,
        image_ids,
        mut data,
    } = snapshot;
    let mut out = Snapshot::new(categories);
    let mut report = PairReport::default();

    for image_id in image_ids {
        let Some(mut record) = data.remove(&image_id) else {
            continue;
        };
        report.images_seen += 1;

        sort_by_x(&mut record.annotations);
        let pairs = good_pairs(&record.annotations);
        if pairs.is_empty() && options.drop_empty {
            log::debug!("Image {image_id}: no horizontally separated objects");
            continue;
        }

        report.images_kept += 1;
        report.total_pairs += pairs.len();
        record.good_pairs = Some(pairs);
        out.push(image_id, record);
    }

    log::info!(
        "Pair generator kept {} of {} images with {} good pairs",
        report.images_kept,
        report.images_seen,
        report.total_pairs
    );
    (out, report)
}
