use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use image::DynamicImage;
use serde::de::DeserializeOwned;
use serde::Serialize;

use super::model::{RawSnapshot, Snapshot};
use crate::error::{DatasetError, Result};

// ---------------------------------------------------------------------------
// Public entry-points
// ---------------------------------------------------------------------------

/// Load a COCO instances file (`categories`, `images`, `annotations`).
pub fn load_raw(path: &Path) -> Result<RawSnapshot> {
    let raw: RawSnapshot = read_json(path)?;
    log::info!(
        "Loaded {} images, {} annotations, {} categories from {}",
        raw.images.len(),
        raw.annotations.len(),
        raw.categories.len(),
        path.display()
    );
    Ok(raw)
}

/// Load a filtered or spatial snapshot.  Dispatch by source.
///
/// Supported sources:
/// * `https://...` – fetched with a single blocking GET, anything but 200 is fatal
/// * anything else – treated as a local file path
pub fn load_snapshot(source: &str) -> Result<Snapshot> {
    let mut snapshot: Snapshot = if is_remote(source) {
        fetch_remote(source)?
    } else {
        read_json(Path::new(source))?
    };
    snapshot.normalize_order();
    log::info!(
        "Loaded snapshot with {} images ({} good pairs) from {source}",
        snapshot.len(),
        snapshot.pair_count()
    );
    Ok(snapshot)
}

/// Write a snapshot as 2-space indented JSON.
pub fn save_snapshot(snapshot: &Snapshot, path: &Path) -> Result<()> {
    write_json(snapshot, path)?;
    log::info!("Wrote {} images to {}", snapshot.len(), path.display());
    Ok(())
}

pub fn is_remote(source: &str) -> bool {
    source.starts_with("https://")
}

// ---------------------------------------------------------------------------
// Images
// ---------------------------------------------------------------------------

/// `{dataset_root}/val2014/{file_name}`
pub fn image_path(dataset_root: &Path, file_name: &str) -> PathBuf {
    dataset_root.join("val2014").join(file_name)
}

pub fn load_image(path: &Path) -> Result<DynamicImage> {
    image::open(path).map_err(|source| DatasetError::Image {
        path: path.to_path_buf(),
        source,
    })
}

// ---------------------------------------------------------------------------
// JSON helpers
// ---------------------------------------------------------------------------

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let text = std::fs::read_to_string(path).map_err(|source| DatasetError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&text).map_err(|source| DatasetError::Json {
        origin: path.display().to_string(),
        source,
    })
}

/// `serde_json`'s pretty printer indents with two spaces.
pub(crate) fn write_json<T: Serialize + ?Sized>(value: &T, path: &Path) -> Result<()> {
    let io_err = |source| DatasetError::Io {
        path: path.to_path_buf(),
        source,
    };
    let file = File::create(path).map_err(io_err)?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, value).map_err(|source| DatasetError::Json {
        origin: path.display().to_string(),
        source,
    })?;
    std::io::Write::flush(&mut writer).map_err(io_err)
}

fn fetch_remote<T: DeserializeOwned>(url: &str) -> Result<T> {
    log::info!("Downloading {url}");
    let request_err = |source| DatasetError::Request {
        url: url.to_string(),
        source,
    };
    let response = reqwest::blocking::get(url).map_err(request_err)?;
    let status = response.status();
    if status != reqwest::StatusCode::OK {
        return Err(DatasetError::Http {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }
    let text = response.text().map_err(request_err)?;
    serde_json::from_str(&text).map_err(|source| DatasetError::Json {
        origin: url.to_string(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::{Annotation, BBox, Category, GoodPair, ImageRecord};

    fn sample_snapshot() -> Snapshot {
        let categories = vec![
            Category {
                id: 17,
                name: "cat".into(),
                extra: Default::default(),
            },
            Category {
                id: 18,
                name: "dog".into(),
                extra: Default::default(),
            },
        ];
        let mut snap = Snapshot::new(categories);
        let mut dog = Annotation::new(18, BBox::new(0.0, 0.0, 10.0, 10.0));
        dog.image_id = Some(9);
        dog.extra.insert("area".into(), 100.0.into());
        let cat = Annotation::new(17, BBox::new(20.5, 0.0, 10.0, 10.0));
        snap.push(
            9,
            ImageRecord {
                annotations: vec![dog, cat],
                file_name: "COCO_val2014_000000000009.jpg".into(),
                height: 480,
                width: 640,
                good_pairs: Some(vec![GoodPair { left: 0, right: 1 }]),
            },
        );
        snap.push(
            2,
            ImageRecord {
                annotations: Vec::new(),
                file_name: "COCO_val2014_000000000002.jpg".into(),
                height: 10,
                width: 10,
                good_pairs: None,
            },
        );
        snap
    }

    #[test]
    fn snapshot_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("spatial.json");
        let snap = sample_snapshot();

        save_snapshot(&snap, &path).unwrap();
        let loaded = load_snapshot(path.to_str().unwrap()).unwrap();

        assert_eq!(loaded, snap);
        assert_eq!(loaded.image_ids, vec![9, 2]);
    }

    #[test]
    fn output_is_two_space_indented() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.json");
        save_snapshot(&sample_snapshot(), &path).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("{\n  \"categories\": [\n    {"));
    }

    #[test]
    fn malformed_json_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.json");
        std::fs::write(&path, "{\"categories\": [").unwrap();
        let err = load_snapshot(path.to_str().unwrap()).unwrap_err();
        assert!(matches!(err, DatasetError::Json { .. }));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = load_raw(Path::new("/definitely/not/here.json")).unwrap_err();
        assert!(matches!(err, DatasetError::Io { .. }));
    }

    #[test]
    fn remote_sources_are_detected() {
        assert!(is_remote("https://example.org/coco_spatial.json"));
        assert!(!is_remote("data/coco_spatial.json"));
        assert!(!is_remote("http://example.org/coco_spatial.json"));
    }

    #[test]
    fn image_paths_live_under_val2014() {
        let p = image_path(Path::new("/data/coco"), "a.jpg");
        assert_eq!(p, PathBuf::from("/data/coco/val2014/a.jpg"));
    }
}
