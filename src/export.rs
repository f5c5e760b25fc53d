use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::data::loader::write_json;
use crate::data::model::{ImageId, Snapshot};
use crate::error::{DatasetError, Result};
use crate::questions::{object_questions, spatial_questions, Question};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuestionKind {
    Object,
    Spatial,
}

/// One flattened question row, ready for JSON or CSV.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionRecord {
    pub image_id: ImageId,
    pub file_name: String,
    pub kind: QuestionKind,
    pub question: String,
    pub correct: String,
    pub incorrect: String,
}

impl QuestionRecord {
    fn new(image_id: ImageId, file_name: &str, kind: QuestionKind, q: Question) -> Self {
        let [correct, incorrect] = q.answers;
        QuestionRecord {
            image_id,
            file_name: file_name.to_string(),
            kind,
            question: q.question,
            correct,
            incorrect,
        }
    }
}

/// Every object and spatial question of the snapshot, image by image in
/// snapshot order.
pub fn collect_questions(snapshot: &Snapshot) -> Result<Vec<QuestionRecord>> {
    let categories = snapshot.category_map();
    let mut rows = Vec::new();
    for (image_id, record) in snapshot.iter() {
        for q in object_questions(record, &categories)? {
            rows.push(QuestionRecord::new(image_id, &record.file_name, QuestionKind::Object, q));
        }
        for q in spatial_questions(record, &categories)? {
            rows.push(QuestionRecord::new(image_id, &record.file_name, QuestionKind::Spatial, q));
        }
    }
    Ok(rows)
}

/// Write question rows.  Dispatch by extension: `.json` or `.csv`.
pub fn write_questions(rows: &[QuestionRecord], path: &Path) -> Result<()> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    match ext.as_str() {
        "json" => write_json(rows, path)?,
        "csv" => write_csv(rows, path)?,
        other => return Err(DatasetError::UnsupportedFormat(other.to_string())),
    }
    log::info!("Wrote {} questions to {}", rows.len(), path.display());
    Ok(())
}

fn write_csv(rows: &[QuestionRecord], path: &Path) -> Result<()> {
    let csv_err = |source| DatasetError::Csv {
        path: path.to_path_buf(),
        source,
    };
    let mut writer = csv::Writer::from_path(path).map_err(csv_err)?;
    for row in rows {
        writer.serialize(row).map_err(csv_err)?;
    }
    writer.flush().map_err(|source| DatasetError::Io {
        path: path.to_path_buf(),
        source,
    })
}
