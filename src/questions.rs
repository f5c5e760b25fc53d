use image::DynamicImage;
use serde::Serialize;

use crate::data::model::{CategoryMap, GoodPair, ImageRecord};
use crate::error::{DatasetError, Result};

// ---------------------------------------------------------------------------
// Question / answer pairs
// ---------------------------------------------------------------------------

/// A question with one correct and one incorrect answer, in that order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Question {
    pub question: String,
    pub answers: [String; 2],
}

impl Question {
    pub fn correct(&self) -> &str {
        &self.answers[0]
    }

    pub fn incorrect(&self) -> &str {
        &self.answers[1]
    }
}

/// `"an"` before a lowercase vowel, `"a"` otherwise.  No phonetic exceptions.
pub fn article(name: &str) -> &'static str {
    match name.chars().next() {
        Some('a' | 'e' | 'i' | 'o' | 'u') => "an",
        _ => "a",
    }
}

/// Only the question picks `a`/`an`; the affirmative answer always reads "a".
pub fn object_question(name: &str) -> Question {
    let art = article(name);
    Question {
        question: format!("Is there {art} {name} in the image?"),
        answers: [
            format!("Yes, there is a {name} in the image."),
            format!("No, there is no {name} in the image."),
        ],
    }
}

pub fn spatial_question(left: &str, right: &str) -> Question {
    Question {
        question: format!("Which side of the {left} is the {right}?"),
        answers: [
            format!("The {right} is on the right side of the {left}."),
            format!("The {right} is on the left side of the {left}."),
        ],
    }
}

/// One presence question per annotation of the image.
pub fn object_questions(record: &ImageRecord, categories: &CategoryMap) -> Result<Vec<Question>> {
    Ok(categories
        .names_of(&record.annotations)?
        .into_iter()
        .map(object_question)
        .collect())
}

/// One left/right question per good pair.  Pair indices refer to the
/// sorted-by-x annotation order; an image without pairs yields nothing.
pub fn spatial_questions(record: &ImageRecord, categories: &CategoryMap) -> Result<Vec<Question>> {
    let names = categories.names_of(&record.annotations)?;
    record
        .pairs()
        .iter()
        .map(|&GoodPair { left, right }| {
            match (names.get(left), names.get(right)) {
                (Some(l), Some(r)) => Ok(spatial_question(l, r)),
                _ => Err(DatasetError::InvalidPair {
                    left,
                    right,
                    len: names.len(),
                }),
            }
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Contrastive evaluation bundle
// ---------------------------------------------------------------------------

/// Spatial questions together with the original and mirrored image.
///
/// The questions describe the original; on the flipped image their correct
/// and incorrect answers swap roles.
pub struct SpatialEval {
    pub image: DynamicImage,
    pub image_flipped: DynamicImage,
    pub questions: Vec<Question>,
}

pub fn spatial_eval(
    image: DynamicImage,
    record: &ImageRecord,
    categories: &CategoryMap,
) -> Result<SpatialEval> {
    let questions = spatial_questions(record, categories)?;
    let image_flipped = image.fliph();
    Ok(SpatialEval {
        image,
        image_flipped,
        questions,
    })
}
