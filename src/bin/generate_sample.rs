use std::path::Path;

use image::{Rgb, RgbImage};
use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use rand::{Rng, SeedableRng};
use serde_json::{json, Value};

const OUTPUT_ROOT: &str = "sample_data";
const IMAGE_COUNT: u64 = 40;
const WIDTH: u32 = 320;
const HEIGHT: u32 = 240;

const CATEGORIES: &[(u64, &str, &str)] = &[
    (1, "person", "person"),
    (3, "car", "vehicle"),
    (17, "cat", "animal"),
    (18, "dog", "animal"),
    (22, "elephant", "animal"),
    (28, "umbrella", "accessory"),
    (47, "cup", "kitchen"),
    (53, "apple", "food"),
    (55, "orange", "food"),
    (62, "chair", "furniture"),
];

/// One random box fully inside the image.
fn random_bbox(rng: &mut StdRng) -> [f64; 4] {
    let w = rng.random_range(10.0..120.0_f64).round();
    let h = rng.random_range(10.0..120.0_f64).round();
    let x = rng.random_range(0.0..(WIDTH as f64 - w)).round();
    let y = rng.random_range(0.0..(HEIGHT as f64 - h)).round();
    [x, y, w, h]
}

fn render(boxes: &[[f64; 4]]) -> RgbImage {
    let mut img = RgbImage::from_pixel(WIDTH, HEIGHT, Rgb([200, 200, 200]));
    for (i, [x, y, w, h]) in boxes.iter().enumerate() {
        let shade = 40 + (i as u8 % 5) * 40;
        for py in *y as u32..(*y + *h) as u32 {
            for px in *x as u32..(*x + *w) as u32 {
                img.put_pixel(px, py, Rgb([shade, 90, 255 - shade]));
            }
        }
    }
    img
}

fn main() {
    env_logger::init();
    let mut rng = StdRng::seed_from_u64(42);

    let image_dir = Path::new(OUTPUT_ROOT).join("val2014");
    std::fs::create_dir_all(&image_dir).expect("Failed to create image directory");

    let mut images = Vec::new();
    let mut annotations = Vec::new();
    let mut ann_id: u64 = 1;

    for image_id in 1..=IMAGE_COUNT {
        let file_name = format!("COCO_val2014_{image_id:012}.png");
        let object_count = rng.random_range(2..7);
        let mut boxes = Vec::with_capacity(object_count);

        for _ in 0..object_count {
            let &(category_id, _, _) = CATEGORIES.choose(&mut rng).expect("non-empty categories");
            let bbox = random_bbox(&mut rng);
            annotations.push(json!({
                "id": ann_id,
                "image_id": image_id,
                "category_id": category_id,
                "bbox": bbox,
                "area": bbox[2] * bbox[3],
                "iscrowd": 0,
                "segmentation": [[
                    bbox[0], bbox[1],
                    bbox[0] + bbox[2], bbox[1],
                    bbox[0] + bbox[2], bbox[1] + bbox[3],
                    bbox[0], bbox[1] + bbox[3],
                ]],
            }));
            boxes.push(bbox);
            ann_id += 1;
        }

        render(&boxes)
            .save(image_dir.join(&file_name))
            .expect("Failed to write image");
        images.push(json!({
            "id": image_id,
            "file_name": file_name,
            "height": HEIGHT,
            "width": WIDTH,
        }));
    }

    let categories: Vec<Value> = CATEGORIES
        .iter()
        .map(|(id, name, supercategory)| {
            json!({ "id": id, "name": name, "supercategory": supercategory })
        })
        .collect();

    let instances = json!({
        "info": { "description": "synthetic COCO-style sample" },
        "categories": categories,
        "images": images,
        "annotations": annotations,
    });

    let output_path = Path::new(OUTPUT_ROOT).join("instances_sample.json");
    let file = std::fs::File::create(&output_path).expect("Failed to create output file");
    serde_json::to_writer_pretty(file, &instances).expect("Failed to write annotations");

    log::info!("Wrote {} images to {}", IMAGE_COUNT, image_dir.display());
    println!(
        "Wrote {} annotations over {IMAGE_COUNT} images to {}",
        ann_id - 1,
        output_path.display()
    );
}
