//! Loading a single 36x36 grayscale frame from disk.
//!
//! Grounded in the upstream Python tool's `testcases.json` (a JSON array of
//! objects, each carrying a base64-encoded `image` field) and its raw sensor
//! capture format. This module is demo scaffolding only: the core pipeline
//! never performs file or base64 I/O itself.

use std::path::Path;

use dotgrid_decode::config::IMAGE_SIZE;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct TestCase {
    image: String,
}

/// Load a single 36x36 grayscale frame from `path`.
///
/// `.json` files are parsed as either a single [`TestCase`] object or an
/// array of them (the first entry is used); anything else is treated as a
/// raw file of exactly `IMAGE_SIZE * IMAGE_SIZE` grayscale bytes.
pub fn load_frame(path: &Path) -> Result<Vec<u8>, Box<dyn std::error::Error>> {
    let is_json = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

    if is_json {
        load_json_frame(path)
    } else {
        load_raw_frame(path)
    }
}

fn load_raw_frame(path: &Path) -> Result<Vec<u8>, Box<dyn std::error::Error>> {
    let bytes = std::fs::read(path)?;
    if bytes.len() != IMAGE_SIZE * IMAGE_SIZE {
        return Err(format!(
            "expected {} raw grayscale bytes, found {}",
            IMAGE_SIZE * IMAGE_SIZE,
            bytes.len()
        )
        .into());
    }
    Ok(bytes)
}

fn load_json_frame(path: &Path) -> Result<Vec<u8>, Box<dyn std::error::Error>> {
    use base64::Engine;

    let text = std::fs::read_to_string(path)?;
    let case: TestCase = match serde_json::from_str::<TestCase>(&text) {
        Ok(case) => case,
        Err(_) => {
            let cases: Vec<TestCase> = serde_json::from_str(&text)?;
            cases.into_iter().next().ok_or("empty test case array")?
        }
    };

    let png_bytes = base64::engine::general_purpose::STANDARD.decode(case.image)?;
    let decoded = image::load_from_memory(&png_bytes)?.into_luma8();
    if decoded.width() as usize != IMAGE_SIZE || decoded.height() as usize != IMAGE_SIZE {
        return Err(format!(
            "expected a {IMAGE_SIZE}x{IMAGE_SIZE} image, found {}x{}",
            decoded.width(),
            decoded.height()
        )
        .into());
    }
    Ok(decoded.into_raw())
}
