//! Image decode/encode and color conversion, delegated to OpenCV's codecs.

use opencv::core::{AlgorithmHint, Mat, Vector};
use opencv::prelude::*;
use opencv::{imgcodecs, imgproc};
use tracing::debug;

use crate::error::{Error, Result};

/// Decode a color image, failing loudly on unreadable input.
///
/// OpenCV signals a missing or undecodable file with an empty matrix rather
/// than an error; this wrapper turns that into one.
pub fn load_image(path: &str) -> Result<Mat> {
    let image = imgcodecs::imread(path, imgcodecs::IMREAD_COLOR)?;
    if image.empty() {
        return Err(Error::ImageRead {
            path: path.to_owned(),
        });
    }
    Ok(image)
}

/// Encode `image` to `path`; the container format follows the extension.
pub fn save_image(path: &str, image: &Mat) -> Result<()> {
    let written = imgcodecs::imwrite(path, image, &Vector::<i32>::new())?;
    if !written {
        return Err(Error::ImageWrite {
            path: path.to_owned(),
        });
    }
    Ok(())
}

/// Convert the image at `input_path` to single-channel grayscale and write it
/// to `output_path`.
pub fn convert_to_gray_scale(input_path: &str, output_path: &str) -> Result<()> {
    let image = load_image(input_path)?;

    let mut gray = Mat::default();
    imgproc::cvt_color(
        &image,
        &mut gray,
        imgproc::COLOR_BGR2GRAY,
        0,
        AlgorithmHint::ALGO_HINT_DEFAULT,
    )?;

    debug!(input = input_path, output = output_path, "grayscale conversion");
    save_image(output_path, &gray)
}
