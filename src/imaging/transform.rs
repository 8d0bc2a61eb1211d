//! Crop-to-aspect and scale
//!
//! The largest centered rectangle of the source with the target aspect
//! ratio is cut out, then scaled to exactly the target size.

use image::DynamicImage;
use image::imageops::FilterType;

use crate::utils::TargetSize;

/// Size of the largest crop of a `src_w`x`src_h` image with the aspect ratio of `dst_w`x`dst_h`
///
/// Integer division may round either side down by one pixel. Both sides are
/// kept at one pixel or more so tiny sources never produce an empty crop.
pub fn cropped_size(src_w: u32, src_h: u32, dst_w: u32, dst_h: u32) -> (u32, u32) {
    let (src_w64, src_h64) = (u64::from(src_w), u64::from(src_h));
    let (dst_w64, dst_h64) = (u64::from(dst_w.max(1)), u64::from(dst_h.max(1)));

    let candidate_w = dst_w64 * src_h64 / dst_h64;
    let (crop_w, crop_h) = if candidate_w <= src_w64 {
        (candidate_w, src_h64)
    } else {
        (src_w64, dst_h64 * src_w64 / dst_w64)
    };

    // Both values are bounded by the source size, which fits in u32
    (
        u32::try_from(crop_w).unwrap_or(src_w).max(1),
        u32::try_from(crop_h).unwrap_or(src_h).max(1),
    )
}

/// Crop `source` to the target aspect ratio around its center and scale to `size`
pub fn resize(source: &DynamicImage, size: TargetSize) -> DynamicImage {
    let (src_w, src_h) = (source.width(), source.height());
    let (crop_w, crop_h) = cropped_size(src_w, src_h, size.width, size.height);

    let x = src_w.saturating_sub(crop_w) / 2;
    let y = src_h.saturating_sub(crop_h) / 2;

    source
        .crop_imm(x, y, crop_w, crop_h)
        .resize_exact(size.width, size.height, FilterType::Triangle)
}
