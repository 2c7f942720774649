//! FFmpeg video filter expressions.

use mlens_models::CropDimensions;

/// Center crop filter.
///
/// Offsets are evaluated by FFmpeg against the input frame size, so the
/// source dimensions do not need to be known up front.
pub fn center_crop_filter(dims: CropDimensions) -> String {
    let CropDimensions { width, height } = dims;
    format!("crop={width}:{height}:(in_w-{width})/2:(in_h-{height})/2")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_center_crop_filter() {
        assert_eq!(
            center_crop_filter(CropDimensions::new(1280, 720)),
            "crop=1280:720:(in_w-1280)/2:(in_h-720)/2"
        );
    }
}
