use crate::loader::LoadError;
use crate::plan::ImagePlan;
use image::ImageFormat;
use image::io::Reader as ImageReader;
use std::io::Cursor;

/// Read a PNG's dimensions without decoding its pixels.
pub(crate) fn parse_png(data: &[u8]) -> Result<ImagePlan, LoadError> {
    let (width, height) = ImageReader::with_format(Cursor::new(data), ImageFormat::Png)
        .into_dimensions()
        .map_err(|e| LoadError::Decode(format!("PNG: {e}")))?;
    if width == 0 || height == 0 {
        return Err(LoadError::Decode(format!(
            "PNG: invalid dimensions {width}x{height}"
        )));
    }
    Ok(ImagePlan { width, height })
}
