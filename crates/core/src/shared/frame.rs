use image::RgbImage;

use super::video_metadata::Rotation;

/// A single decoded video frame: contiguous RGB bytes in row-major order.
#[derive(Clone, Debug)]
pub struct Frame {
    data: Vec<u8>,
    width: u32,
    height: u32,
    index: usize,
}

impl Frame {
    pub fn new(data: Vec<u8>, width: u32, height: u32, index: usize) -> Self {
        debug_assert_eq!(
            data.len(),
            (width as usize) * (height as usize) * 3,
            "data length must equal width * height * 3"
        );
        Self {
            data,
            width,
            height,
            index,
        }
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Zero-based position of this frame in decode order.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Converts to an upright `RgbImage`, applying `rotation`.
    pub fn to_image(&self, rotation: Rotation) -> Option<RgbImage> {
        let img = RgbImage::from_raw(self.width, self.height, self.data.clone())?;
        Some(match rotation {
            Rotation::None => img,
            Rotation::Cw90 => image::imageops::rotate90(&img),
            Rotation::Cw180 => image::imageops::rotate180(&img),
            Rotation::Cw270 => image::imageops::rotate270(&img),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 2x1 frame: left pixel red, right pixel blue.
    fn two_pixel_frame() -> Frame {
        Frame::new(vec![255, 0, 0, 0, 0, 255], 2, 1, 7)
    }

    #[test]
    fn test_construction_and_accessors() {
        let frame = two_pixel_frame();
        assert_eq!(frame.width(), 2);
        assert_eq!(frame.height(), 1);
        assert_eq!(frame.index(), 7);
        assert_eq!(frame.data().len(), 6);
    }

    #[test]
    #[should_panic(expected = "data length must equal width * height * 3")]
    fn test_mismatched_data_length_panics_in_debug() {
        Frame::new(vec![0u8; 10], 2, 2, 0);
    }

    #[test]
    fn test_to_image_without_rotation_keeps_layout() {
        let img = two_pixel_frame().to_image(Rotation::None).unwrap();
        assert_eq!(img.dimensions(), (2, 1));
        assert_eq!(img.get_pixel(0, 0).0, [255, 0, 0]);
        assert_eq!(img.get_pixel(1, 0).0, [0, 0, 255]);
    }

    #[test]
    fn test_to_image_cw90_swaps_dimensions() {
        let img = two_pixel_frame().to_image(Rotation::Cw90).unwrap();
        assert_eq!(img.dimensions(), (1, 2));
        // Clockwise turn puts the left pixel on top.
        assert_eq!(img.get_pixel(0, 0).0, [255, 0, 0]);
        assert_eq!(img.get_pixel(0, 1).0, [0, 0, 255]);
    }

    #[test]
    fn test_to_image_cw180_mirrors_row() {
        let img = two_pixel_frame().to_image(Rotation::Cw180).unwrap();
        assert_eq!(img.dimensions(), (2, 1));
        assert_eq!(img.get_pixel(0, 0).0, [0, 0, 255]);
    }
}
