use image::imageops::{self, FilterType};
use image::{DynamicImage, ImageBuffer, Rgba, RgbaImage};

/// A single rendered frame
///
/// Frames carry an alpha channel so that the transparent margins of a
/// composed sequence let the background show through.
#[derive(Clone, Debug)]
pub struct Frame {
    buffer: RgbaImage,
}

impl Frame {
    /// Create a new frame from an RGBA image buffer
    pub fn new(buffer: RgbaImage) -> Self {
        Self { buffer }
    }

    /// Create a fully transparent frame
    pub fn new_transparent(width: u32, height: u32) -> Self {
        Self { buffer: ImageBuffer::new(width, height) }
    }

    /// Create an opaque frame filled with the specified color
    pub fn new_filled(width: u32, height: u32, color: [u8; 3]) -> Self {
        let buffer = ImageBuffer::from_pixel(width, height, Rgba([color[0], color[1], color[2], 255]));
        Self { buffer }
    }

    /// Convert a decoded image into a frame.
    ///
    /// Four-channel images keep their alpha; everything else is brought to
    /// 8-bit RGB first and then marked fully opaque.
    pub fn from_dynamic(image: DynamicImage) -> Self {
        if image.color().has_alpha() {
            return Self { buffer: image.to_rgba8() };
        }

        let rgb = image.to_rgb8();
        let buffer = ImageBuffer::from_fn(rgb.width(), rgb.height(), |x, y| {
            let [r, g, b] = rgb.get_pixel(x, y).0;
            Rgba([r, g, b, 255])
        });
        Self { buffer }
    }

    /// Create a frame from raw RGBA bytes
    pub fn from_rgba_bytes(width: u32, height: u32, data: Vec<u8>) -> Option<Self> {
        ImageBuffer::from_raw(width, height, data).map(|buffer| Self { buffer })
    }

    pub fn width(&self) -> u32 {
        self.buffer.width()
    }

    pub fn height(&self) -> u32 {
        self.buffer.height()
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.buffer.dimensions()
    }

    /// Get a pixel at the given coordinates (RGBA)
    pub fn get_pixel(&self, x: u32, y: u32) -> [u8; 4] {
        self.buffer.get_pixel(x, y).0
    }

    /// Resample to exactly `width` x `height`
    pub fn resized(&self, width: u32, height: u32, filter: FilterType) -> Frame {
        if self.dimensions() == (width, height) {
            return self.clone();
        }
        Frame::new(imageops::resize(&self.buffer, width, height, filter))
    }

    /// Alpha-blend `top` over this frame so that their centers line up.
    ///
    /// Parts of `top` that fall outside this frame are clipped.
    pub fn overlay_centered(&mut self, top: &Frame) {
        let (x, y) = centered_offset(self.dimensions(), top.dimensions());
        imageops::overlay(&mut self.buffer, &top.buffer, x, y);
    }

    /// Place `self` centered on a transparent canvas of the given size.
    pub fn centered_on_canvas(&self, width: u32, height: u32) -> Frame {
        if self.dimensions() == (width, height) {
            return self.clone();
        }
        let mut canvas = Frame::new_transparent(width, height);
        canvas.overlay_centered(self);
        canvas
    }

    /// Raw RGB bytes with the alpha channel dropped, ready for a rawvideo pipe
    pub fn to_rgb_bytes(&self) -> Vec<u8> {
        let raw = self.buffer.as_raw();
        let mut out = Vec::with_capacity(raw.len() / 4 * 3);
        for pixel in raw.chunks_exact(4) {
            out.extend_from_slice(&pixel[..3]);
        }
        out
    }
}

/// Top-left offset that centers an `inner` box in an `outer` box.
///
/// Negative when the inner box is larger along that axis.
pub fn centered_offset(outer: (u32, u32), inner: (u32, u32)) -> (i64, i64) {
    (
        (outer.0 as i64 - inner.0 as i64) / 2,
        (outer.1 as i64 - inner.1 as i64) / 2,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbImage;

    #[test]
    fn test_rgb_image_becomes_opaque() {
        let rgb = RgbImage::from_pixel(3, 2, image::Rgb([10, 20, 30]));
        let frame = Frame::from_dynamic(DynamicImage::ImageRgb8(rgb));
        assert_eq!(frame.get_pixel(1, 1), [10, 20, 30, 255]);
    }

    #[test]
    fn test_alpha_is_kept_for_rgba_images() {
        let rgba = RgbaImage::from_pixel(2, 2, Rgba([1, 2, 3, 40]));
        let frame = Frame::from_dynamic(DynamicImage::ImageRgba8(rgba));
        assert_eq!(frame.get_pixel(0, 0), [1, 2, 3, 40]);
    }

    #[test]
    fn test_overlay_centered() {
        let mut bottom = Frame::new_filled(6, 4, [255, 0, 0]);
        let top = Frame::new_filled(2, 2, [0, 0, 255]);
        bottom.overlay_centered(&top);

        assert_eq!(bottom.get_pixel(2, 1), [0, 0, 255, 255]);
        assert_eq!(bottom.get_pixel(3, 2), [0, 0, 255, 255]);
        assert_eq!(bottom.get_pixel(1, 1), [255, 0, 0, 255]);
        assert_eq!(bottom.get_pixel(4, 2), [255, 0, 0, 255]);
    }

    #[test]
    fn test_canvas_margins_are_transparent() {
        let frame = Frame::new_filled(2, 2, [255, 255, 0]).centered_on_canvas(4, 2);
        assert_eq!(frame.dimensions(), (4, 2));
        assert_eq!(frame.get_pixel(0, 0)[3], 0);
        assert_eq!(frame.get_pixel(1, 0), [255, 255, 0, 255]);
        assert_eq!(frame.get_pixel(3, 1)[3], 0);
    }

    #[test]
    fn test_rgb_bytes_drop_alpha() {
        let frame = Frame::new_filled(2, 1, [1, 2, 3]);
        assert_eq!(frame.to_rgb_bytes(), vec![1, 2, 3, 1, 2, 3]);
    }

    #[test]
    fn test_centered_offset_handles_larger_inner() {
        assert_eq!(centered_offset((10, 10), (4, 2)), (3, 4));
        assert_eq!(centered_offset((4, 4), (8, 4)), (-2, 0));
    }
}
