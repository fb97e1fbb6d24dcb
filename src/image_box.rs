//! Image decoding cache and the block-level image flowable.
//!
//! Images are decoded once per distinct byte content. The cache keys on a
//! SHA-256 digest of the raw bytes, so the same logo referenced from every
//! page header costs one decode and one embedded resource.

use crate::canvas::{Canvas, ImageResource};
use crate::context::RenderContext;
use crate::error::PlatenError;
use crate::flowable::Flowable;
use crate::types::Size;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::sync::Arc;

/// Fraction of the available height an image may claim. Keeping a sliver of
/// the frame free stops a full-height image from starving the content that
/// follows it.
pub const MAX_IMAGE_RATIO: f32 = 0.95;

/// A successfully decoded image: intrinsic pixel size, alpha flag and the
/// shareable resource handed to the canvas.
#[derive(Debug, Clone)]
pub struct DecodedImage {
    pub resource: ImageResource,
    pub width: u32,
    pub height: u32,
    pub has_alpha: bool,
}

#[derive(Debug, Default)]
pub struct ImageCache {
    entries: HashMap<String, Arc<DecodedImage>>,
}

impl ImageCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decodes `data`, or returns the cached result for identical bytes.
    pub fn load(&mut self, data: &[u8]) -> Result<Arc<DecodedImage>, PlatenError> {
        let digest = format!("{:x}", Sha256::digest(data));
        if let Some(entry) = self.entries.get(&digest) {
            return Ok(Arc::clone(entry));
        }
        let decoded = image::load_from_memory(data)?;
        let (width, height) = (decoded.width(), decoded.height());
        let entry = Arc::new(DecodedImage {
            resource: ImageResource {
                digest: digest.clone(),
                data: Arc::new(data.to_vec()),
                width,
                height,
            },
            width,
            height,
            has_alpha: decoded.color().has_alpha(),
        });
        self.entries.insert(digest, Arc::clone(&entry));
        Ok(entry)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Uniform scale factor that fits `width` x `height` into the available
/// box, claiming at most [`MAX_IMAGE_RATIO`] of the height. Never scales
/// up.
pub(crate) fn fit_factor(width: f32, height: f32, avail_width: f32, avail_height: f32) -> f32 {
    if width <= 0.0 || height <= 0.0 {
        return 1.0;
    }
    let width_factor = width.min(avail_width) / width;
    let height_factor = height.min(avail_height * MAX_IMAGE_RATIO) / height;
    width_factor.min(height_factor)
}

/// Block-level image. Measured size is the requested size scaled uniformly
/// to the frame; re-measuring under a new constraint starts again from the
/// requested size, never from a previous scale.
#[derive(Debug, Clone)]
pub struct ImageBox {
    image: Arc<DecodedImage>,
    draw_width: f32,
    draw_height: f32,
    scaled: Size,
    masked: bool,
}

impl ImageBox {
    pub fn new(image: Arc<DecodedImage>) -> Self {
        let masked = image.has_alpha;
        let (w, h) = (image.width as f32, image.height as f32);
        Self {
            image,
            draw_width: w,
            draw_height: h,
            scaled: Size::new(w, h),
            masked,
        }
    }

    /// Decode-and-construct convenience over the cache.
    pub fn load(cache: &mut ImageCache, data: &[u8]) -> Result<Self, PlatenError> {
        Ok(Self::new(cache.load(data)?))
    }

    /// Requests a display size; proportional frame fitting still applies.
    pub fn with_size(mut self, width: f32, height: f32) -> Self {
        self.draw_width = width;
        self.draw_height = height;
        self.scaled = Size::new(width, height);
        self
    }

    pub fn scaled_size(&self) -> Size {
        self.scaled
    }
}

impl Flowable for ImageBox {
    fn wrap(&mut self, ctx: &mut RenderContext, avail_width: f32, avail_height: f32) -> Size {
        let avail_height = ctx.max_height.track(avail_height);
        let factor = fit_factor(self.draw_width, self.draw_height, avail_width, avail_height);
        self.scaled = Size::new(self.draw_width * factor, self.draw_height * factor);
        self.scaled
    }

    fn draw(&self, canvas: &mut Canvas, _ctx: &mut RenderContext, x: f32, y: f32) {
        canvas.draw_image(
            x,
            y,
            self.scaled.width,
            self.scaled.height,
            &self.image.resource,
            self.masked,
        );
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::context::PassSnapshot;

    pub(crate) fn png_bytes(width: u32, height: u32, alpha: bool) -> Vec<u8> {
        use image::{DynamicImage, RgbImage, RgbaImage};
        let img = if alpha {
            DynamicImage::ImageRgba8(RgbaImage::new(width, height))
        } else {
            DynamicImage::ImageRgb8(RgbImage::new(width, height))
        };
        let mut buf = std::io::Cursor::new(Vec::new());
        img.write_to(&mut buf, image::ImageFormat::Png).unwrap();
        buf.into_inner()
    }

    fn ctx() -> RenderContext {
        RenderContext::new(0, PassSnapshot::default(), ImageCache::new())
    }

    #[test]
    fn identical_bytes_decode_once() {
        let mut cache = ImageCache::new();
        let bytes = png_bytes(4, 4, false);
        let first = cache.load(&bytes).unwrap();
        let second = cache.load(&bytes).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(cache.len(), 1);
        assert!(!first.has_alpha);
    }

    #[test]
    fn garbage_bytes_are_a_decode_error() {
        let mut cache = ImageCache::new();
        let err = cache.load(b"not an image").unwrap_err();
        assert!(matches!(err, PlatenError::ImageDecode(_)));
    }

    #[test]
    fn wide_image_scales_down_to_the_frame_width() {
        let mut cache = ImageCache::new();
        let mut img = ImageBox::load(&mut cache, &png_bytes(200, 100, false)).unwrap();
        let size = img.wrap(&mut ctx(), 100.0, 1000.0);
        assert_eq!(size, Size::new(100.0, 50.0));
    }

    #[test]
    fn tall_image_keeps_five_percent_of_the_height_free() {
        let mut cache = ImageCache::new();
        let mut img = ImageBox::load(&mut cache, &png_bytes(100, 200, false)).unwrap();
        let size = img.wrap(&mut ctx(), 1000.0, 100.0);
        // Height capped at 95pt; width follows proportionally.
        assert!((size.height - 95.0).abs() < 0.001);
        assert!((size.width - 47.5).abs() < 0.001);
    }

    #[test]
    fn small_image_is_never_scaled_up() {
        let mut cache = ImageCache::new();
        let mut img = ImageBox::load(&mut cache, &png_bytes(30, 20, false)).unwrap();
        let size = img.wrap(&mut ctx(), 500.0, 500.0);
        assert_eq!(size, Size::new(30.0, 20.0));
    }

    #[test]
    fn rewrap_under_a_shrunken_probe_keeps_the_tracked_height() {
        let mut cache = ImageCache::new();
        let mut img = ImageBox::load(&mut cache, &png_bytes(100, 400, false)).unwrap();
        let mut ctx = ctx();
        let first = img.wrap(&mut ctx, 200.0, 400.0);
        // A later probe with a transiently small height measures against
        // the remembered page height, so the size is stable.
        let second = img.wrap(&mut ctx, 200.0, 50.0);
        assert_eq!(first, second);
    }

    #[test]
    fn alpha_images_draw_masked() {
        let mut cache = ImageCache::new();
        let img = ImageBox::load(&mut cache, &png_bytes(8, 8, true)).unwrap();
        let mut canvas = Canvas::new(Size::a4());
        img.draw(&mut canvas, &mut ctx(), 10.0, 20.0);
        canvas.show_page();
        let doc = canvas.finish();
        assert!(matches!(
            doc.pages[0].commands[0],
            crate::canvas::Command::DrawImage { masked: true, .. }
        ));
        assert_eq!(doc.resources.len(), 1);
    }
}
