//! Output format conversion service
//!
//! Converts RGBA removal results into the shape each output format needs
//! before encoding.

use crate::config::OutputFormat;
use image::{DynamicImage, Rgb, RgbImage, RgbaImage};

/// Service for handling output format conversions
pub struct OutputFormatHandler;

impl OutputFormatHandler {
    /// Convert an RGBA removal result to the specified output format
    ///
    /// PNG keeps the alpha channel. JPEG cannot represent transparency, so
    /// the result is alpha-composited onto a white background instead of
    /// having its alpha channel dropped: removed regions come out white,
    /// soft mask edges blend instead of turning into hard fringes.
    #[must_use]
    pub fn convert_format(rgba_image: RgbaImage, format: OutputFormat) -> DynamicImage {
        match format {
            OutputFormat::Png => DynamicImage::ImageRgba8(rgba_image),
            OutputFormat::Jpeg => {
                DynamicImage::ImageRgb8(Self::flatten_onto_white(&rgba_image))
            },
        }
    }

    /// Alpha-composite an RGBA image onto a white background
    #[must_use]
    pub fn flatten_onto_white(rgba_image: &RgbaImage) -> RgbImage {
        let (width, height) = rgba_image.dimensions();
        let mut rgb_image = RgbImage::new(width, height);

        for (x, y, pixel) in rgba_image.enumerate_pixels() {
            let alpha = u16::from(pixel[3]);
            let blend = |channel: u8| -> u8 {
                let fg = u16::from(channel) * alpha;
                let bg = 255 * (255 - alpha);
                ((fg + bg) / 255) as u8
            };
            rgb_image.put_pixel(x, y, Rgb([blend(pixel[0]), blend(pixel[1]), blend(pixel[2])]));
        }

        rgb_image
    }

    /// File extension for a given output format (without the dot)
    #[must_use]
    pub fn extension(format: OutputFormat) -> &'static str {
        match format {
            OutputFormat::Png => "png",
            OutputFormat::Jpeg => "jpg",
        }
    }

    /// Whether a format can represent the transparent background
    #[must_use]
    pub fn supports_transparency(format: OutputFormat) -> bool {
        match format {
            OutputFormat::Png => true,
            OutputFormat::Jpeg => false,
        }
    }

    /// Warn when a format will lose the transparent background
    pub fn validate_for_background_removal(format: OutputFormat) {
        if !Self::supports_transparency(format) {
            log::warn!(
                "Output format {:?} does not support transparency. Removed regions will be flattened onto white.",
                format
            );
        }
    }
}
