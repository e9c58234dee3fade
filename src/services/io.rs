//! Image file input/output service
//!
//! Separates file I/O from the queue/batch logic, keeping the controller
//! testable against in-memory images.

use crate::{
    config::OutputFormat,
    error::{CutoutError, Result},
};
use image::DynamicImage;
use std::path::Path;

/// What an enqueue-time probe learned about a source file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceInfo {
    /// File size in bytes
    pub file_bytes: u64,
    /// Decoded dimensions (width, height)
    pub dimensions: (u32, u32),
}

/// Service for handling image file input/output operations
pub struct ImageIoService;

impl ImageIoService {
    /// Load an image from a file path
    ///
    /// Tries extension-based format detection first, then falls back to
    /// content-based detection so mislabelled files still load.
    ///
    /// # Errors
    /// * `Io` - the file does not exist or cannot be read
    /// * `InvalidImage` - neither detection strategy could decode the file
    pub fn load_image<P: AsRef<Path>>(path: P) -> Result<DynamicImage> {
        let path_ref = path.as_ref();

        if !path_ref.exists() {
            return Err(CutoutError::file_io_error(
                "read image file",
                path_ref,
                &std::io::Error::new(std::io::ErrorKind::NotFound, "file does not exist"),
            ));
        }

        match image::open(path_ref) {
            Ok(img) => Ok(img),
            Err(e) => {
                log::debug!(
                    "Extension-based loading failed for {}: {}. Attempting content-based detection.",
                    path_ref.display(),
                    e
                );

                let data = std::fs::read(path_ref).map_err(|io_err| {
                    CutoutError::file_io_error("read image data", path_ref, &io_err)
                })?;

                image::load_from_memory(&data)
                    .map_err(|content_err| {
                        CutoutError::invalid_image(format!(
                            "Failed to load '{}' with both extension-based and content-based detection. Extension error: {}. Content error: {}",
                            path_ref.display(),
                            e,
                            content_err
                        ))
                    })
            },
        }
    }

    /// Probe a source file without fully decoding it
    ///
    /// Reads the file size and the image header dimensions. This is what
    /// enqueue validation uses: cheap enough to run per drag-and-drop file,
    /// and enough to apply size/dimension guardrails.
    ///
    /// # Errors
    /// * `Io` - metadata or header read failed
    /// * `InvalidImage` - the header is not a decodable image format
    pub fn probe_source<P: AsRef<Path>>(path: P) -> Result<SourceInfo> {
        let path_ref = path.as_ref();

        let metadata = std::fs::metadata(path_ref)
            .map_err(|e| CutoutError::file_io_error("stat image file", path_ref, &e))?;

        let reader = image::ImageReader::open(path_ref)
            .map_err(|e| CutoutError::file_io_error("open image file", path_ref, &e))?
            .with_guessed_format()
            .map_err(|e| CutoutError::file_io_error("sniff image format", path_ref, &e))?;

        let dimensions = reader
            .into_dimensions()
            .map_err(|e| CutoutError::image_load_error(path_ref, &e))?;

        Ok(SourceInfo {
            file_bytes: metadata.len(),
            dimensions,
        })
    }

    /// Save an image to a file in the given output format
    ///
    /// Creates missing parent directories. JPEG output is flattened to RGB
    /// and written with the given quality; PNG keeps the alpha channel.
    ///
    /// # Errors
    /// * `Save` - directory creation or encoding/writing failed
    pub fn save_image<P: AsRef<Path>>(
        image: &DynamicImage,
        path: P,
        format: OutputFormat,
        jpeg_quality: u8,
    ) -> Result<()> {
        let path_ref = path.as_ref();

        if let Some(parent) = path_ref.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    CutoutError::save_error(parent, &format!("cannot create directory: {e}"))
                })?;
            }
        }

        match format {
            OutputFormat::Png => image
                .save_with_format(path_ref, image::ImageFormat::Png)
                .map_err(|e| CutoutError::save_error(path_ref, &format!("PNG encode: {e}"))),
            OutputFormat::Jpeg => {
                let file = std::fs::File::create(path_ref).map_err(|e| {
                    CutoutError::save_error(path_ref, &format!("cannot create file: {e}"))
                })?;
                let mut writer = std::io::BufWriter::new(file);
                let rgb = image.to_rgb8();
                let mut encoder =
                    image::codecs::jpeg::JpegEncoder::new_with_quality(&mut writer, jpeg_quality);
                encoder
                    .encode_image(&rgb)
                    .map_err(|e| CutoutError::save_error(path_ref, &format!("JPEG encode: {e}")))
            },
        }
    }

    /// Check if a file path has a supported image extension
    ///
    /// The accepted set matches the app's open dialog: PNG, JPEG, BMP, GIF.
    pub fn is_supported_format<P: AsRef<Path>>(path: P) -> bool {
        path.as_ref()
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| {
                matches!(
                    ext.to_lowercase().as_str(),
                    "png" | "jpg" | "jpeg" | "bmp" | "gif"
                )
            })
            .unwrap_or(false)
    }

    /// Load an image from raw bytes (drag-and-drop payloads, clipboard)
    ///
    /// # Errors
    /// * `InvalidImage` - the bytes are not a decodable image
    pub fn load_from_bytes(bytes: &[u8]) -> Result<DynamicImage> {
        image::load_from_memory(bytes).map_err(|e| {
            CutoutError::invalid_image(format!("Failed to decode image from bytes: {e}"))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_is_supported_format() {
        assert!(ImageIoService::is_supported_format("test.png"));
        assert!(ImageIoService::is_supported_format("test.jpg"));
        assert!(ImageIoService::is_supported_format("test.jpeg"));
        assert!(ImageIoService::is_supported_format("test.bmp"));
        assert!(ImageIoService::is_supported_format("test.gif"));

        assert!(!ImageIoService::is_supported_format("test.webp"));
        assert!(!ImageIoService::is_supported_format("test.txt"));
        assert!(!ImageIoService::is_supported_format("test"));
    }

    #[test]
    fn test_is_supported_format_case_insensitive() {
        assert!(ImageIoService::is_supported_format("test.PNG"));
        assert!(ImageIoService::is_supported_format("test.JpEg"));
        assert!(ImageIoService::is_supported_format("/path/to/file.GIF"));
    }

    #[test]
    fn test_load_nonexistent_file() {
        let result = ImageIoService::load_image("nonexistent.jpg");
        assert!(result.is_err());

        if let Err(e) = result {
            assert!(e.to_string().contains("does not exist"));
        }
    }

    #[test]
    fn test_save_image_creates_directory() {
        let temp_dir = tempdir().unwrap();
        let nested_path = temp_dir.path().join("nested").join("dir").join("test.png");

        let image = DynamicImage::new_rgb8(1, 1);
        let result = ImageIoService::save_image(&image, &nested_path, OutputFormat::Png, 95);

        assert!(result.is_ok());
        assert!(nested_path.exists());
    }

    #[test]
    fn test_save_and_reload_preserves_dimensions() {
        let temp_dir = tempdir().unwrap();

        for (width, height) in [(1, 1), (50, 25), (100, 200)] {
            let image = DynamicImage::new_rgba8(width, height);
            let path = temp_dir.path().join(format!("test_{width}x{height}.png"));

            ImageIoService::save_image(&image, &path, OutputFormat::Png, 95).unwrap();

            let loaded = ImageIoService::load_image(&path).unwrap();
            assert_eq!(loaded.width(), width);
            assert_eq!(loaded.height(), height);
        }
    }

    #[test]
    fn test_save_jpeg_flattens_alpha() {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("test.jpg");

        let image = DynamicImage::new_rgba8(8, 8);
        ImageIoService::save_image(&image, &path, OutputFormat::Jpeg, 95).unwrap();

        let loaded = ImageIoService::load_image(&path).unwrap();
        assert_eq!(loaded.color().channel_count(), 3);
    }

    #[test]
    fn test_probe_source_reads_dimensions_and_size() {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("probe.png");
        let image = DynamicImage::new_rgba8(33, 21);
        ImageIoService::save_image(&image, &path, OutputFormat::Png, 95).unwrap();

        let info = ImageIoService::probe_source(&path).unwrap();
        assert_eq!(info.dimensions, (33, 21));
        assert_eq!(info.file_bytes, std::fs::metadata(&path).unwrap().len());
    }

    #[test]
    fn test_probe_source_rejects_non_image() {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("not_an_image.png");
        std::fs::write(&path, b"plain text pretending to be a PNG").unwrap();

        let result = ImageIoService::probe_source(&path);
        assert!(matches!(result, Err(CutoutError::InvalidImage(_))));
    }

    #[test]
    fn test_load_from_bytes_valid() {
        let image = DynamicImage::new_rgb8(1, 1);
        let mut bytes = Vec::new();
        image
            .write_to(
                &mut std::io::Cursor::new(&mut bytes),
                image::ImageFormat::Png,
            )
            .unwrap();

        let loaded = ImageIoService::load_from_bytes(&bytes).unwrap();
        assert_eq!(loaded.width(), 1);
        assert_eq!(loaded.height(), 1);
    }

    #[test]
    fn test_load_from_bytes_invalid() {
        assert!(ImageIoService::load_from_bytes(b"This is not an image").is_err());
        assert!(ImageIoService::load_from_bytes(&[]).is_err());
    }

    #[test]
    fn test_load_image_content_detection_fallback() {
        let temp_dir = tempdir().unwrap();
        // PNG bytes behind a .jpg extension: extension-based decode fails,
        // content sniffing succeeds.
        let path = temp_dir.path().join("mislabelled.jpg");
        let image = DynamicImage::new_rgba8(4, 4);
        let mut bytes = Vec::new();
        image
            .write_to(
                &mut std::io::Cursor::new(&mut bytes),
                image::ImageFormat::Png,
            )
            .unwrap();
        std::fs::write(&path, &bytes).unwrap();

        let loaded = ImageIoService::load_image(&path).unwrap();
        assert_eq!(loaded.width(), 4);
    }
}
