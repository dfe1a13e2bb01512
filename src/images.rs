//! Raster image recompression.
//!
//! Every file directly under the image source directory is re-encoded and
//! written one level up. PNGs are always recompressed; JPEGs only when a
//! quality is configured. The smaller of the original and re-encoded bytes is
//! kept, and anything the encoders do not handle is copied unchanged.

use crate::config::{ImagesConfig, PngCompression};
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::{CompressionType, FilterType, PngEncoder};
use image::{ColorType, ImageEncoder, ImageFormat};
use rayon::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Error while minifying one image.
#[derive(Debug, Error)]
pub enum ImageError {
    /// Reading or writing failed
    #[error("IO error on {}: {source}", path.display())]
    Io {
        /// File involved
        path: PathBuf,
        /// Underlying IO error
        #[source]
        source: std::io::Error,
    },
    /// The codec rejected the image
    #[error("Failed to re-encode {}: {source}", path.display())]
    Codec {
        /// Source image
        path: PathBuf,
        /// Codec error
        #[source]
        source: image::ImageError,
    },
}

/// What happened to one image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageOutcome {
    /// Source file
    pub source: PathBuf,
    /// Written file
    pub output: PathBuf,
    /// Source size in bytes
    pub original_bytes: u64,
    /// Output size in bytes
    pub written_bytes: u64,
}

impl ImageOutcome {
    /// Bytes saved, zero when nothing shrank.
    pub fn saved(&self) -> u64 {
        self.original_bytes.saturating_sub(self.written_bytes)
    }
}

/// Minify every image in `sources` into `out_dir`, in parallel.
///
/// All images are attempted; the first error (in input order) is returned
/// after the rest have finished.
pub fn minify_images(
    sources: &[PathBuf],
    out_dir: &Path,
    config: &ImagesConfig,
) -> Result<Vec<ImageOutcome>, ImageError> {
    fs::create_dir_all(out_dir)
        .map_err(|source| ImageError::Io { path: out_dir.to_path_buf(), source })?;

    let results: Vec<Result<ImageOutcome, ImageError>> =
        sources.par_iter().map(|source| minify_image(source, out_dir, config)).collect();

    let mut outcomes = Vec::with_capacity(results.len());
    for result in results {
        let outcome = result?;
        tracing::debug!(
            image = %outcome.source.display(),
            before = outcome.original_bytes,
            after = outcome.written_bytes,
            "minified image"
        );
        outcomes.push(outcome);
    }
    Ok(outcomes)
}

/// Minify one image into `out_dir`, keeping its file name.
pub fn minify_image(
    source: &Path,
    out_dir: &Path,
    config: &ImagesConfig,
) -> Result<ImageOutcome, ImageError> {
    let original =
        fs::read(source).map_err(|e| ImageError::Io { path: source.to_path_buf(), source: e })?;
    let file_name = source.file_name().unwrap_or(source.as_os_str());
    let output = out_dir.join(file_name);

    let reencoded = match ImageFormat::from_path(source).ok() {
        Some(ImageFormat::Png) => Some(encode_png(source, &original, config.png_compression)?),
        Some(ImageFormat::Jpeg) => match config.jpeg_quality {
            Some(quality) => Some(encode_jpeg(source, &original, quality)?),
            None => None,
        },
        _ => None,
    };

    let bytes = match reencoded {
        Some(ref data) if data.len() < original.len() => data.as_slice(),
        _ => original.as_slice(),
    };

    fs::write(&output, bytes).map_err(|e| ImageError::Io { path: output.clone(), source: e })?;

    Ok(ImageOutcome {
        source: source.to_path_buf(),
        output,
        original_bytes: original.len() as u64,
        written_bytes: bytes.len() as u64,
    })
}

fn compression_type(level: PngCompression) -> CompressionType {
    match level {
        PngCompression::Fast => CompressionType::Fast,
        PngCompression::Default => CompressionType::Default,
        PngCompression::Best => CompressionType::Best,
    }
}

fn encode_png(path: &Path, data: &[u8], level: PngCompression) -> Result<Vec<u8>, ImageError> {
    let codec = |source| ImageError::Codec { path: path.to_path_buf(), source };
    let img = image::load_from_memory_with_format(data, ImageFormat::Png).map_err(codec)?;

    let mut buf = Vec::new();
    PngEncoder::new_with_quality(&mut buf, compression_type(level), FilterType::Adaptive)
        .write_image(img.as_bytes(), img.width(), img.height(), img.color())
        .map_err(codec)?;
    Ok(buf)
}

fn encode_jpeg(path: &Path, data: &[u8], quality: u8) -> Result<Vec<u8>, ImageError> {
    let codec = |source| ImageError::Codec { path: path.to_path_buf(), source };
    let rgb = image::load_from_memory_with_format(data, ImageFormat::Jpeg).map_err(codec)?.to_rgb8();

    let mut buf = Vec::new();
    JpegEncoder::new_with_quality(&mut buf, quality)
        .encode(rgb.as_raw(), rgb.width(), rgb.height(), ColorType::Rgb8)
        .map_err(codec)?;
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage, Rgba, RgbaImage};
    use tempfile::TempDir;

    fn write_png(path: &Path) {
        let img = RgbaImage::from_fn(64, 64, |x, _| {
            if x < 32 {
                Rgba([200, 30, 30, 255])
            } else {
                Rgba([30, 30, 200, 255])
            }
        });
        let mut buf = Vec::new();
        PngEncoder::new_with_quality(&mut buf, CompressionType::Fast, FilterType::NoFilter)
            .write_image(img.as_raw(), 64, 64, ColorType::Rgba8)
            .unwrap();
        fs::write(path, buf).unwrap();
    }

    fn write_jpeg(path: &Path) {
        let img = RgbImage::from_fn(64, 64, |x, y| Rgb([(x * 4) as u8, (y * 4) as u8, 128]));
        let mut buf = Vec::new();
        JpegEncoder::new_with_quality(&mut buf, 100)
            .encode(img.as_raw(), 64, 64, ColorType::Rgb8)
            .unwrap();
        fs::write(path, buf).unwrap();
    }

    #[test]
    fn test_png_is_recompressed_into_parent() {
        let temp = TempDir::new().unwrap();
        let src_dir = temp.path().join("img/src");
        fs::create_dir_all(&src_dir).unwrap();
        let logo = src_dir.join("logo.png");
        write_png(&logo);

        let out_dir = temp.path().join("img");
        let outcomes = minify_images(&[logo], &out_dir, &ImagesConfig::default()).unwrap();

        assert_eq!(outcomes.len(), 1);
        assert_eq!(outcomes[0].output, out_dir.join("logo.png"));
        assert!(outcomes[0].written_bytes <= outcomes[0].original_bytes);
        let decoded = image::open(&outcomes[0].output).unwrap();
        assert_eq!(decoded.width(), 64);
    }

    #[test]
    fn test_jpeg_copied_without_quality() {
        let temp = TempDir::new().unwrap();
        let photo = temp.path().join("photo.jpg");
        write_jpeg(&photo);
        let out_dir = temp.path().join("out");

        let outcomes = minify_images(&[photo.clone()], &out_dir, &ImagesConfig::default()).unwrap();
        assert_eq!(fs::read(&photo).unwrap(), fs::read(&outcomes[0].output).unwrap());
        assert_eq!(outcomes[0].saved(), 0);
    }

    #[test]
    fn test_jpeg_quality_shrinks() {
        let temp = TempDir::new().unwrap();
        let photo = temp.path().join("photo.jpg");
        write_jpeg(&photo);
        let config = ImagesConfig { jpeg_quality: Some(40), ..ImagesConfig::default() };

        let outcomes = minify_images(&[photo], &temp.path().join("out"), &config).unwrap();
        assert!(outcomes[0].written_bytes < outcomes[0].original_bytes);
    }

    #[test]
    fn test_unknown_format_is_copied() {
        let temp = TempDir::new().unwrap();
        let icon = temp.path().join("icon.svg");
        fs::write(&icon, "<svg xmlns=\"http://www.w3.org/2000/svg\"/>").unwrap();

        let outcomes =
            minify_images(&[icon], &temp.path().join("out"), &ImagesConfig::default()).unwrap();
        let copied = fs::read_to_string(&outcomes[0].output).unwrap();
        assert!(copied.starts_with("<svg"));
    }

    #[test]
    fn test_corrupt_png_fails() {
        let temp = TempDir::new().unwrap();
        let broken = temp.path().join("broken.png");
        fs::write(&broken, b"not a png").unwrap();

        let result = minify_images(&[broken], &temp.path().join("out"), &ImagesConfig::default());
        assert!(matches!(result, Err(ImageError::Codec { .. })));
    }
}
