//! Extension-indexed codec table
//!
//! Every supported extension maps to a decode/encode function pair built on
//! the `image` crate. Encoders convert pixel layouts the target format cannot
//! store (alpha for JPEG, 16-bit for 8-bit-only formats, floats everywhere).

use std::borrow::Cow;
use std::collections::BTreeSet;
use std::fs;
use std::io::Cursor;
use std::path::Path;

use image::{ColorType, DynamicImage, ImageFormat, ImageReader, ImageResult};
use thiserror::Error;

use crate::error::{SplitError, WriteError};
use crate::models::OutputFormat;

type DecodeFn = fn(&[u8]) -> ImageResult<DynamicImage>;
type EncodeFn = fn(&DynamicImage) -> ImageResult<Vec<u8>>;

/// One entry of the codec table.
pub struct Codec {
    pub name: &'static str,
    pub format: ImageFormat,
    /// Lowercase extensions (no dot) handled by this codec
    pub extensions: &'static [&'static str],
    pub decode: Option<DecodeFn>,
    pub encode: Option<EncodeFn>,
}

impl std::fmt::Debug for Codec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Codec")
            .field("name", &self.name)
            .field("extensions", &self.extensions)
            .field("decode", &self.decode.is_some())
            .field("encode", &self.encode.is_some())
            .finish()
    }
}

static CODECS: &[Codec] = &[
    Codec {
        name: "PNG",
        format: ImageFormat::Png,
        extensions: &["png"],
        decode: Some(decode_png),
        encode: Some(encode_png),
    },
    Codec {
        name: "JPEG",
        format: ImageFormat::Jpeg,
        extensions: &["jpg", "jpeg"],
        decode: Some(decode_jpeg),
        encode: Some(encode_jpeg),
    },
    Codec {
        name: "BMP",
        format: ImageFormat::Bmp,
        extensions: &["bmp"],
        decode: Some(decode_bmp),
        encode: Some(encode_bmp),
    },
    Codec {
        name: "GIF",
        format: ImageFormat::Gif,
        extensions: &["gif"],
        decode: Some(decode_gif),
        encode: Some(encode_gif),
    },
    Codec {
        name: "TIFF",
        format: ImageFormat::Tiff,
        extensions: &["tif", "tiff"],
        decode: Some(decode_tiff),
        encode: Some(encode_tiff),
    },
    Codec {
        name: "WebP",
        format: ImageFormat::WebP,
        extensions: &["webp"],
        decode: Some(decode_webp),
        encode: Some(encode_webp),
    },
    Codec {
        name: "PPM",
        format: ImageFormat::Pnm,
        extensions: &["ppm"],
        decode: Some(decode_ppm),
        encode: Some(encode_ppm),
    },
];

/// All registered codecs.
pub fn codecs() -> &'static [Codec] {
    CODECS
}

/// Look up the codec for an extension, case-insensitively.
pub fn codec_for_extension(ext: &str) -> Option<&'static Codec> {
    let ext = ext.trim_start_matches('.').to_ascii_lowercase();
    CODECS.iter().find(|codec| codec.extensions.contains(&ext.as_str()))
}

pub fn can_decode(ext: &str) -> bool {
    codec_for_extension(ext).is_some_and(|codec| codec.decode.is_some())
}

pub fn can_encode(ext: &str) -> bool {
    codec_for_extension(ext).is_some_and(|codec| codec.encode.is_some())
}

/// The configured output format has no encoder.
#[derive(Debug, Error)]
#[error("unsupported output format {0:?}")]
pub struct UnsupportedFormat(pub String);

/// Check a format override against the table before any work starts.
pub fn validate_output_format(format: &OutputFormat) -> Result<(), UnsupportedFormat> {
    match format {
        OutputFormat::Preserve => Ok(()),
        OutputFormat::Override(ext) if can_encode(ext) => Ok(()),
        OutputFormat::Override(ext) => Err(UnsupportedFormat(ext.clone())),
    }
}

/// Allowed extensions that no decoder can read, in sorted order.
pub fn undecodable_extensions(allowed: &BTreeSet<String>) -> Vec<&str> {
    allowed
        .iter()
        .map(String::as_str)
        .filter(|ext| !can_decode(ext))
        .collect()
}

/// Read and decode an image, choosing the decoder from its extension.
pub fn decode_file(path: &Path) -> Result<DynamicImage, SplitError> {
    let ext = path
        .extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or_default();
    let decode = codec_for_extension(ext)
        .and_then(|codec| codec.decode)
        .ok_or_else(|| SplitError::UnsupportedFormat(ext.to_string()))?;

    let bytes = fs::read(path).map_err(|source| SplitError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    decode(&bytes).map_err(|source| SplitError::Decode {
        path: path.to_path_buf(),
        source,
    })
}

/// Encode an image for the given extension, converting pixels as needed.
pub fn encode_image(image: &DynamicImage, ext: &str) -> Result<Vec<u8>, WriteError> {
    let codec = codec_for_extension(ext);
    let encode = codec
        .and_then(|codec| codec.encode)
        .ok_or_else(|| WriteError::UnsupportedFormat(ext.to_string()))?;

    encode(image).map_err(|source| WriteError::Encode {
        format: codec.map_or(ext, |codec| codec.name).to_string(),
        source,
    })
}

// ========================================================================
// Decoders
// ========================================================================

/// Decode with `fallback` unless the magic bytes say otherwise; mislabelled
/// files are common in downloaded images.
fn decode_sniffed(bytes: &[u8], fallback: ImageFormat) -> ImageResult<DynamicImage> {
    ImageReader::with_format(Cursor::new(bytes), fallback)
        .with_guessed_format()?
        .decode()
}

fn decode_png(bytes: &[u8]) -> ImageResult<DynamicImage> {
    decode_sniffed(bytes, ImageFormat::Png)
}

fn decode_jpeg(bytes: &[u8]) -> ImageResult<DynamicImage> {
    decode_sniffed(bytes, ImageFormat::Jpeg)
}

fn decode_bmp(bytes: &[u8]) -> ImageResult<DynamicImage> {
    decode_sniffed(bytes, ImageFormat::Bmp)
}

fn decode_gif(bytes: &[u8]) -> ImageResult<DynamicImage> {
    decode_sniffed(bytes, ImageFormat::Gif)
}

fn decode_tiff(bytes: &[u8]) -> ImageResult<DynamicImage> {
    decode_sniffed(bytes, ImageFormat::Tiff)
}

fn decode_webp(bytes: &[u8]) -> ImageResult<DynamicImage> {
    decode_sniffed(bytes, ImageFormat::WebP)
}

fn decode_ppm(bytes: &[u8]) -> ImageResult<DynamicImage> {
    decode_sniffed(bytes, ImageFormat::Pnm)
}

// ========================================================================
// Pixel conversions
// ========================================================================

fn is_eight_bit(color: ColorType) -> bool {
    matches!(
        color,
        ColorType::L8 | ColorType::La8 | ColorType::Rgb8 | ColorType::Rgba8
    )
}

fn is_sixteen_bit(color: ColorType) -> bool {
    matches!(
        color,
        ColorType::L16 | ColorType::La16 | ColorType::Rgb16 | ColorType::Rgba16
    )
}

/// 8-bit gray/RGB with or without alpha.
fn to_eight_bit(image: &DynamicImage) -> Cow<'_, DynamicImage> {
    if is_eight_bit(image.color()) {
        Cow::Borrowed(image)
    } else if image.color().has_alpha() {
        Cow::Owned(DynamicImage::ImageRgba8(image.to_rgba8()))
    } else {
        Cow::Owned(DynamicImage::ImageRgb8(image.to_rgb8()))
    }
}

/// 8-bit RGB/RGBA only (no gray channels).
fn to_rgb_family8(image: &DynamicImage) -> Cow<'_, DynamicImage> {
    match image.color() {
        ColorType::Rgb8 | ColorType::Rgba8 => Cow::Borrowed(image),
        color if color.has_alpha() => Cow::Owned(DynamicImage::ImageRgba8(image.to_rgba8())),
        _ => Cow::Owned(DynamicImage::ImageRgb8(image.to_rgb8())),
    }
}

/// 8- or 16-bit integer layouts, preserving depth where possible.
fn to_integer_depth(image: &DynamicImage) -> Cow<'_, DynamicImage> {
    let color = image.color();
    if is_eight_bit(color) || is_sixteen_bit(color) {
        Cow::Borrowed(image)
    } else if color.has_alpha() {
        Cow::Owned(DynamicImage::ImageRgba16(image.to_rgba16()))
    } else {
        Cow::Owned(DynamicImage::ImageRgb16(image.to_rgb16()))
    }
}

// ========================================================================
// Encoders
// ========================================================================

fn encode_as(image: &DynamicImage, format: ImageFormat) -> ImageResult<Vec<u8>> {
    let mut cursor = Cursor::new(Vec::new());
    image.write_to(&mut cursor, format)?;
    Ok(cursor.into_inner())
}

fn encode_png(image: &DynamicImage) -> ImageResult<Vec<u8>> {
    encode_as(&to_integer_depth(image), ImageFormat::Png)
}

fn encode_jpeg(image: &DynamicImage) -> ImageResult<Vec<u8>> {
    // JPEG has no alpha channel
    let converted = match image.color() {
        ColorType::L8 | ColorType::Rgb8 => Cow::Borrowed(image),
        ColorType::La8 | ColorType::L16 | ColorType::La16 => {
            Cow::Owned(DynamicImage::ImageLuma8(image.to_luma8()))
        }
        _ => Cow::Owned(DynamicImage::ImageRgb8(image.to_rgb8())),
    };
    encode_as(&converted, ImageFormat::Jpeg)
}

fn encode_bmp(image: &DynamicImage) -> ImageResult<Vec<u8>> {
    encode_as(&to_eight_bit(image), ImageFormat::Bmp)
}

fn encode_gif(image: &DynamicImage) -> ImageResult<Vec<u8>> {
    encode_as(&to_rgb_family8(image), ImageFormat::Gif)
}

fn encode_tiff(image: &DynamicImage) -> ImageResult<Vec<u8>> {
    let converted = match image.color() {
        ColorType::La8 => Cow::Owned(DynamicImage::ImageRgba8(image.to_rgba8())),
        ColorType::La16 => Cow::Owned(DynamicImage::ImageRgba16(image.to_rgba16())),
        _ => to_integer_depth(image),
    };
    encode_as(&converted, ImageFormat::Tiff)
}

fn encode_webp(image: &DynamicImage) -> ImageResult<Vec<u8>> {
    encode_as(&to_eight_bit(image), ImageFormat::WebP)
}

fn encode_ppm(image: &DynamicImage) -> ImageResult<Vec<u8>> {
    // Binary PPM stores RGB only
    let converted = match image.color() {
        ColorType::Rgb8 => Cow::Borrowed(image),
        _ => Cow::Owned(DynamicImage::ImageRgb8(image.to_rgb8())),
    };
    encode_as(&converted, ImageFormat::Pnm)
}
