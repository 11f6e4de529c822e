use std::collections::HashMap;
use std::sync::Arc;

use image::DynamicImage;
use serde::{Deserialize, Serialize};

use crate::document::{Document, Image, ImageSource, PixelFormat};
use crate::error::{lookup, ImportError, Result, TableKind};

#[derive(Serialize, Deserialize, Debug, Clone, Copy, Hash, PartialEq, Eq)]
pub enum FilterMode {
    Nearest,
    Linear,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, Hash, PartialEq, Eq)]
pub enum MipmapFilterMode {
    Nearest,
    Linear,
    None,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, Hash, PartialEq, Eq)]
pub enum WrapMode {
    Repeat,
    ClampToEdge,
    MirroredRepeat,
}

#[derive(Serialize, Deserialize, Debug, Hash, PartialEq, Eq, Clone, Copy)]
pub struct Sampler {
    pub mag_filter: FilterMode,
    pub min_filter: FilterMode,
    pub mipmap_filter: MipmapFilterMode,
    pub wrap_u: WrapMode,
    pub wrap_v: WrapMode,
}
impl Default for Sampler {
    fn default() -> Self {
        Self {
            mag_filter: FilterMode::Linear,
            min_filter: FilterMode::Linear,
            mipmap_filter: MipmapFilterMode::Linear,
            wrap_u: WrapMode::Repeat,
            wrap_v: WrapMode::Repeat,
        }
    }
}

/// Output of the image-decode boundary: 8 bits per channel, rows top to bottom.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedImage {
    pub pixels: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub channels: u8,
}

/// Turns a document image into raw pixels.
pub trait ImageDecoder {
    fn decode(&self, image: &Image) -> Result<DecodedImage>;
}

/// Decodes encoded images with the `image` crate and narrows raw payloads to 8 bits.
#[derive(Debug, Default, Clone, Copy)]
pub struct StandardDecoder;

impl ImageDecoder for StandardDecoder {
    fn decode(&self, image: &Image) -> Result<DecodedImage> {
        match &image.source {
            ImageSource::Encoded { bytes, .. } => {
                let img = image::load_from_memory(bytes)?;
                Ok(from_dynamic(img))
            }
            ImageSource::Pixels {
                pixels,
                width,
                height,
                format,
            } => from_raw(pixels, *width, *height, *format),
        }
    }
}

fn from_dynamic(img: DynamicImage) -> DecodedImage {
    let (width, height) = (img.width(), img.height());
    let (pixels, channels) = match img {
        DynamicImage::ImageLuma8(buf) => (buf.into_raw(), 1),
        DynamicImage::ImageLumaA8(buf) => (buf.into_raw(), 2),
        DynamicImage::ImageRgb8(buf) => (buf.into_raw(), 3),
        DynamicImage::ImageRgba8(buf) => (buf.into_raw(), 4),
        DynamicImage::ImageLuma16(_) => (img.to_luma8().into_raw(), 1),
        DynamicImage::ImageLumaA16(_) => (img.to_luma_alpha8().into_raw(), 2),
        DynamicImage::ImageRgb16(_) | DynamicImage::ImageRgb32F(_) => {
            (img.to_rgb8().into_raw(), 3)
        }
        _ => (img.to_rgba8().into_raw(), 4),
    };
    DecodedImage {
        pixels,
        width,
        height,
        channels,
    }
}

fn from_raw(pixels: &[u8], width: u32, height: u32, format: PixelFormat) -> Result<DecodedImage> {
    let channels = format.channels();
    let expected = width as usize * height as usize * channels * format.bytes_per_channel();
    if pixels.len() != expected {
        return Err(ImportError::texture(format!(
            "{}x{} {:?} image should have {} bytes, found {}",
            width,
            height,
            format,
            expected,
            pixels.len()
        )));
    }
    let pixels = match format.bytes_per_channel() {
        1 => pixels.to_vec(),
        // little-endian u16, keep the high byte
        2 => pixels.chunks_exact(2).map(|c| c[1]).collect(),
        _ => {
            return Err(ImportError::texture(format!(
                "floating point image format {:?} is not supported",
                format
            )))
        }
    };
    Ok(DecodedImage {
        pixels,
        width,
        height,
        channels: channels as u8,
    })
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Texture {
    pub pixels: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub channels: u8,
    /// Index of the document image this texture was decoded from.
    pub image_index: usize,
    pub name: Option<String>,
}

impl Texture {
    pub fn from_decoded(
        image_index: usize,
        name: Option<String>,
        decoded: DecodedImage,
        expand_rgb_to_rgba: bool,
    ) -> Result<Self> {
        if !(1..=4).contains(&decoded.channels) {
            return Err(ImportError::texture(format!(
                "unsupported channel count {} for image {}",
                decoded.channels, image_index
            )));
        }
        if decoded.width == 0 || decoded.height == 0 {
            return Err(ImportError::texture(format!(
                "image {} has zero size ({}x{})",
                image_index, decoded.width, decoded.height
            )));
        }
        let expected =
            decoded.width as usize * decoded.height as usize * decoded.channels as usize;
        if decoded.pixels.len() != expected {
            return Err(ImportError::texture(format!(
                "image {} pixel payload is {} bytes, expected {}",
                image_index,
                decoded.pixels.len(),
                expected
            )));
        }

        let (pixels, channels) = if expand_rgb_to_rgba && decoded.channels == 3 {
            (convert_rgb8_to_rgba8(&decoded.pixels), 4)
        } else {
            (decoded.pixels, decoded.channels)
        };

        Ok(Self {
            pixels,
            width: decoded.width,
            height: decoded.height,
            channels,
            image_index,
            name,
        })
    }
}

fn convert_rgb8_to_rgba8(rgb: &[u8]) -> Vec<u8> {
    let mut rgba = Vec::with_capacity((rgb.len() / 3) * 4);
    for chunk in rgb.chunks_exact(3) {
        rgba.extend_from_slice(chunk);
        rgba.push(u8::MAX);
    }
    rgba
}

/// Decoded textures of one load, keyed by source image index.
#[derive(Debug, Default)]
pub struct TextureCache {
    entries: HashMap<usize, Arc<Texture>>,
    // first-decode order, handed to the model
    order: Vec<Arc<Texture>>,
    hits: usize,
    misses: usize,
}

impl TextureCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the texture for `image_index`, decoding it on first request only.
    pub fn get_or_decode(
        &mut self,
        document: &Document,
        image_index: usize,
        decoder: &dyn ImageDecoder,
        expand_rgb_to_rgba: bool,
    ) -> Result<Arc<Texture>> {
        if let Some(texture) = self.entries.get(&image_index) {
            self.hits += 1;
            log::debug!("texture cache hit for image {}", image_index);
            return Ok(Arc::clone(texture));
        }

        let image = lookup(&document.images, TableKind::Image, image_index)?;
        let decoded = decoder.decode(image)?;
        let name = image.name.clone().or_else(|| image.uri.clone());
        let texture = Arc::new(Texture::from_decoded(
            image_index,
            name,
            decoded,
            expand_rgb_to_rgba,
        )?);
        log::debug!(
            "decoded image {} ({}x{}, {} channels)",
            image_index,
            texture.width,
            texture.height,
            texture.channels
        );

        self.misses += 1;
        self.entries.insert(image_index, Arc::clone(&texture));
        self.order.push(Arc::clone(&texture));
        Ok(texture)
    }

    pub fn hits(&self) -> usize {
        self.hits
    }

    pub fn misses(&self) -> usize {
        self.misses
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn into_textures(self) -> Vec<Arc<Texture>> {
        self.order
    }
}
