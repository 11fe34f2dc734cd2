use std::fmt;
use std::hash::{DefaultHasher, Hash, Hasher};
use std::io::Cursor;
use std::sync::Arc;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use image::{ImageFormat, RgbaImage};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::SnapshotError;

pub const PNG_MIME_TYPE: &str = "image/png";

/// Immutable, PNG-encoded capture of a pixel buffer.
///
/// Cloning is cheap: the encoded bytes are shared. Snapshots serialize as
/// `data:image/png;base64,...` strings so they can live inside JSON documents.
#[derive(Clone, PartialEq, Eq)]
pub struct Snapshot {
    png: Arc<[u8]>,
    width: u32,
    height: u32,
}

impl Snapshot {
    /// Encode the current contents of `pixels`
    pub fn capture(pixels: &RgbaImage) -> Result<Self, SnapshotError> {
        let mut png = Vec::new();
        pixels
            .write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
            .map_err(SnapshotError::Encode)?;

        Ok(Self {
            png: png.into(),
            width: pixels.width(),
            height: pixels.height(),
        })
    }

    /// Wrap bytes that are already PNG encoded. The bytes are decoded once to
    /// validate them and learn the dimensions.
    pub fn from_png_bytes(png: Vec<u8>) -> Result<Self, SnapshotError> {
        let decoded = image::load_from_memory_with_format(&png, ImageFormat::Png)
            .map_err(SnapshotError::Decode)?;

        Ok(Self {
            width: decoded.width(),
            height: decoded.height(),
            png: png.into(),
        })
    }

    /// Build a snapshot from any image format the `image` crate understands,
    /// re-encoding it as PNG.
    pub fn from_image_bytes(bytes: &[u8]) -> Result<Self, SnapshotError> {
        let decoded = image::load_from_memory(bytes).map_err(SnapshotError::Decode)?;
        Self::capture(&decoded.to_rgba8())
    }

    /// Decode back into raw RGBA pixels
    pub fn decode(&self) -> Result<RgbaImage, SnapshotError> {
        image::load_from_memory_with_format(&self.png, ImageFormat::Png)
            .map(|img| img.to_rgba8())
            .map_err(SnapshotError::Decode)
    }

    pub fn png_bytes(&self) -> &[u8] {
        &self.png
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Size as `[width, height]`, the order egui expects
    pub fn size(&self) -> [usize; 2] {
        [self.width as usize, self.height as usize]
    }

    pub fn to_base64(&self) -> String {
        STANDARD.encode(&self.png)
    }

    pub fn to_data_url(&self) -> String {
        format!("data:{};base64,{}", PNG_MIME_TYPE, self.to_base64())
    }

    /// Parse a `data:<mime>;base64,<payload>` URL. Non-PNG payloads are
    /// re-encoded.
    pub fn from_data_url(url: &str) -> Result<Self, SnapshotError> {
        let rest = url.strip_prefix("data:").ok_or(SnapshotError::InvalidDataUrl)?;
        let (header, payload) = rest.split_once(',').ok_or(SnapshotError::InvalidDataUrl)?;
        let mime = header
            .strip_suffix(";base64")
            .ok_or(SnapshotError::InvalidDataUrl)?;

        let bytes = STANDARD.decode(payload.trim())?;
        if mime == PNG_MIME_TYPE {
            Self::from_png_bytes(bytes)
        } else {
            Self::from_image_bytes(&bytes)
        }
    }

    /// Stable hash of the encoded bytes, used to key cached textures
    pub fn content_hash(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.png.hash(&mut hasher);
        hasher.finish()
    }
}

impl fmt::Debug for Snapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Snapshot")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("png_len", &self.png.len())
            .finish()
    }
}

impl Serialize for Snapshot {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_data_url())
    }
}

impl<'de> Deserialize<'de> for Snapshot {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let url = String::deserialize(deserializer)?;
        Snapshot::from_data_url(&url).map_err(serde::de::Error::custom)
    }
}
