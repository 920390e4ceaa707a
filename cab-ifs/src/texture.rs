//! Texture-list pass and atlas decoding.
//!
//! A directory holding textures carries a `texturelist.xml` side manifest.
//! Each `<texture><image name="…">` entry points at a payload stored under
//! the MD5 hash of the image name; this pass surfaces those payloads under
//! `<name>.png` and records the crop geometry needed to decode them.
//! Rect values in the manifest are half-pixel units, so every coordinate
//! is divided by two on the way in.

use std::io::Cursor;

use cab_protocol::{Charset, Node};
use image::{ImageFormat, RgbaImage};
use md5::{Digest, Md5};
use tracing::debug;

use crate::IfsError;

/// Crop geometry and pixel format for one atlas entry.
#[derive(Debug, Clone)]
pub struct TextureInfo {
    /// Pixel format identifier from the texture list, e.g. `argb8888rev`.
    pub format: String,
    /// Payload rectangle `(left, right, top, bottom)` in pixels.
    pub imgrect: [u32; 4],
    /// Visible sub-rectangle `(left, right, top, bottom)` in pixels.
    pub uvrect: [u32; 4],
}

impl TextureInfo {
    /// Payload width in pixels.
    pub fn width(&self) -> u32 {
        self.imgrect[1].saturating_sub(self.imgrect[0])
    }

    /// Payload height in pixels.
    pub fn height(&self) -> u32 {
        self.imgrect[3].saturating_sub(self.imgrect[2])
    }
}

/// One rename produced by the texture-list pass.
pub(crate) struct TextureRename {
    /// Path of the MD5-hashed payload file.
    pub hashed: String,
    /// Human-readable path it should appear under.
    pub logical: String,
    pub info: TextureInfo,
}

/// Walks a parsed `texturelist.xml` document and produces the renames for
/// the directory `dir` (no trailing slash, empty for the container root).
pub(crate) fn texture_renames(doc: &Node, dir: &str, charset: Charset) -> Vec<TextureRename> {
    let mut renames = Vec::new();
    for texture in doc.children_named("texture") {
        let format = texture.attribute("format").unwrap_or_default().to_owned();
        for image in texture.children_named("image") {
            let Some(name) = image.attribute("name") else {
                continue;
            };
            let (Some(imgrect), Some(uvrect)) =
                (rect4(image.child("imgrect")), rect4(image.child("uvrect")))
            else {
                debug!(name, "image entry without usable rects, skipped");
                continue;
            };
            let hashed = join(dir, &hashed_name(name, charset));
            let logical = join(dir, &format!("{name}.png"));
            renames.push(TextureRename {
                hashed,
                logical,
                info: TextureInfo {
                    format: format.clone(),
                    imgrect,
                    uvrect,
                },
            });
        }
    }
    renames
}

/// MD5 of `name` in the manifest charset, as a lowercase hex string.
pub(crate) fn hashed_name(name: &str, charset: Charset) -> String {
    let bytes = charset
        .encode(name)
        .unwrap_or_else(|| name.as_bytes().to_vec());
    hex::encode(Md5::digest(&bytes))
}

pub(crate) fn join(dir: &str, name: &str) -> String {
    if dir.is_empty() {
        name.to_owned()
    } else {
        format!("{dir}/{name}")
    }
}

/// Reads a four-element integer array child as pixel coordinates,
/// halving the stored half-pixel units.
fn rect4(node: Option<&Node>) -> Option<[u32; 4]> {
    let values = node?.value()?.as_integers()?;
    if values.len() != 4 {
        return None;
    }
    let mut rect = [0u32; 4];
    for (slot, value) in rect.iter_mut().zip(&values) {
        *slot = u32::try_from(*value / 2).ok()?;
    }
    Some(rect)
}

// ============================================================================
// Atlas decoding
// ============================================================================

/// Decodes an `argb8888rev` payload to PNG bytes, cropped to the uvrect.
///
/// The payload holds one 32-bit little-endian ARGB word per pixel, so the
/// byte order is B, G, R, A. Payloads shorter than `width * height * 4`
/// are zero-padded before decoding. A format this decoder does not know
/// yields the raw payload unchanged.
///
/// # Errors
///
/// Returns [`IfsError::Texture`] for degenerate geometry or a PNG
/// encoding failure.
pub(crate) fn decode_texture(path: &str, payload: &[u8], info: &TextureInfo) -> Result<Vec<u8>, IfsError> {
    let error = |reason: String| IfsError::Texture {
        path: path.to_owned(),
        reason,
    };

    if info.format != "argb8888rev" {
        debug!(path, format = %info.format, "unrecognized pixel format, passing raw bytes");
        return Ok(payload.to_vec());
    }

    let width = info.width();
    let height = info.height();
    if width == 0 || height == 0 {
        return Err(error("empty imgrect".to_owned()));
    }

    let needed = width as usize * height as usize * 4;
    let mut pixels = payload.to_vec();
    if pixels.len() < needed {
        debug!(path, have = pixels.len(), needed, "short texture payload, zero-padding");
        pixels.resize(needed, 0);
    }

    let mut img = RgbaImage::new(width, height);
    for (px, bgra) in img.pixels_mut().zip(pixels.chunks_exact(4)) {
        *px = image::Rgba([bgra[2], bgra[1], bgra[0], bgra[3]]);
    }

    // The uvrect is absolute; make it relative to the payload origin.
    let x = info.uvrect[0].saturating_sub(info.imgrect[0]);
    let y = info.uvrect[2].saturating_sub(info.imgrect[2]);
    let w = info.uvrect[1].saturating_sub(info.uvrect[0]);
    let h = info.uvrect[3].saturating_sub(info.uvrect[2]);
    if w == 0 || h == 0 || x + w > width || y + h > height {
        return Err(error(format!("uvrect {:?} outside imgrect {:?}", info.uvrect, info.imgrect)));
    }
    let cropped = image::imageops::crop_imm(&img, x, y, w, h).to_image();

    let mut out = Vec::new();
    cropped
        .write_to(&mut Cursor::new(&mut out), ImageFormat::Png)
        .map_err(|e| error(format!("png encode failed: {e}")))?;
    Ok(out)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use cab_protocol::Value;

    fn image_node(name: &str, imgrect: [i32; 4], uvrect: [i32; 4]) -> Node {
        let mut image = Node::void("image").unwrap();
        image.set_attribute("name", name).unwrap();
        image.append(Node::with_value("imgrect", Value::S32Array(imgrect.to_vec())).unwrap());
        image.append(Node::with_value("uvrect", Value::S32Array(uvrect.to_vec())).unwrap());
        image
    }

    fn texture_list(images: Vec<Node>) -> Node {
        let mut root = Node::void("texturelist").unwrap();
        let mut texture = Node::void("texture").unwrap();
        texture.set_attribute("format", "argb8888rev").unwrap();
        for image in images {
            texture.append(image);
        }
        root.append(texture);
        root
    }

    #[test]
    fn test_renames_hash_and_halve() {
        let doc = texture_list(vec![image_node("hero", [0, 8, 0, 4], [2, 6, 0, 4])]);
        let renames = texture_renames(&doc, "tex", Charset::Ascii);
        assert_eq!(renames.len(), 1);
        assert_eq!(renames[0].hashed, format!("tex/{}", hashed_name("hero", Charset::Ascii)));
        assert_eq!(renames[0].logical, "tex/hero.png");
        assert_eq!(renames[0].info.imgrect, [0, 4, 0, 2]);
        assert_eq!(renames[0].info.uvrect, [1, 3, 0, 2]);
    }

    #[test]
    fn test_image_without_rects_skipped() {
        let mut bare = Node::void("image").unwrap();
        bare.set_attribute("name", "ghost").unwrap();
        let doc = texture_list(vec![bare]);
        assert!(texture_renames(&doc, "tex", Charset::Ascii).is_empty());
    }

    #[test]
    fn test_decode_crops_and_swizzles() {
        // 2x2 payload; uvrect selects the right column.
        let info = TextureInfo {
            format: "argb8888rev".to_owned(),
            imgrect: [0, 2, 0, 2],
            uvrect: [1, 2, 0, 2],
        };
        #[rustfmt::skip]
        let payload = [
            0xFF, 0x00, 0x00, 0xFF,  0x00, 0xFF, 0x00, 0xFF, // blue, green
            0x00, 0x00, 0xFF, 0xFF,  0x10, 0x20, 0x30, 0x40, // red, misc
        ];
        let png = decode_texture("t", &payload, &info).unwrap();
        let img = image::load_from_memory_with_format(&png, ImageFormat::Png)
            .unwrap()
            .to_rgba8();
        assert_eq!(img.dimensions(), (1, 2));
        assert_eq!(img.get_pixel(0, 0).0, [0x00, 0xFF, 0x00, 0xFF]);
        assert_eq!(img.get_pixel(0, 1).0, [0x30, 0x20, 0x10, 0x40]);
    }

    #[test]
    fn test_decode_pads_short_payload() {
        let info = TextureInfo {
            format: "argb8888rev".to_owned(),
            imgrect: [0, 2, 0, 2],
            uvrect: [0, 2, 0, 2],
        };
        // Only one pixel present out of four.
        let png = decode_texture("t", &[0x00, 0x00, 0xFF, 0xFF], &info).unwrap();
        let img = image::load_from_memory_with_format(&png, ImageFormat::Png)
            .unwrap()
            .to_rgba8();
        assert_eq!(img.get_pixel(0, 0).0, [0xFF, 0x00, 0x00, 0xFF]);
        assert_eq!(img.get_pixel(1, 1).0, [0x00, 0x00, 0x00, 0x00]);
    }

    #[test]
    fn test_unknown_format_passes_raw_bytes() {
        let info = TextureInfo {
            format: "dxt5".to_owned(),
            imgrect: [0, 2, 0, 2],
            uvrect: [0, 2, 0, 2],
        };
        let payload = [0xCA, 0xFE, 0xBA, 0xBE];
        assert_eq!(decode_texture("t", &payload, &info).unwrap(), payload);
    }
}
