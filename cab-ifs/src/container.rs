//! Parsed container with its derived path index.

use cab_protocol::{BINARY_MAGIC, Charset, Node, binary, text};
use hashbrown::HashMap;
use tracing::debug;

use crate::header::IfsHeader;
use crate::manifest::{self, FileEntry};
use crate::texture::{self, TextureInfo};
use crate::{IfsError, afp};

/// A decoded `.ifs` container.
///
/// Parsing builds the full path index up front, including the texture and
/// AFP renaming passes, so the result is immutable and cheap to share.
/// Payload bytes are sliced (and decompressed) on demand.
pub struct IfsContainer {
    data: Vec<u8>,
    manifest_end: usize,
    version: u16,
    pack_time: u32,
    charset: Charset,
    files: HashMap<String, FileEntry>,
    textures: HashMap<String, TextureInfo>,
}

impl IfsContainer {
    /// Parses a container from its raw bytes.
    ///
    /// # Errors
    ///
    /// [`IfsError::MalformedContainer`] for header damage,
    /// [`IfsError::UnknownManifestRoot`] when the manifest root element is
    /// not `<imgfs>`, and [`IfsError::Document`] when the manifest itself
    /// fails to parse. A hashed file referenced by a side manifest but
    /// missing from the listing is not an error; the logical name simply
    /// does not appear.
    pub fn parse(data: Vec<u8>) -> Result<IfsContainer, IfsError> {
        let header = IfsHeader::parse(&data)?;
        debug!(
            version = header.version,
            manifest_size = header.manifest_size,
            digest = ?header.digest.as_ref().map(hex::encode),
            "container header"
        );
        let (root, charset) = decode_document(&data[header.header_len..header.manifest_end])?;
        if root.name() != "imgfs" {
            return Err(IfsError::UnknownManifestRoot {
                name: root.name().to_owned(),
            });
        }

        let mut container = IfsContainer {
            manifest_end: header.manifest_end,
            version: header.version,
            pack_time: header.pack_time,
            charset,
            files: manifest::collect_files(&root),
            textures: HashMap::new(),
            data,
        };
        container.apply_texture_pass()?;
        container.apply_afp_pass()?;
        Ok(container)
    }

    /// Every file path in the container, sorted, after renaming passes.
    pub fn paths(&self) -> Vec<&str> {
        let mut paths: Vec<&str> = self.files.keys().map(String::as_str).collect();
        paths.sort_unstable();
        paths
    }

    /// Container format version from the header.
    pub fn version(&self) -> u16 {
        self.version
    }

    /// Pack timestamp from the header, unix seconds.
    pub fn pack_time(&self) -> u32 {
        self.pack_time
    }

    /// Charset the manifest declared; hashed names were derived in it.
    pub fn charset(&self) -> Charset {
        self.charset
    }

    /// Crop geometry for a renamed texture path, if the path is one.
    pub fn texture_info(&self, path: &str) -> Option<&TextureInfo> {
        self.textures.get(path.trim_start_matches('/'))
    }

    /// Reads a file's payload, inflating `avslz`-compressed entries.
    ///
    /// # Errors
    ///
    /// [`IfsError::NoSuchFile`] for an unknown path,
    /// [`IfsError::PayloadOutOfBounds`] when the manifest entry points past
    /// the container end, and [`IfsError::Stream`] when inflation fails.
    pub fn read_file(&self, path: &str) -> Result<Vec<u8>, IfsError> {
        let path = path.trim_start_matches('/');
        let entry = self.files.get(path).ok_or_else(|| IfsError::NoSuchFile {
            path: path.to_owned(),
        })?;
        read_entry(&self.data, self.manifest_end, path, entry)
    }

    /// Reads a texture payload and decodes it to PNG bytes, cropped to its
    /// visible rectangle. A pixel format the decoder does not know yields
    /// the raw payload unchanged.
    ///
    /// # Errors
    ///
    /// Everything [`read_file`](Self::read_file) returns, plus
    /// [`IfsError::Texture`] when the path has no recorded geometry or the
    /// geometry is unusable.
    pub fn read_texture(&self, path: &str) -> Result<Vec<u8>, IfsError> {
        let path = path.trim_start_matches('/');
        let info = self.textures.get(path).ok_or_else(|| IfsError::Texture {
            path: path.to_owned(),
            reason: "no texture geometry recorded for this path".to_owned(),
        })?;
        let payload = self.read_file(path)?;
        texture::decode_texture(path, &payload, info)
    }

    fn apply_texture_pass(&mut self) -> Result<(), IfsError> {
        for list_path in self.side_manifests("texturelist.xml") {
            let dir = parent_dir(&list_path);
            let doc = self.parse_side_manifest(&list_path)?;
            for rename in texture::texture_renames(&doc, dir, self.charset) {
                match self.files.remove(&rename.hashed) {
                    Some(entry) => {
                        self.files.insert(rename.logical.clone(), entry);
                        self.textures.insert(rename.logical, rename.info);
                    }
                    // Dangling reference, tolerated.
                    None => debug!(hashed = %rename.hashed, "texture payload missing"),
                }
            }
        }
        Ok(())
    }

    fn apply_afp_pass(&mut self) -> Result<(), IfsError> {
        for list_path in self.side_manifests("afplist.xml") {
            let dir = parent_dir(&list_path);
            let doc = self.parse_side_manifest(&list_path)?;
            for rename in afp::afp_renames(&doc, dir, self.charset) {
                match self.files.remove(&rename.hashed) {
                    Some(entry) => {
                        self.files.insert(rename.logical, entry);
                    }
                    None => debug!(hashed = %rename.hashed, "afp payload missing"),
                }
            }
        }
        Ok(())
    }

    /// Paths of every side manifest with the given file name.
    fn side_manifests(&self, file_name: &str) -> Vec<String> {
        let suffix = format!("/{file_name}");
        self.files
            .keys()
            .filter(|p| p.as_str() == file_name || p.ends_with(&suffix))
            .cloned()
            .collect()
    }

    fn parse_side_manifest(&self, path: &str) -> Result<Node, IfsError> {
        let entry = self.files[path];
        let bytes = read_entry(&self.data, self.manifest_end, path, &entry)?;
        let (doc, _) = decode_document(&bytes)?;
        Ok(doc)
    }
}

/// Binary codec when the signature byte matches, textual otherwise.
fn decode_document(data: &[u8]) -> Result<(Node, Charset), IfsError> {
    let parsed = match data.first() {
        Some(&BINARY_MAGIC) => binary::decode(data)?,
        _ => text::decode(data)?,
    };
    Ok(parsed)
}

fn read_entry(
    data: &[u8],
    manifest_end: usize,
    path: &str,
    entry: &FileEntry,
) -> Result<Vec<u8>, IfsError> {
    let start = manifest_end.checked_add(entry.offset);
    let end = start.and_then(|s| s.checked_add(entry.length));
    let range = match (start, end) {
        (Some(start), Some(end)) if end <= data.len() => start..end,
        _ => {
            return Err(IfsError::PayloadOutOfBounds {
                path: path.to_owned(),
            });
        }
    };
    let raw = &data[range];
    if entry.compressed {
        Ok(cab_lz77::decompress_framed(raw)?)
    } else {
        Ok(raw.to_vec())
    }
}

fn parent_dir(path: &str) -> &str {
    match path.rsplit_once('/') {
        Some((dir, _)) => dir,
        None => "",
    }
}

// ============================================================================
// Tests
// ============================================================================
