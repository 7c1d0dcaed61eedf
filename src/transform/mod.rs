//! Content transforms
//!
//! Files are classified by extension. Images can be alpha-bled before
//! upload, WAV audio is transcoded to OGG, text files bypass the content
//! store entirely and are embedded into the generated asset map.

pub mod audio;
pub mod bleed;

use crate::fingerprint::Qualifier;
use std::path::Path;

/// Extensions embedded as text instead of uploaded
const TEXT_EXTENSIONS: &[&str] = &[
    "md", "txt", "json", "xml", "yaml", "yml", "csv", "log", "ini", "cfg", "conf",
];

/// Content category derived from a file's extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetKind {
    /// png/jpg/jpeg: bleed applies when enabled
    Image,
    /// wav: always transcoded to ogg
    WavAudio,
    /// Embedded verbatim into the asset map, never uploaded
    Text,
    /// Uploaded as-is (mp3, ogg, fbx, ...)
    Other,
}

impl AssetKind {
    pub fn classify(path: &Path) -> Self {
        let ext = path
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .unwrap_or_default();

        match ext.as_str() {
            "png" | "jpg" | "jpeg" => Self::Image,
            "wav" => Self::WavAudio,
            e if TEXT_EXTENSIONS.contains(&e) => Self::Text,
            _ => Self::Other,
        }
    }
}

/// Qualifier tags that will apply to this file, in fingerprint order
pub fn qualifiers(kind: AssetKind, bleed_enabled: bool) -> Vec<Qualifier> {
    let mut tags = Vec::new();
    if kind == AssetKind::Image && bleed_enabled {
        tags.push(Qualifier::Bleed);
    }
    if kind == AssetKind::WavAudio {
        tags.push(Qualifier::WavToOgg);
    }
    tags
}

/// Name to upload under; transcoded WAV gets its extension rewritten
pub fn upload_name(file_name: &str, kind: AssetKind) -> String {
    if kind == AssetKind::WavAudio {
        match file_name.rsplit_once('.') {
            Some((stem, _)) => format!("{stem}.ogg"),
            None => format!("{file_name}.ogg"),
        }
    } else {
        file_name.to_string()
    }
}
