//! Generated asset map module
//!
//! Renders the path map as a TypeScript module with a typed `assets` object,
//! a `getAsset` accessor, and a `texts` object for embedded text files. The
//! renderer emits exactly one entry per line so [`parse`] can read prior
//! state back without a real TypeScript parser.

use crate::store::AssetId;
use std::collections::BTreeMap;

const HEADER: &str = "// Auto-generated by rbxsync. Do not edit manually.";
const ASSETS_OPEN: &str = "export const assets = {";
const TEXTS_OPEN: &str = "export const texts = {";
const SECTION_CLOSE: &str = "} as const;";
const ID_PREFIX: &str = "rbxassetid://";

/// Render the full module
pub fn render(assets: &BTreeMap<String, AssetId>, texts: &BTreeMap<String, String>) -> String {
    let mut lines: Vec<String> = vec![HEADER.to_string(), ASSETS_OPEN.to_string()];

    for (path, id) in assets {
        lines.push(format!(
            "  {}: {},",
            json_string(path),
            json_string(&format!("{ID_PREFIX}{id}"))
        ));
    }
    lines.push(SECTION_CLOSE.to_string());
    lines.push(String::new());
    lines.push("export function getAsset(path: keyof typeof assets): string {".to_string());
    lines.push("  return assets[path];".to_string());
    lines.push("}".to_string());
    lines.push(String::new());

    lines.push(TEXTS_OPEN.to_string());
    for (path, content) in texts {
        lines.push(format!("  {}: {},", json_string(path), json_string(content)));
    }
    lines.push(SECTION_CLOSE.to_string());
    lines.push(String::new());
    lines.push("export function getText(path: keyof typeof texts): string {".to_string());
    lines.push("  return texts[path];".to_string());
    lines.push("}".to_string());
    lines.push(String::new());

    lines.join("\n")
}

/// Parse a previously rendered module back into its two maps.
///
/// Only accepts the exact shape [`render`] emits; anything else is treated as
/// corrupt state so the caller can refuse to overwrite it.
#[allow(clippy::type_complexity)]
pub fn parse(raw: &str) -> Result<(BTreeMap<String, AssetId>, BTreeMap<String, String>), String> {
    let mut assets = BTreeMap::new();
    let mut texts = BTreeMap::new();

    if raw.trim().is_empty() {
        return Ok((assets, texts));
    }
    if !raw.contains(ASSETS_OPEN) {
        return Err("unrecognized asset map format".to_string());
    }

    #[derive(PartialEq)]
    enum Section {
        None,
        Assets,
        Texts,
    }
    let mut section = Section::None;

    for line in raw.lines() {
        let trimmed = line.trim();
        match trimmed {
            t if t == ASSETS_OPEN => section = Section::Assets,
            t if t == TEXTS_OPEN => section = Section::Texts,
            t if t == SECTION_CLOSE => section = Section::None,
            t if section != Section::None && t.starts_with('"') => {
                let entry = t.strip_suffix(',').unwrap_or(t);
                let (key, value) = parse_entry(entry)?;
                match section {
                    Section::Assets => {
                        let id = value
                            .strip_prefix(ID_PREFIX)
                            .ok_or_else(|| format!("asset entry without {ID_PREFIX} prefix: {value}"))?;
                        assets.insert(key, AssetId::from_raw(id));
                    }
                    Section::Texts => {
                        texts.insert(key, value);
                    }
                    Section::None => unreachable!(),
                }
            }
            _ => {}
        }
    }

    Ok((assets, texts))
}

/// Parse one `"key": "value"` entry line via serde_json
fn parse_entry(entry: &str) -> Result<(String, String), String> {
    let object = format!("{{{entry}}}");
    let mut map: BTreeMap<String, String> =
        serde_json::from_str(&object).map_err(|e| format!("invalid entry `{entry}`: {e}"))?;
    map.pop_first().ok_or_else(|| format!("empty entry `{entry}`"))
}

fn json_string(s: &str) -> String {
    serde_json::to_string(s).expect("string serialization cannot fail")
}
