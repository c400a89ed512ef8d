//! Embedded metadata codec
//!
//! Reads and writes tag and favorite state inside the image file itself
//! so the information travels with the file when it leaves the
//! application. Only PNG files are supported (the one raster format in
//! scope with a rewritable metadata container); every other path is
//! skipped silently, which callers must treat as "no information", not
//! as an error.
//!
//! Tags live in an iTXt chunk with the `Keywords` keyword as a single
//! `", "`-joined string. Favorite state is a sentinel marker
//! (`PICTAG_FAVORITE:1` / `PICTAG_FAVORITE:0`) prefixed onto the
//! `Description` text chunk; pre-existing description text is preserved
//! and old markers are stripped rather than duplicated.
//!
//! Chunks are edited in place with img-parts, so pixel data is never
//! re-encoded. Rewriting does change the file's size and mtime.

use img_parts::Bytes;
use img_parts::png::{Png, PngChunk};
use std::fs;
use std::path::Path;

pub mod error;

pub use error::MetadataError;

/// Text-chunk keyword holding the tag list
pub const KEYWORDS_FIELD: &str = "Keywords";
/// Text-chunk keyword holding free text plus the favorite marker
pub const DESCRIPTION_FIELD: &str = "Description";
/// Sentinel marking a favorite file
pub const FAVORITE_ON: &str = "PICTAG_FAVORITE:1";
/// Sentinel marking an explicitly non-favorite file
pub const FAVORITE_OFF: &str = "PICTAG_FAVORITE:0";

const ITXT: [u8; 4] = *b"iTXt";
const TEXT: [u8; 4] = *b"tEXt";
const IEND: [u8; 4] = *b"IEND";

/// Whether a path is in the supported format subset
#[must_use]
pub fn is_supported(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("png"))
}

/// Write the tag set into the file's `Keywords` field
///
/// A no-op for unsupported formats. An empty tag set removes the field.
///
/// # Errors
///
/// Returns `MetadataError` if the file cannot be read, parsed as PNG, or
/// rewritten.
pub fn write_tags(path: &Path, tags: &[String]) -> Result<(), MetadataError> {
    if !is_supported(path) {
        return Ok(());
    }

    let mut png = load(path)?;
    if tags.is_empty() {
        set_field(&mut png, KEYWORDS_FIELD, None);
    } else {
        set_field(&mut png, KEYWORDS_FIELD, Some(&tags.join(", ")));
    }
    save(path, png)
}

/// Read the tag set from the file's `Keywords` field
///
/// Returns an empty vector for unsupported formats or when the field is
/// absent.
///
/// # Errors
///
/// Returns `MetadataError` if the file cannot be read or parsed as PNG.
pub fn read_tags(path: &Path) -> Result<Vec<String>, MetadataError> {
    if !is_supported(path) {
        return Ok(Vec::new());
    }

    let png = load(path)?;
    let tags = read_field(&png, KEYWORDS_FIELD)
        .map(|text| {
            text.split(',')
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(String::from)
                .collect()
        })
        .unwrap_or_default();
    Ok(tags)
}

/// Write the favorite marker into the file's `Description` field
///
/// Any existing description text is kept; old markers are stripped so
/// the field carries exactly one marker. A no-op for unsupported
/// formats.
///
/// # Errors
///
/// Returns `MetadataError` if the file cannot be read, parsed as PNG, or
/// rewritten.
pub fn write_favorite(path: &Path, is_favorite: bool) -> Result<(), MetadataError> {
    if !is_supported(path) {
        return Ok(());
    }

    let mut png = load(path)?;
    let existing = read_field(&png, DESCRIPTION_FIELD).unwrap_or_default();
    let rest = strip_markers(&existing);

    let marker = if is_favorite { FAVORITE_ON } else { FAVORITE_OFF };
    let new_desc = if rest.is_empty() {
        marker.to_string()
    } else {
        format!("{marker} {rest}")
    };

    set_field(&mut png, DESCRIPTION_FIELD, Some(&new_desc));
    save(path, png)
}

/// Read the favorite marker from the file's `Description` field
///
/// Returns `None` when no marker is present (or the format is
/// unsupported), `Some(bool)` when one is.
///
/// # Errors
///
/// Returns `MetadataError` if the file cannot be read or parsed as PNG.
pub fn read_favorite(path: &Path) -> Result<Option<bool>, MetadataError> {
    if !is_supported(path) {
        return Ok(None);
    }

    let png = load(path)?;
    let state = read_field(&png, DESCRIPTION_FIELD).and_then(|desc| {
        if desc.contains(FAVORITE_ON) {
            Some(true)
        } else if desc.contains(FAVORITE_OFF) {
            Some(false)
        } else {
            None
        }
    });
    Ok(state)
}

fn load(path: &Path) -> Result<Png, MetadataError> {
    let data = fs::read(path)?;
    Ok(Png::from_bytes(data.into())?)
}

fn save(path: &Path, png: Png) -> Result<(), MetadataError> {
    let out = png.encoder().bytes();
    fs::write(path, &out)?;
    Ok(())
}

/// Remove every favorite marker from a description string
fn strip_markers(desc: &str) -> String {
    desc.replace(FAVORITE_ON, "")
        .replace(FAVORITE_OFF, "")
        .trim()
        .to_string()
}

/// Read the text of the iTXt/tEXt chunk with the given keyword
fn read_field(png: &Png, keyword: &str) -> Option<String> {
    png.chunks()
        .iter()
        .find_map(|chunk| match chunk.kind() {
            k if k == ITXT => decode_itxt(chunk.contents())
                .filter(|(kw, _)| kw == keyword)
                .map(|(_, text)| text),
            k if k == TEXT => decode_text(chunk.contents())
                .filter(|(kw, _)| kw == keyword)
                .map(|(_, text)| text),
            _ => None,
        })
        .filter(|text| !text.is_empty())
}

/// Replace (or with `None`, remove) the text chunk for a keyword
///
/// New chunks are written as iTXt so the text can be arbitrary UTF-8;
/// any old tEXt chunk under the same keyword is dropped.
fn set_field(png: &mut Png, keyword: &str, text: Option<&str>) {
    let chunks = png.chunks_mut();
    chunks.retain(|chunk| match chunk.kind() {
        k if k == ITXT => decode_itxt(chunk.contents()).is_none_or(|(kw, _)| kw != keyword),
        k if k == TEXT => decode_text(chunk.contents()).is_none_or(|(kw, _)| kw != keyword),
        _ => true,
    });

    if let Some(text) = text {
        let payload = encode_itxt(keyword, text);
        let position = chunks
            .iter()
            .position(|chunk| chunk.kind() == IEND)
            .unwrap_or(chunks.len());
        chunks.insert(position, PngChunk::new(ITXT, Bytes::from(payload)));
    }
}

/// Build an uncompressed iTXt payload with empty language/translation
fn encode_itxt(keyword: &str, text: &str) -> Vec<u8> {
    let mut payload = Vec::with_capacity(keyword.len() + text.len() + 5);
    payload.extend_from_slice(keyword.as_bytes());
    payload.push(0); // keyword terminator
    payload.push(0); // compression flag: uncompressed
    payload.push(0); // compression method
    payload.push(0); // language tag terminator
    payload.push(0); // translated keyword terminator
    payload.extend_from_slice(text.as_bytes());
    payload
}

/// Parse an iTXt payload into (keyword, text)
///
/// Compressed or malformed payloads yield `None` and are treated as "no
/// information".
fn decode_itxt(data: &[u8]) -> Option<(String, String)> {
    let keyword_end = data.iter().position(|&b| b == 0)?;
    let keyword = String::from_utf8(data[..keyword_end].to_vec()).ok()?;

    let rest = &data[keyword_end + 1..];
    let (&compression_flag, rest) = rest.split_first()?;
    let (_, rest) = rest.split_first()?; // compression method
    if compression_flag != 0 {
        return None;
    }

    let lang_end = rest.iter().position(|&b| b == 0)?;
    let rest = &rest[lang_end + 1..];
    let translated_end = rest.iter().position(|&b| b == 0)?;
    let text = String::from_utf8(rest[translated_end + 1..].to_vec()).ok()?;

    Some((keyword, text))
}

/// Parse a tEXt payload into (keyword, text)
fn decode_text(data: &[u8]) -> Option<(String, String)> {
    let keyword_end = data.iter().position(|&b| b == 0)?;
    let keyword = String::from_utf8(data[..keyword_end].to_vec()).ok()?;
    // tEXt is Latin-1; lossy conversion is fine for a best-effort tier
    let text = String::from_utf8_lossy(&data[keyword_end + 1..]).into_owned();
    Some((keyword, text))
}
