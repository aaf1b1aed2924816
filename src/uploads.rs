use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use regex::Regex;
use sha2::{Digest, Sha256};

use crate::error::Result;

const FALLBACK_STEM: &str = "upload";
const HASH_LEN: usize = 12;

/// Client extensions accepted for upload. Appends rewrite the file as xlsx,
/// so only formats that are already xlsx inside can be bound.
pub const ACCEPTED_EXTENSIONS: [&str; 2] = ["xlsx", "xlsm"];

fn unsafe_chars() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[^A-Za-z0-9_-]+").expect("valid regex"))
}

fn compute_checksum(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

// Browsers on Windows may send a full path.
fn base_name(client_name: &str) -> &str {
    client_name.rsplit(['/', '\\']).next().unwrap_or_default()
}

pub fn is_accepted(client_name: &str) -> bool {
    base_name(client_name)
        .rsplit_once('.')
        .is_some_and(|(_, ext)| {
            ACCEPTED_EXTENSIONS
                .iter()
                .any(|accepted| ext.eq_ignore_ascii_case(accepted))
        })
}

/// Storage name for an upload: the client's stem reduced to `[A-Za-z0-9_-]`,
/// a short content hash, and always `.xlsx`, since calamine picks its reader
/// from the extension and every append writes xlsx bytes.
///
/// The hash keeps two different files called `fees.xlsx` apart while letting a
/// re-upload of identical bytes land on the same name.
pub fn storage_name(client_name: &str, data: &[u8]) -> String {
    let base = base_name(client_name);
    let stem = base.rsplit_once('.').map_or(base, |(stem, _)| stem);
    let cleaned = unsafe_chars().replace_all(stem, "_");
    let cleaned = cleaned.trim_matches('_');
    let stem = if cleaned.is_empty() { FALLBACK_STEM } else { cleaned };
    let hash = compute_checksum(data);
    format!("{stem}-{}.xlsx", &hash[..HASH_LEN])
}

/// Persist uploaded bytes under `upload_dir` and return the stored path.
pub fn save_upload(upload_dir: &Path, client_name: &str, data: &[u8]) -> Result<PathBuf> {
    std::fs::create_dir_all(upload_dir)?;
    let path = upload_dir.join(storage_name(client_name, data));
    std::fs::write(&path, data)?;
    tracing::info!(path = %path.display(), bytes = data.len(), "upload saved");
    Ok(path)
}
