use percent_encoding::percent_decode_str;
use sha2::{Digest, Sha256};
use url::Url;

const INVALID_CHARS: [char; 9] = ['<', '>', ':', '"', '/', '\\', '|', '?', '*'];
const FALLBACK_EXTENSION: &str = "pdf";

/// Derives a filesystem-safe filename from the last segment of the URL path.
///
/// URLs without a usable last segment get `file_<hash>.pdf`, where the hash is
/// taken from the full URL so the same URL always maps to the same file.
pub fn filename_from_url(url: &str) -> String {
    let segment = Url::parse(url)
        .ok()
        .map(|parsed| {
            let raw = parsed.path().rsplit('/').next().unwrap_or("");
            percent_decode_str(raw).decode_utf8_lossy().into_owned()
        })
        .filter(|segment| !segment.is_empty() && segment != "." && segment != "..");

    let filename = segment.unwrap_or_else(|| fallback_name(url));
    sanitize(&filename)
}

fn fallback_name(url: &str) -> String {
    let digest = format!("{:x}", Sha256::digest(url.as_bytes()));
    format!("file_{}.{}", &digest[..16], FALLBACK_EXTENSION)
}

fn sanitize(name: &str) -> String {
    name.chars()
        .map(|c| if INVALID_CHARS.contains(&c) { '_' } else { c })
        .collect()
}
