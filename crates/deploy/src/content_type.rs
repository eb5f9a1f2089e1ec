//! MIME type detection from file extensions.

use std::path::Path;

/// Fallback for extensions not in the table.
pub const OCTET_STREAM: &str = "application/octet-stream";

/// Detects the MIME content type for a site file from its extension.
///
/// Computed once at upload time and stored on the asset; the serving
/// path uses the stored value verbatim.
pub fn content_type_for(path: &str) -> &'static str {
    let ext = Path::new(path)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase());

    match ext.as_deref() {
        Some("html" | "htm") => "text/html; charset=utf-8",
        Some("css") => "text/css; charset=utf-8",
        Some("js" | "mjs") => "text/javascript; charset=utf-8",
        Some("json") => "application/json",
        Some("map") => "application/json",
        Some("webmanifest") => "application/manifest+json",
        Some("svg") => "image/svg+xml",
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("webp") => "image/webp",
        Some("avif") => "image/avif",
        Some("gif") => "image/gif",
        Some("ico") => "image/x-icon",
        Some("woff") => "font/woff",
        Some("woff2") => "font/woff2",
        Some("ttf") => "font/ttf",
        Some("otf") => "font/otf",
        Some("txt") => "text/plain; charset=utf-8",
        Some("xml") => "application/xml",
        Some("wasm") => "application/wasm",
        Some("pdf") => "application/pdf",
        Some("mp4") => "video/mp4",
        Some("webm") => "video/webm",
        _ => OCTET_STREAM,
    }
}

/// Returns `true` for HTML content types (used for CDN partitioning
/// and for the revalidate cache policy).
pub fn is_html(content_type: &str) -> bool {
    content_type.starts_with("text/html")
}
