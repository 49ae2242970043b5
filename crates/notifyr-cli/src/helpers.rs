//! Shared CLI helpers: content types, status marks, secret masking.

use std::path::Path;

use colored::Colorize;

/// Simple content-type guesser based on the file extension.
pub fn guess_content_type(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_lowercase)
        .unwrap_or_default();

    match ext.as_str() {
        "txt" | "log" => "text/plain",
        "html" | "htm" => "text/html",
        "csv" => "text/csv",
        "json" => "application/json",
        "xml" => "application/xml",
        "pdf" => "application/pdf",
        "zip" => "application/zip",
        "gz" => "application/gzip",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "svg" => "image/svg+xml",
        _ => "application/octet-stream",
    }
}

/// `✓` / `· not configured` column used by `status`.
pub fn status_mark(configured: bool) -> String {
    if configured {
        "✓".green().to_string()
    } else {
        "· not configured".dimmed().to_string()
    }
}

/// Show only the first few characters of a secret.
pub fn mask_secret(secret: &str) -> String {
    if secret.is_empty() {
        return String::new();
    }
    let visible: String = secret.chars().take(4).collect();
    format!("{visible}***")
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
