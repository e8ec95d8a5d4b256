//! File content type detection

use std::path::Path;

pub const DIRECTORY_MIME: &str = "inode/directory";
pub const UNKNOWN_MIME: &str = "application/octet-stream";

/// Determines the content type of a local file
pub trait MimeDetector: Send + Sync {
    /// `None` only when the path can not be examined at all
    fn mime_for_path(&self, path: &Path) -> Option<String>;
}

/// Detection by file name extension
#[derive(Debug, Clone, Copy, Default)]
pub struct ExtensionDetector;

impl ExtensionDetector {
    /// Content type for a lowercase extension
    pub fn mime_for_extension(extension: &str) -> Option<&'static str> {
        let mime = match extension {
            "txt" | "text" => "text/plain",
            "html" | "htm" => "text/html",
            "css" => "text/css",
            "csv" => "text/csv",
            "md" => "text/markdown",
            "vcf" | "vcard" => "text/vcard",
            "ics" | "vcs" => "text/calendar",
            "js" => "application/javascript",
            "json" => "application/json",
            "xml" => "application/xml",
            "pdf" => "application/pdf",
            "zip" => "application/zip",
            "gz" => "application/gzip",
            "tar" => "application/x-tar",
            "desktop" => "application/x-desktop",
            "odt" => "application/vnd.oasis.opendocument.text",
            "doc" => "application/msword",
            "docx" => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
            "png" => "image/png",
            "jpg" | "jpeg" => "image/jpeg",
            "gif" => "image/gif",
            "webp" => "image/webp",
            "bmp" => "image/bmp",
            "svg" => "image/svg+xml",
            "mp3" => "audio/mpeg",
            "ogg" | "oga" => "audio/ogg",
            "flac" => "audio/flac",
            "wav" => "audio/x-wav",
            "m4a" => "audio/mp4",
            "mp4" => "video/mp4",
            "m4v" => "video/x-m4v",
            "mkv" => "video/x-matroska",
            "webm" => "video/webm",
            "avi" => "video/x-msvideo",
            _ => return None,
        };
        Some(mime)
    }
}

impl MimeDetector for ExtensionDetector {
    fn mime_for_path(&self, path: &Path) -> Option<String> {
        if path.is_dir() {
            return Some(DIRECTORY_MIME.to_string());
        }

        let mime = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase)
            .and_then(|ext| Self::mime_for_extension(&ext))
            .unwrap_or(UNKNOWN_MIME);
        Some(mime.to_string())
    }
}
