//! Content-type inference from filename extensions.

/// Opaque binary type used when nothing better is known, and always for
/// download responses (attachments are never sniffed by the browser).
pub const OCTET_STREAM: &str = "application/octet-stream";

/// Infer a MIME type from the stored filename's extension.
pub fn infer(filename: &str) -> &'static str {
    let ext = filename
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();

    match ext.as_str() {
        "txt" | "md" | "log" => "text/plain",
        "html" | "htm" => "text/html",
        "css" => "text/css",
        "csv" => "text/csv",
        "js" => "text/javascript",
        "json" => "application/json",
        "xml" => "application/xml",
        "pdf" => "application/pdf",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "svg" => "image/svg+xml",
        "mp3" => "audio/mpeg",
        "wav" => "audio/wav",
        "flac" => "audio/flac",
        "mp4" => "video/mp4",
        "mov" => "video/quicktime",
        "mkv" => "video/x-matroska",
        "zip" => "application/zip",
        "gz" => "application/gzip",
        "tar" => "application/x-tar",
        "doc" | "docx" => "application/msword",
        _ => OCTET_STREAM,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_extensions() {
        assert_eq!(infer("notes.txt"), "text/plain");
        assert_eq!(infer("photo.JPG"), "image/jpeg");
        assert_eq!(infer("archive.tar"), "application/x-tar");
    }

    #[test]
    fn test_unknown_defaults_to_octet_stream() {
        assert_eq!(infer("big.bin"), OCTET_STREAM);
        assert_eq!(infer("no-extension"), OCTET_STREAM);
        assert_eq!(infer(""), OCTET_STREAM);
    }
}
