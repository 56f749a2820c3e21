//! Local persistence of downloaded video bytes.

use std::io;
use std::path::{Component, Path, PathBuf};

/// Extension of the default file name for saved videos.
pub const DEFAULT_EXTENSION: &str = "mp4";

/// Resolve the directory a video is saved into.
///
/// An explicit, non-blank `output_path` wins over the configured default.
/// The result is absolute, relative paths being taken against the current
/// working directory.
pub fn resolve_output_dir(output_path: Option<&str>, default_dir: &Path) -> io::Result<PathBuf> {
    let dir = match output_path.map(str::trim).filter(|p| !p.is_empty()) {
        Some(path) => PathBuf::from(path),
        None => default_dir.to_path_buf(),
    };
    std::path::absolute(dir)
}

/// Resolve the file name a video is saved as.
///
/// Defaults to `{video_id}.mp4`. The name must be a single plain path
/// component so the write stays inside the resolved directory.
pub fn resolve_filename(filename: Option<&str>, video_id: &str) -> io::Result<String> {
    let name = match filename.map(str::trim).filter(|f| !f.is_empty()) {
        Some(name) => name.to_string(),
        None => format!("{}.{}", video_id, DEFAULT_EXTENSION),
    };

    let mut components = Path::new(&name).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(_)), None) => Ok(name),
        _ => Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("Invalid file name '{}': expected a plain file name", name),
        )),
    }
}

/// Write `bytes` to `dir/filename`, creating `dir` and its parents first.
///
/// An existing file is overwritten. Returns the absolute path written.
pub async fn write_file(dir: &Path, filename: &str, bytes: &[u8]) -> io::Result<PathBuf> {
    let dir = std::path::absolute(dir)?;
    tokio::fs::create_dir_all(&dir).await?;

    let path = dir.join(filename);
    tokio::fs::write(&path, bytes).await?;
    tracing::debug!(path = %path.display(), size_bytes = bytes.len(), "Wrote file");
    Ok(path)
}

/// Guess a MIME type for a reference file from its extension.
pub fn mime_type_for_path(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());

    match ext.as_deref() {
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("webp") => "image/webp",
        Some("mp4") => "video/mp4",
        _ => "application/octet-stream",
    }
}
