use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};

/// Serves files below a base directory by request path.
///
/// Top-level directories registered with [`StaticFiles::hide`] are never served.
#[derive(Debug, Clone)]
pub struct StaticFiles {
    base_dir: PathBuf,
    hidden: Vec<String>,
}

impl StaticFiles {
    pub fn new<P: Into<PathBuf>>(base: P) -> Self {
        Self {
            base_dir: base.into(),
            hidden: Vec::new(),
        }
    }

    /// Refuse to serve anything under the top-level directory `dir`.
    pub fn hide(mut self, dir: impl Into<String>) -> Self {
        self.hidden.push(dir.into());
        self
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Map a request path to a file under the base directory.
    ///
    /// The query string is ignored. Any `..`, root or prefix component rejects the
    /// whole path, as does a first component naming a hidden directory.
    fn map_path(&self, url_path: &str) -> Option<PathBuf> {
        let path = url_path.split(['?', '#']).next().unwrap_or("");
        let mut pb = self.base_dir.clone();
        let mut first = true;
        for comp in Path::new(path.trim_start_matches('/')).components() {
            match comp {
                Component::Normal(s) => {
                    if first && self.hidden.iter().any(|h| s == h.as_str()) {
                        return None;
                    }
                    first = false;
                    pb.push(s);
                }
                Component::CurDir => {}
                _ => return None,
            }
        }
        Some(pb)
    }

    pub fn content_type(path: &Path) -> &'static str {
        match path
            .extension()
            .and_then(|s| s.to_str())
            .unwrap_or("")
            .to_lowercase()
            .as_str()
        {
            "ico" => "image/x-icon",
            "htm" | "html" => "text/html; charset=UTF-8",
            "css" => "text/css; charset=UTF-8",
            "js" => "text/javascript; charset=UTF-8",
            "json" => "application/json",
            "txt" => "text/plain; charset=UTF-8",
            "png" => "image/png",
            "svg" => "image/svg+xml",
            _ => "application/octet-stream",
        }
    }

    /// Read the file for `url_path`, returning its bytes and content type.
    ///
    /// # Errors
    ///
    /// `NotFound` for paths that escape the base directory, do not exist, or name a
    /// directory; other I/O errors as reported by the filesystem.
    pub fn load(&self, url_path: &str) -> io::Result<(Vec<u8>, &'static str)> {
        let path = self
            .map_path(url_path)
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "invalid path"))?;
        if !path.is_file() {
            return Err(io::Error::new(io::ErrorKind::NotFound, "file not found"));
        }
        let bytes = fs::read(&path)?;
        Ok((bytes, Self::content_type(&path)))
    }
}
