//! pdfium library binding.
//!
//! Resolution order:
//! 1. `PDFIUM_LIB_PATH`: a library file or the directory holding it
//! 2. `./lib` next to the working directory
//! 3. the system library search path

use crate::error::PaperError;
use pdfium_render::prelude::*;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Bind a fresh [`Pdfium`] instance.
///
/// Each blocking task binds its own instance; pdfium documents borrow the
/// instance so sharing one across `spawn_blocking` calls buys nothing.
pub fn bind() -> Result<Pdfium, PaperError> {
    let mut errors = Vec::new();

    for candidate in candidate_paths() {
        match Pdfium::bind_to_library(&candidate) {
            Ok(bindings) => {
                debug!("Bound pdfium from {}", candidate.display());
                return Ok(Pdfium::new(bindings));
            }
            Err(e) => errors.push(format!("{}: {e:?}", candidate.display())),
        }
    }

    Pdfium::bind_to_system_library()
        .map(Pdfium::new)
        .map_err(|e| {
            errors.push(format!("system library: {e:?}"));
            PaperError::PdfiumBindingFailed(errors.join("; "))
        })
}

fn candidate_paths() -> Vec<PathBuf> {
    let mut paths = Vec::new();
    if let Ok(p) = std::env::var("PDFIUM_LIB_PATH") {
        if !p.is_empty() {
            paths.push(library_path(Path::new(&p)));
        }
    }
    paths.push(Pdfium::pdfium_platform_library_name_at_path("./lib"));
    paths
}

/// A directory resolves to the platform library name inside it.
fn library_path(p: &Path) -> PathBuf {
    if p.is_dir() {
        Pdfium::pdfium_platform_library_name_at_path(p)
    } else {
        p.to_path_buf()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn directory_resolves_to_platform_name() {
        let dir = tempfile::tempdir().unwrap();
        let resolved = library_path(dir.path());
        assert_eq!(resolved.parent(), Some(dir.path()));
        assert!(resolved
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.contains("pdfium")));
    }

    #[test]
    fn file_path_is_kept() {
        let p = Path::new("/opt/pdfium/libpdfium.so");
        assert_eq!(library_path(p), PathBuf::from("/opt/pdfium/libpdfium.so"));
    }
}
