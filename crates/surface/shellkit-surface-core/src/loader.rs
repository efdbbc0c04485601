//! Shell directory loading: bare `surfaceNNN.png` images first, then every
//! `surfaces*.txt` descriptor in file-name order.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::descriptor::Surfaces;
use crate::error::LoadError;
use crate::model::SurfaceId;

/// File naming conventions used when scanning a shell directory.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LoaderConfig {
    /// Extensions (without dot, case-insensitive) recognized as surface images.
    pub image_extensions: Vec<String>,
    /// File name prefix of descriptor files.
    pub descriptor_prefix: String,
    /// File name extension (without dot) of descriptor files.
    pub descriptor_extension: String,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            image_extensions: vec!["png".to_string()],
            descriptor_prefix: "surfaces".to_string(),
            descriptor_extension: "txt".to_string(),
        }
    }
}

impl LoaderConfig {
    /// Surface id encoded in an image file name such as `surface0012.png`.
    pub fn image_surface_id(&self, file_name: &str) -> Option<SurfaceId> {
        let (stem, ext) = file_name.rsplit_once('.')?;
        if !self
            .image_extensions
            .iter()
            .any(|e| e.eq_ignore_ascii_case(ext))
        {
            return None;
        }
        let digits = stem.strip_prefix("surface")?;
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        digits.parse().ok()
    }

    pub fn is_descriptor(&self, file_name: &str) -> bool {
        match file_name.rsplit_once('.') {
            Some((stem, ext)) => {
                stem.starts_with(&self.descriptor_prefix)
                    && ext.eq_ignore_ascii_case(&self.descriptor_extension)
            }
            None => false,
        }
    }
}

/// Load every surface of the shell in `dir`.
///
/// Descriptor files are read as UTF-8 (invalid sequences replaced) and parsed
/// after all bare images have been registered, so descriptors can overlay them.
pub fn load_shell_dir(dir: &Path, cfg: &LoaderConfig) -> Result<Surfaces, LoadError> {
    if !dir.is_dir() {
        return Err(LoadError::NotADirectory(dir.to_path_buf()));
    }
    let mut surfaces = Surfaces::new();
    let mut descriptors: Vec<PathBuf> = Vec::new();
    for entry in fs::read_dir(dir).map_err(io_error(dir))? {
        let entry = entry.map_err(io_error(dir))?;
        let path = entry.path();
        if !entry.file_type().map_err(io_error(&path))?.is_file() {
            continue;
        }
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if let Some(id) = cfg.image_surface_id(name) {
            log::trace!("shell: image surface {id} from {}", path.display());
            surfaces.add_image_surface(id, path.clone());
        } else if cfg.is_descriptor(name) {
            descriptors.push(path.clone());
        }
    }

    descriptors.sort();
    for path in descriptors {
        let bytes = fs::read(&path).map_err(io_error(&path))?;
        let text = String::from_utf8_lossy(&bytes);
        log::debug!("shell: parsing {}", path.display());
        surfaces.parse_str(&text, Some(dir));
    }
    Ok(surfaces)
}

fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> LoadError {
    let path = path.to_path_buf();
    move |source| LoadError::Io { path, source }
}
