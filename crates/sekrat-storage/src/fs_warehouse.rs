use std::{
    fs, io,
    io::Write,
    path::{Component, Path, PathBuf},
};

use base64::{engine::general_purpose::STANDARD, Engine as _};
use sekrat_core::{Warehouse, WarehouseError};
use tempfile::Builder;
use tracing::{debug, instrument, warn};

#[cfg(unix)]
const DIR_MODE: u32 = 0o755;
#[cfg(unix)]
const FILE_MODE: u32 = 0o644;

/// Name prefix of in-flight writes. Files carrying it are never listed, and ids
/// ending in such a name are refused.
const TEMP_PREFIX: &str = ".sekrat-tmp";

/// Filesystem-backed warehouse: one file per id under `base_dir`, holding the
/// blob as standard base64 text.
///
/// Ids are joined onto the base directory as relative paths, so `team/db` lands
/// in `<base_dir>/team/db`. The directory tree is the only index.
#[derive(Debug, Clone)]
pub struct FsWarehouse {
    base_dir: PathBuf,
}

impl FsWarehouse {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        let base_dir = base_dir.into();
        let base_dir = std::path::absolute(&base_dir).unwrap_or(base_dir);
        Self { base_dir }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Resolve `id` to a path inside the base directory.
    ///
    /// Every `/`-separated segment must be non-empty and neither `.` nor `..`,
    /// the id must be relative, and its file name must not look like a temp
    /// file. This keeps the id listed by `ids` identical to the one stored.
    fn path_for(&self, id: &str) -> Result<PathBuf, WarehouseError> {
        let invalid = || WarehouseError::InvalidId { id: id.to_string() };

        let segments_ok = id
            .split('/')
            .all(|segment| !segment.is_empty() && segment != "." && segment != "..");
        let relative = Path::new(id);
        let plain = relative
            .components()
            .all(|c| matches!(c, Component::Normal(_)));
        if !segments_ok || !plain {
            return Err(invalid());
        }
        match id.rsplit('/').next() {
            Some(name) if !name.starts_with(TEMP_PREFIX) => Ok(self.base_dir.join(relative)),
            _ => Err(invalid()),
        }
    }

    fn id_for(&self, path: &Path) -> Option<String> {
        let relative = path.strip_prefix(&self.base_dir).ok()?;
        let segments = relative
            .components()
            .map(|c| match c {
                Component::Normal(segment) => segment.to_str(),
                _ => None,
            })
            .collect::<Option<Vec<_>>>()?;
        Some(segments.join("/"))
    }

    fn walk(&self, dir: &Path, ids: &mut Vec<String>) {
        let entries = match fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return,
            Err(err) => {
                warn!(?dir, error = %err, "skipping unreadable directory");
                return;
            }
        };

        for entry in entries {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    warn!(?dir, error = %err, "skipping unreadable entry");
                    continue;
                }
            };
            let path = entry.path();
            match entry.file_type() {
                Ok(kind) if kind.is_dir() => self.walk(&path, ids),
                Ok(kind) if kind.is_file() && is_temp_file(&path) => {
                    debug!(?path, "skipping in-flight write")
                }
                Ok(kind) if kind.is_file() => match self.id_for(&path) {
                    Some(id) => ids.push(id),
                    None => debug!(?path, "skipping file without a utf-8 id"),
                },
                Ok(_) => debug!(?path, "skipping non-regular file"),
                Err(err) => warn!(?path, error = %err, "skipping entry of unknown type"),
            }
        }
    }
}

impl Warehouse for FsWarehouse {
    /// Every regular file under the base directory, as `/`-separated paths
    /// relative to it, sorted. A missing base directory yields no ids.
    fn ids(&self) -> Vec<String> {
        let mut ids = Vec::new();
        self.walk(&self.base_dir, &mut ids);
        ids.sort();
        ids
    }

    #[instrument(skip(self, blob), fields(len = blob.len()))]
    fn store(&self, id: &str, blob: &[u8]) -> Result<(), WarehouseError> {
        let path = self.path_for(id)?;
        let parent = path.parent().ok_or_else(|| WarehouseError::InvalidId {
            id: id.to_string(),
        })?;
        create_dir(parent).map_err(io_err)?;

        // Readers never observe a partial blob; a failed write keeps the old one.
        let mut tmp = Builder::new()
            .prefix(TEMP_PREFIX)
            .tempfile_in(parent)
            .map_err(io_err)?;
        tmp.write_all(STANDARD.encode(blob).as_bytes())
            .map_err(io_err)?;
        tmp.flush().map_err(io_err)?;
        set_file_mode(tmp.as_file()).map_err(io_err)?;
        tmp.persist(&path).map_err(|err| io_err(err.error))?;
        Ok(())
    }

    #[instrument(skip(self))]
    fn retrieve(&self, id: &str) -> Result<Vec<u8>, WarehouseError> {
        let path = self.path_for(id)?;
        let encoded = fs::read(&path).map_err(|err| {
            if err.kind() == io::ErrorKind::NotFound {
                WarehouseError::NotFound { id: id.to_string() }
            } else {
                io_err(err)
            }
        })?;

        STANDARD
            .decode(encoded.trim_ascii())
            .map_err(|err| WarehouseError::Decode {
                reason: err.to_string(),
            })
    }
}

fn is_temp_file(path: &Path) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| name.starts_with(TEMP_PREFIX))
}

fn create_dir(dir: &Path) -> io::Result<()> {
    let mut builder = fs::DirBuilder::new();
    builder.recursive(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::DirBuilderExt;
        builder.mode(DIR_MODE);
    }
    builder.create(dir)
}

#[cfg(unix)]
fn set_file_mode(file: &fs::File) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    file.set_permissions(fs::Permissions::from_mode(FILE_MODE))
}

#[cfg(not(unix))]
fn set_file_mode(_file: &fs::File) -> io::Result<()> {
    Ok(())
}

fn io_err(err: io::Error) -> WarehouseError {
    WarehouseError::Io {
        reason: err.to_string(),
    }
}
