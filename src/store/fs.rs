//! Directory-backed key store.

use super::KeyStore;
use std::fs::{self, DirBuilder, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};

#[cfg(unix)]
use std::os::unix::fs::{DirBuilderExt, OpenOptionsExt};

/// Name of the reservation directory created under the work directory
pub const UIDS_DIR: &str = "uids";

#[cfg(unix)]
const DIR_MODE: u32 = 0o700;
#[cfg(unix)]
const MARKER_MODE: u32 = 0o600;

/// Key store keeping one marker file per key, named by its decimal value
#[derive(Debug, Clone)]
pub struct FsKeyStore {
    dir: PathBuf,
}

impl FsKeyStore {
    /// Open the store under `work_dir`, creating `<work_dir>/uids` if needed.
    pub fn open(work_dir: impl AsRef<Path>) -> io::Result<Self> {
        let dir = work_dir.as_ref().join(UIDS_DIR);
        let mut builder = DirBuilder::new();
        builder.recursive(true);
        #[cfg(unix)]
        builder.mode(DIR_MODE);
        builder.create(&dir)?;
        Ok(FsKeyStore { dir })
    }

    /// Directory holding the markers
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn marker(&self, key: u32) -> PathBuf {
        self.dir.join(key.to_string())
    }
}

impl KeyStore for FsKeyStore {
    fn try_create(&self, key: u32) -> io::Result<bool> {
        let mut options = OpenOptions::new();
        options.write(true).create_new(true);
        #[cfg(unix)]
        options.mode(MARKER_MODE);

        match options.open(self.marker(key)) {
            // the marker is zero-length, dropping the handle closes it
            Ok(_file) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => Ok(false),
            Err(e) => Err(e),
        }
    }

    fn remove(&self, key: u32) -> io::Result<()> {
        fs::remove_file(self.marker(key))
    }

    fn keys(&self) -> io::Result<Vec<u32>> {
        let mut keys = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let entry = entry?;
            if let Some(key) = entry.file_name().to_str().and_then(parse_marker) {
                keys.push(key);
            }
        }
        keys.sort_unstable();
        Ok(keys)
    }

    fn location(&self) -> String {
        self.dir.display().to_string()
    }
}

/// Key named by a marker file. Only the canonical decimal form counts, so
/// `007` or `+7` never shadow the marker `7`.
fn parse_marker(name: &str) -> Option<u32> {
    name.parse::<u32>().ok().filter(|key| key.to_string() == name)
}
