use std::fs;
use std::path::Path;
use log::debug;
use crate::errors::StorageError;

/// Durable key/value store holding whole blobs under a key
pub trait Storage {
    /// Returns the blob stored under the key, or None if nothing has been stored yet
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Replaces whatever is stored under the key with the given blob
    fn set(&mut self, key: &str, blob: &str) -> Result<(), StorageError>;
}

/// Storage keeping one json file per key in a directory
pub struct FileStorage {
    dir: String,
}

impl FileStorage {
    /// Returns a new FileStorage, the directory is created if it doesn't exist
    ///
    /// # Arguments
    ///
    /// * 'dir' - directory to keep files in, expected to end with a path separator
    pub fn new(dir: &str) -> Result<FileStorage, StorageError> {
        fs::create_dir_all(dir)?;

        Ok(Self { dir: dir.to_string() })
    }

    fn file_path(&self, key: &str) -> String {
        format!("{}{}.json", self.dir, key)
    }
}

impl Storage for FileStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let file_path = self.file_path(key);

        if Path::new(&file_path).exists() {
            let blob = fs::read_to_string(&file_path)?;
            debug!("read {} bytes from {}", blob.len(), file_path);
            Ok(Some(blob))
        } else {
            Ok(None)
        }
    }

    /// The blob is written to a temporary file first and then renamed over the target, so a
    /// crash half way leaves the previous blob intact.
    fn set(&mut self, key: &str, blob: &str) -> Result<(), StorageError> {
        let file_path = self.file_path(key);
        let tmp_path = format!("{}.tmp", file_path);

        fs::write(&tmp_path, blob)?;
        fs::rename(&tmp_path, &file_path)?;
        debug!("wrote {} bytes to {}", blob.len(), file_path);

        Ok(())
    }
}

#[cfg(test)]
pub use memory::MemoryStorage;
