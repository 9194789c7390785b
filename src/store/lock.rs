use std::{
   fs::{self, File, OpenOptions},
   path::{Path, PathBuf},
};

use crate::error::Result;

/// Exclusive advisory lock held while the embeddings cache is regenerated.
pub struct CacheLock {
   file: File,
}

impl CacheLock {
   pub fn acquire(cache_path: &Path) -> Result<Self> {
      let lock_path = lock_path(cache_path);

      if let Some(parent) = lock_path.parent()
         && !parent.as_os_str().is_empty()
      {
         fs::create_dir_all(parent)?;
      }

      let file = OpenOptions::new()
         .create(true)
         .truncate(true)
         .read(true)
         .write(true)
         .open(&lock_path)?;

      file.lock()?;

      Ok(Self { file })
   }
}

impl Drop for CacheLock {
   fn drop(&mut self) {
      let _ = self.file.unlock();
   }
}

fn lock_path(cache_path: &Path) -> PathBuf {
   let mut name = cache_path.file_name().unwrap_or_default().to_os_string();
   name.push(".lock");
   cache_path.with_file_name(name)
}
