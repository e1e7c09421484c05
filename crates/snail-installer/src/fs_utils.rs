use std::fs::{self, File};
use std::io::{self, Read};
use std::path::Path;

use sha2::{Digest, Sha256};
use snail_core::{IoResultExt, Result};

pub fn remove_file_if_exists(path: &Path) -> io::Result<()> {
    if path.exists() {
        fs::remove_file(path)?;
    }
    Ok(())
}

/// `fs::copy` also carries the source permission bits over on every platform we target.
pub fn copy_file(src: &Path, dst: &Path) -> Result<u64> {
    fs::copy(src, dst).with_path_context(|| {
        format!("failed to copy {} to {}", src.display(), dst.display())
    })
}

pub fn sha256_file(path: &Path) -> Result<String> {
    let mut file =
        File::open(path).with_path_context(|| format!("failed to open {}", path.display()))?;
    let mut hasher = Sha256::new();
    let mut buffer = [0_u8; 64 * 1024];
    loop {
        let read = file
            .read(&mut buffer)
            .with_path_context(|| format!("failed to read {}", path.display()))?;
        if read == 0 {
            break;
        }
        hasher.update(&buffer[..read]);
    }
    Ok(hex::encode(hasher.finalize()))
}
