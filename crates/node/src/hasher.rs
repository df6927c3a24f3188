use std::fs::File;
use std::io;
use std::io::Read;
use std::path::Path;

use md5::{Digest, Md5};

use dirsync_config::HASH_CHUNK;
use dirsync_core::utils::create_buffer;

/// Streams `path` through MD5 in fixed-size chunks and returns the lowercase
/// hex digest. Any I/O failure yields an empty string, which callers must
/// treat as "could not hash" and never as a content identity.
pub fn file_digest(path: &Path) -> String {
    try_digest(path).unwrap_or_default()
}

fn try_digest(path: &Path) -> io::Result<String> {
    let mut file = File::open(path)?;
    let mut hasher = Md5::new();
    let mut buf = create_buffer(HASH_CHUNK);
    loop {
        let read = file.read(&mut buf)?;
        if read == 0 {
            break;
        }
        hasher.update(&buf[..read]);
    }
    Ok(hex::encode(hasher.finalize()))
}
