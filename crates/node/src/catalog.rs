use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::Path;

use crate::hasher::file_digest;

/// Fresh snapshot of the regular files directly inside `dir`, mapped to their
/// content digests. No recursion and no caching: every inventory request,
/// sync pass and listing pays a full rescan and rehash.
pub fn scan(dir: &Path) -> io::Result<HashMap<String, String>> {
    let mut files = HashMap::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        // Non-UTF-8 names cannot be expressed on the wire.
        let name = match entry.file_name().into_string() {
            Ok(name) => name,
            Err(_) => continue,
        };
        files.insert(name, file_digest(&path));
    }
    Ok(files)
}
