use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::Path;
use std::sync::Arc;
use std::thread;

use dirsync_config::WATCH_INTERVAL;

use crate::node::Shared;
use crate::{sync, LOGGER};

/// Polls the directory's name set and reacts to the difference against the
/// previous poll: new names trigger a full sync pass, vanished names a delete
/// propagation. The first poll sees every pre-existing file as new, which
/// doubles as the startup sync. Files this node downloads itself show up as
/// "new" one poll later and re-trigger a pass; that pass fetches nothing, so
/// the loop settles.
pub(crate) fn watch_loop(shared: Arc<Shared>) {
    let mut previous: HashSet<String> = HashSet::new();

    while shared.is_running() {
        let current = match list_names(&shared.dir) {
            Ok(names) => names,
            Err(err) => {
                LOGGER.error(format!("[{}] watching: {}", shared.id, err));
                thread::sleep(WATCH_INTERVAL);
                continue;
            }
        };

        let (added, removed) = diff(&previous, &current);
        if !added.is_empty() {
            for name in &added {
                LOGGER.info(format!("[{}] new: {}", shared.id, name));
            }
            sync::run_sync_pass(&shared);
        }
        for name in &removed {
            LOGGER.info(format!("[{}] gone: {}", shared.id, name));
            sync::propagate_delete(&shared, name);
        }

        previous = current;
        thread::sleep(WATCH_INTERVAL);
    }
}

fn list_names(dir: &Path) -> io::Result<HashSet<String>> {
    let mut names = HashSet::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        if let Ok(name) = entry.file_name().into_string() {
            names.insert(name);
        }
    }
    Ok(names)
}

/// Names that appeared and names that vanished between two polls.
pub fn diff(previous: &HashSet<String>, current: &HashSet<String>) -> (Vec<String>, Vec<String>) {
    let added = current.difference(previous).cloned().collect();
    let removed = previous.difference(current).cloned().collect();
    (added, removed)
}
