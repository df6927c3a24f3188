use std::collections::HashMap;
use std::fs;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use chrono::Local;

use dirsync_config::{FETCH_TIMEOUT, LIST_TIMEOUT, SYNC_INTERVAL};
use dirsync_core::entities::{Message, Peer};

use crate::node::Shared;
use crate::{catalog, transport, LOGGER};

/// Asks `peer` for one whole file and overwrites the local copy on success.
/// Failure of any kind (timeout, bad payload, write error) leaves the
/// destination untouched and returns false.
pub(crate) fn fetch_file(shared: &Shared, filename: &str, peer: &Peer) -> bool {
    let request = Message::GetFile {
        filename: filename.to_string(),
        node_id: shared.id.clone(),
    };
    let reply = match transport::request(&request, peer, FETCH_TIMEOUT) {
        Ok(reply) => reply,
        Err(err) => {
            LOGGER.error(format!(
                "[{}] fetching '{}' from {}: {}",
                shared.id, filename, peer, err
            ));
            return false;
        }
    };

    let content = match reply {
        Message::FileData { content, .. } => content,
        other => {
            LOGGER.debug(format!(
                "[{}] unexpected reply fetching '{}': {:?}",
                shared.id, filename, other
            ));
            return false;
        }
    };
    let bytes = match hex::decode(content) {
        Ok(bytes) => bytes,
        Err(err) => {
            LOGGER.error(format!(
                "[{}] bad payload for '{}': {}",
                shared.id, filename, err
            ));
            return false;
        }
    };

    if let Err(err) = fs::write(shared.dir.join(filename), &bytes) {
        LOGGER.error(format!(
            "[{}] writing '{}': {}",
            shared.id, filename, err
        ));
        return false;
    }

    let mut state = shared.state.lock().unwrap();
    state.stats.files_received += 1;
    state.stats.bytes_received += bytes.len() as u64;
    drop(state);
    LOGGER.info(format!(
        "[{}] '{}' downloaded from {}",
        shared.id, filename, peer
    ));
    true
}

/// Tells every known peer to drop `filename`. Fire-and-forget; nobody is
/// awaited.
pub(crate) fn propagate_delete(shared: &Shared, filename: &str) {
    let notice = Message::DeleteFile {
        filename: filename.to_string(),
        node_id: shared.id.clone(),
    };
    let peers = shared.state.lock().unwrap().registry.all();
    for peer in peers {
        if let Err(err) = transport::send_oneway(&notice, &peer) {
            LOGGER.error(format!(
                "[{}] delete notice to {}: {}",
                shared.id, peer, err
            ));
        }
    }
}

/// One full reconciliation pass: refresh the local catalog, pull every peer's
/// inventory, fetch the files we lack, announce what we hold.
pub(crate) fn run_sync_pass(shared: &Shared) {
    LOGGER.info(format!("[{}] sync pass starting", shared.id));

    let local = match catalog::scan(&shared.dir) {
        Ok(map) => map,
        Err(err) => {
            LOGGER.error(format!("[{}] scanning: {}", shared.id, err));
            return;
        }
    };
    let peers = {
        let mut state = shared.state.lock().unwrap();
        state.catalog = local.clone();
        state.registry.all()
    };

    // Ephemeral inventory for this pass only: file name to its sources in
    // peer query order. Peers that fail to answer are skipped, not fatal.
    let mut remote: HashMap<String, Vec<(Peer, String)>> = HashMap::new();
    let listing = Message::ListFiles {
        node_id: shared.id.clone(),
    };
    for peer in &peers {
        match transport::request(&listing, peer, LIST_TIMEOUT) {
            Ok(Message::FileList { files, .. }) => {
                for (name, digest) in files {
                    remote.entry(name).or_default().push((peer.clone(), digest));
                }
            }
            Ok(other) => LOGGER.debug(format!(
                "[{}] unexpected reply listing {}: {:?}",
                shared.id, peer, other
            )),
            Err(err) => LOGGER.error(format!("[{}] listing {}: {}", shared.id, peer, err)),
        }
    }

    // Pull the names we lack, first answering source wins. A name already
    // present locally is never re-fetched or content-compared, whatever the
    // digests say.
    for (name, sources) in &remote {
        if local.contains_key(name) {
            continue;
        }
        for (peer, _) in sources {
            if fetch_file(shared, name, peer) {
                break;
            }
        }
    }

    if !local.is_empty() {
        let announce = Message::FileAnnounce {
            node_id: shared.id.clone(),
            files: local,
        };
        for peer in &peers {
            if let Err(err) = transport::send_oneway(&announce, peer) {
                LOGGER.error(format!(
                    "[{}] announcing to {}: {}",
                    shared.id, peer, err
                ));
            }
        }
    }

    let mut state = shared.state.lock().unwrap();
    state.stats.sync_passes += 1;
    state.stats.last_sync = Some(Local::now());
    drop(state);
    LOGGER.info(format!("[{}] sync pass complete", shared.id));
}

/// Live inventory for the interactive listing: file name to the peers that
/// report holding it. Unreachable peers are simply absent.
pub(crate) fn network_inventory(shared: &Shared, timeout: Duration) -> HashMap<String, Vec<Peer>> {
    let peers = shared.state.lock().unwrap().registry.all();
    let listing = Message::ListFiles {
        node_id: shared.id.clone(),
    };
    let mut inventory: HashMap<String, Vec<Peer>> = HashMap::new();
    for peer in peers {
        match transport::request(&listing, &peer, timeout) {
            Ok(Message::FileList { files, .. }) => {
                for name in files.into_keys() {
                    inventory.entry(name).or_default().push(peer.clone());
                }
            }
            Ok(_) => {}
            Err(err) => LOGGER.debug(format!("[{}] listing {}: {}", shared.id, peer, err)),
        }
    }
    inventory
}

/// Unprompted synchronization: sleep the full interval, then run a pass if
/// the node is still up.
pub(crate) fn periodic_loop(shared: Arc<Shared>) {
    while shared.is_running() {
        thread::sleep(SYNC_INTERVAL);
        if shared.is_running() {
            run_sync_pass(&shared);
        }
    }
}
