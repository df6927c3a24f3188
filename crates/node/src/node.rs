use std::collections::HashMap;
use std::fs;
use std::io;
use std::net::{Ipv4Addr, UdpSocket};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;

use chrono::{DateTime, Local};

use dirsync_config::{JOIN_TIMEOUT, SERVER_POLL, SHELL_LIST_TIMEOUT};
use dirsync_core::entities::{Error, Message, Peer, Result};

use crate::registry::PeerRegistry;
use crate::{catalog, server, sync, transport, watcher, LOGGER};

#[derive(Debug, Clone, Default)]
/// Transfer counters, kept only for reporting.
pub struct Stats {
    pub files_sent: u64,
    pub files_received: u64,
    pub bytes_sent: u64,
    pub bytes_received: u64,
    pub sync_passes: u64,
    pub last_sync: Option<DateTime<Local>>,
}

/// Everything mutated from more than one loop, behind a single lock. The lock
/// is never held across a network call: loops snapshot what they need, drop
/// the guard, then do I/O.
pub(crate) struct State {
    pub registry: PeerRegistry,
    pub catalog: HashMap<String, String>,
    pub stats: Stats,
}

pub(crate) struct Shared {
    pub id: String,
    pub port: u16,
    pub dir: PathBuf,
    running: AtomicBool,
    pub state: Mutex<State>,
}

impl Shared {
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Relaxed)
    }
}

/// One synchronization node: a listening server, a directory watcher and a
/// periodic synchronizer over one shared state.
pub struct Node {
    shared: Arc<Shared>,
}

impl Node {
    /// Creates the sync directory if missing. No sockets are touched until
    /// [`Node::start`].
    pub fn new(id: impl Into<String>, port: u16, dir: impl Into<PathBuf>) -> io::Result<Node> {
        let dir = dir.into();
        if !dir.exists() {
            fs::create_dir_all(&dir)?;
        }
        Ok(Node {
            shared: Arc::new(Shared {
                id: id.into(),
                port,
                dir,
                running: AtomicBool::new(false),
                state: Mutex::new(State {
                    registry: PeerRegistry::new(port),
                    catalog: HashMap::new(),
                    stats: Stats::default(),
                }),
            }),
        })
    }

    pub fn id(&self) -> &str {
        &self.shared.id
    }

    pub fn port(&self) -> u16 {
        self.shared.port
    }

    pub fn dir(&self) -> &Path {
        &self.shared.dir
    }

    pub fn is_running(&self) -> bool {
        self.shared.is_running()
    }

    /// Binds the listening socket and spawns the three background loops:
    /// server, directory watcher, periodic synchronizer.
    pub fn start(&self) -> io::Result<()> {
        let socket = UdpSocket::bind((Ipv4Addr::UNSPECIFIED, self.shared.port))?;
        socket.set_read_timeout(Some(SERVER_POLL))?;
        self.shared.running.store(true, Ordering::Relaxed);

        let serve = self.shared.clone();
        thread::spawn(move || server::serve(serve, socket));

        let watch = self.shared.clone();
        thread::spawn(move || watcher::watch_loop(watch));

        let timer = self.shared.clone();
        thread::spawn(move || sync::periodic_loop(timer));

        Ok(())
    }

    /// Flips the running flag. Each loop exits at its next poll boundary, so
    /// shutdown latency is bounded by the slowest poll interval; in-flight
    /// handlers run to completion.
    pub fn stop(&self) {
        self.shared.running.store(false, Ordering::Relaxed);
        LOGGER.info(format!("[{}] stopping", self.shared.id));
    }

    /// Registers a peer by hand. Returns whether it was new.
    pub fn add_peer(&self, host: &str, port: u16) -> bool {
        let peer = Peer::new(host, port);
        let added = self.shared.state.lock().unwrap().registry.add(peer.clone());
        if added {
            LOGGER.info(format!("[{}] peer {} added", self.shared.id, peer));
        }
        added
    }

    pub fn peers(&self) -> Vec<Peer> {
        self.shared.state.lock().unwrap().registry.all()
    }

    /// One-shot join against a bootstrap node: learns its peer list plus the
    /// bootstrap itself. Nobody else hears about this node until they ask the
    /// bootstrap themselves — membership propagation is pull-based.
    /// Returns the number of peers learned.
    pub fn join(&self, host: &str, port: u16) -> Result<usize> {
        let bootstrap = Peer::new(host, port);
        let request = Message::Join {
            node_id: self.shared.id.clone(),
            port: self.shared.port,
        };
        match transport::request(&request, &bootstrap, JOIN_TIMEOUT)? {
            Message::JoinAck { peers } => {
                let mut state = self.shared.state.lock().unwrap();
                let mut learned = 0;
                if state.registry.add(bootstrap) {
                    learned += 1;
                }
                for peer in peers {
                    if state.registry.add(peer) {
                        learned += 1;
                    }
                }
                LOGGER.info(format!(
                    "[{}] joined, {} peer(s) learned",
                    self.shared.id, learned
                ));
                Ok(learned)
            }
            other => Err(Error::Protocol(format!(
                "unexpected reply to JOIN: {:?}",
                other
            ))),
        }
    }

    /// Runs a full reconciliation pass on the calling thread.
    pub fn sync_now(&self) {
        sync::run_sync_pass(&self.shared);
    }

    /// Fresh scan of the sync directory: (name, size in bytes, digest),
    /// sorted by name.
    pub fn local_files(&self) -> io::Result<Vec<(String, u64, String)>> {
        let scanned = catalog::scan(&self.shared.dir)?;
        self.shared.state.lock().unwrap().catalog = scanned.clone();

        let mut files: Vec<(String, u64, String)> = scanned
            .into_iter()
            .map(|(name, digest)| {
                let size = fs::metadata(self.shared.dir.join(&name))
                    .map(|meta| meta.len())
                    .unwrap_or(0);
                (name, size, digest)
            })
            .collect();
        files.sort();
        Ok(files)
    }

    /// Live query of every known peer: file name to the peers holding it.
    /// Unreachable peers are simply absent from the result.
    pub fn network_files(&self) -> HashMap<String, Vec<Peer>> {
        sync::network_inventory(&self.shared, SHELL_LIST_TIMEOUT)
    }

    /// Copies `source` into the sync directory under its file name. The
    /// watcher notices the new file on its next poll and triggers a pass.
    pub fn add_local_file(&self, source: &Path) -> io::Result<String> {
        let name = source
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| {
                io::Error::new(io::ErrorKind::InvalidInput, "source has no usable file name")
            })?
            .to_string();
        fs::copy(source, self.shared.dir.join(&name))?;
        LOGGER.info(format!("[{}] '{}' added", self.shared.id, name));
        Ok(name)
    }

    /// Deletes a local file and tells every peer to drop their copy.
    pub fn remove_local_file(&self, name: &str) -> io::Result<()> {
        let path = self.shared.dir.join(name);
        if !path.exists() {
            return Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("'{}' not found", name),
            ));
        }
        fs::remove_file(&path)?;
        LOGGER.info(format!("[{}] '{}' removed", self.shared.id, name));
        sync::propagate_delete(&self.shared, name);
        Ok(())
    }

    pub fn stats(&self) -> Stats {
        self.shared.state.lock().unwrap().stats.clone()
    }
}
