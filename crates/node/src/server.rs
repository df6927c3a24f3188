use std::fs;
use std::io;
use std::net::{SocketAddr, UdpSocket};
use std::sync::Arc;

use threadpool::ThreadPool;

use dirsync_config::{BUFFER_SIZE, HANDLER_WORKERS};
use dirsync_core::entities::{Message, Peer, Result};
use dirsync_core::utils::create_buffer;

use crate::node::Shared;
use crate::{catalog, hasher, transport, LOGGER};

/// Listening loop. The socket arrives bound from `Node::start` (so bind
/// failures surface there) with a short read timeout, which is how the loop
/// observes the running flag. Each datagram is handed to a pool worker;
/// worker failures are logged and never reach this loop or each other.
pub(crate) fn serve(shared: Arc<Shared>, socket: UdpSocket) {
    let pool = ThreadPool::new(HANDLER_WORKERS);
    let mut buf = create_buffer(BUFFER_SIZE);

    LOGGER.info(format!(
        "[{}] listening on port {}",
        shared.id, shared.port
    ));

    while shared.is_running() {
        match socket.recv_from(&mut buf) {
            Ok((len, src)) => {
                let datagram = buf[..len].to_vec();
                let shared = shared.clone();
                pool.execute(move || {
                    if let Err(err) = handle_datagram(&shared, &datagram, src) {
                        LOGGER.error(format!("[{}] handler: {}", shared.id, err));
                    }
                });
            }
            Err(err)
                if err.kind() == io::ErrorKind::WouldBlock
                    || err.kind() == io::ErrorKind::TimedOut =>
            {
                continue;
            }
            Err(err) => LOGGER.error(format!("[{}] server: {}", shared.id, err)),
        }
    }
}

fn handle_datagram(shared: &Shared, datagram: &[u8], src: SocketAddr) -> Result<()> {
    let msg: Message = serde_json::from_slice(datagram)?;
    match msg {
        Message::ListFiles { .. } => {
            let files = catalog::scan(&shared.dir)?;
            shared.state.lock().unwrap().catalog = files.clone();
            transport::reply_to(
                &Message::FileList {
                    node_id: shared.id.clone(),
                    files,
                },
                src,
            )
        }

        Message::GetFile { filename, .. } => {
            let path = shared.dir.join(&filename);
            if !path.exists() {
                // Absent files are answered with silence; the requester's
                // timeout is the signal.
                return Ok(());
            }
            let content = fs::read(&path)?;
            transport::reply_to(
                &Message::FileData {
                    filename: filename.clone(),
                    content: hex::encode(&content),
                    hash: hasher::file_digest(&path),
                },
                src,
            )?;
            let mut state = shared.state.lock().unwrap();
            state.stats.files_sent += 1;
            state.stats.bytes_sent += content.len() as u64;
            drop(state);
            LOGGER.info(format!(
                "[{}] '{}' sent to {}",
                shared.id, filename, src
            ));
            Ok(())
        }

        Message::DeleteFile { filename, .. } => {
            let path = shared.dir.join(&filename);
            if path.exists() {
                fs::remove_file(&path)?;
                LOGGER.info(format!("[{}] '{}' removed", shared.id, filename));
                transport::reply_to(&Message::DeleteAck { filename }, src)?;
            }
            Ok(())
        }

        // Informational only: no reply, no state change.
        Message::FileAnnounce { .. } => Ok(()),

        Message::Ping {} => transport::reply_to(
            &Message::Pong {
                node_id: shared.id.clone(),
            },
            src,
        ),

        Message::Join { node_id, port } => {
            // The joiner is reachable at the source host and its advertised
            // listening port, not the ephemeral port it sent from.
            let peer = Peer::new(src.ip().to_string(), port);
            let reply = {
                let mut state = shared.state.lock().unwrap();
                if state.registry.add(peer.clone()) {
                    LOGGER.info(format!(
                        "[{}] node '{}' joined from {}",
                        shared.id, node_id, peer
                    ));
                }
                Message::JoinAck {
                    peers: state.registry.all_excluding(&peer),
                }
            };
            transport::reply_to(&reply, src)
        }

        // Reply kinds have no requester waiting at the listening socket.
        other => {
            LOGGER.debug(format!(
                "[{}] stray {:?} from {}",
                shared.id, other, src
            ));
            Ok(())
        }
    }
}
