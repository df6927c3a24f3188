use std::collections::HashMap;

use serde_derive::{Deserialize, Serialize};

use crate::entities::Peer;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
/// One datagram's payload: a single JSON object discriminated by its `type`
/// field. Decoding an unknown or malformed shape fails outright; nothing here
/// falls back to field-by-field guessing.
pub enum Message {
    /// Ask a bootstrap node to register us and tell us who else it knows.
    Join { node_id: String, port: u16 },
    /// Current peer list, minus the node that just joined.
    JoinAck { peers: Vec<Peer> },
    /// Ask a peer for its file inventory.
    ListFiles { node_id: String },
    /// Inventory reply: file name to content digest.
    FileList {
        node_id: String,
        files: HashMap<String, String>,
    },
    /// Ask a peer for one whole file. A peer that lacks the file stays
    /// silent.
    GetFile { filename: String, node_id: String },
    /// Whole-file reply. `content` is the file's bytes hex-encoded.
    FileData {
        filename: String,
        content: String,
        hash: String,
    },
    /// Tell a peer to remove a file.
    DeleteFile { filename: String, node_id: String },
    /// Confirmation that a DELETE_FILE removed something.
    DeleteAck { filename: String },
    /// One-way advertisement of our full inventory. Never answered.
    FileAnnounce {
        node_id: String,
        files: HashMap<String, String>,
    },
    /// Liveness probe.
    Ping {},
    /// Liveness reply.
    Pong { node_id: String },
}
