use dirsync_core::entities::Peer;

#[derive(Debug)]
/// Known remote endpoints, kept in registration order. Membership only grows
/// for the lifetime of the process; nothing here ever evicts a peer.
pub struct PeerRegistry {
    local_port: u16,
    peers: Vec<Peer>,
}

impl PeerRegistry {
    pub fn new(local_port: u16) -> Self {
        PeerRegistry {
            local_port,
            peers: Vec::new(),
        }
    }

    /// Inserts unless the peer is already present or looks like this node.
    /// "Looks like this node" means its port equals the local listening port;
    /// the host is deliberately not consulted. Returns whether an insertion
    /// happened.
    pub fn add(&mut self, peer: Peer) -> bool {
        if peer.port == self.local_port || self.peers.contains(&peer) {
            return false;
        }
        self.peers.push(peer);
        true
    }

    pub fn all(&self) -> Vec<Peer> {
        self.peers.clone()
    }

    /// Registration order, minus an exact (host, port) match. Used when
    /// answering a JOIN so the newcomer is not told about itself.
    pub fn all_excluding(&self, excluded: &Peer) -> Vec<Peer> {
        self.peers
            .iter()
            .filter(|peer| *peer != excluded)
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.peers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.peers.is_empty()
    }
}
