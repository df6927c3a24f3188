use std::fmt;

use serde_derive::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Hash)]
#[serde(from = "(String, u16)", into = "(String, u16)")]
/// Network address of another node. Encoded on the wire as a plain
/// `[host, port]` pair.
pub struct Peer {
    pub host: String,
    pub port: u16,
}

impl Peer {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Peer {
            host: host.into(),
            port,
        }
    }
}

impl From<(String, u16)> for Peer {
    fn from((host, port): (String, u16)) -> Self {
        Peer { host, port }
    }
}

impl From<Peer> for (String, u16) {
    fn from(peer: Peer) -> Self {
        (peer.host, peer.port)
    }
}

impl fmt::Display for Peer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodes_as_host_port_pair() {
        let peer = Peer::new("10.0.0.7", 9002);
        let value = serde_json::to_value(&peer).unwrap();
        assert_eq!(value, serde_json::json!(["10.0.0.7", 9002]));
    }

    #[test]
    fn decodes_from_pair() {
        let peer: Peer = serde_json::from_str(r#"["192.168.1.5", 9001]"#).unwrap();
        assert_eq!(peer, Peer::new("192.168.1.5", 9001));
    }

    #[test]
    fn displays_as_host_colon_port() {
        assert_eq!(Peer::new("127.0.0.1", 9001).to_string(), "127.0.0.1:9001");
    }
}
