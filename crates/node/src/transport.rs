use std::io;
use std::net::{Ipv4Addr, SocketAddr, UdpSocket};
use std::time::Duration;

use dirsync_config::BUFFER_SIZE;
use dirsync_core::entities::{Error, Message, Peer, Result};
use dirsync_core::utils::create_buffer;

// Every outbound exchange opens a fresh ephemeral socket, so concurrent
// requests can never read each other's replies. Nothing here fragments: a
// FILE_DATA payload that outgrows a datagram (hex content doubles the file
// size, plus JSON framing) is lost in the network and surfaces as a timeout
// on the requesting side.

fn ephemeral_socket() -> io::Result<UdpSocket> {
    UdpSocket::bind((Ipv4Addr::UNSPECIFIED, 0))
}

/// Encode and send one datagram, best-effort. No reply is expected.
pub fn send_oneway(msg: &Message, peer: &Peer) -> Result<()> {
    let payload = serde_json::to_vec(msg)?;
    let socket = ephemeral_socket().map_err(Error::Transport)?;
    socket
        .send_to(&payload, (peer.host.as_str(), peer.port))
        .map_err(Error::Transport)?;
    Ok(())
}

/// Send one datagram and block for exactly one reply or the timeout,
/// whichever comes first.
pub fn request(msg: &Message, peer: &Peer, timeout: Duration) -> Result<Message> {
    let payload = serde_json::to_vec(msg)?;
    let socket = ephemeral_socket().map_err(Error::Transport)?;
    socket
        .set_read_timeout(Some(timeout))
        .map_err(Error::Transport)?;
    socket
        .send_to(&payload, (peer.host.as_str(), peer.port))
        .map_err(Error::Transport)?;

    let mut buf = create_buffer(BUFFER_SIZE);
    let (len, _) = socket.recv_from(&mut buf).map_err(|err| match err.kind() {
        io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut => Error::Timeout,
        _ => Error::Transport(err),
    })?;
    Ok(serde_json::from_slice(&buf[..len])?)
}

/// Reply path for inbound handlers: the datagram goes back to the exact
/// source address the request came from.
pub fn reply_to(msg: &Message, dest: SocketAddr) -> Result<()> {
    let payload = serde_json::to_vec(msg)?;
    let socket = ephemeral_socket().map_err(Error::Transport)?;
    socket.send_to(&payload, dest).map_err(Error::Transport)?;
    Ok(())
}
