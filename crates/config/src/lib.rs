pub use std::time::Duration;

/// Receive buffer for one datagram. The protocol never fragments: file
/// content travels hex-encoded (2x the binary size) inside a JSON object, so
/// a file larger than roughly `BUFFER_SIZE / 2` bytes minus framing cannot
/// cross the wire at all. That cap is a property of the protocol, not a
/// tunable.
pub const BUFFER_SIZE: usize = 65535;

/// Read granularity when streaming a file through the digest.
pub const HASH_CHUNK: usize = 4096;

pub const DEFAULT_SYNC_DIR: &str = "tmp";

/// Workers serving inbound datagrams.
pub const HANDLER_WORKERS: usize = 8;

/// Inventory request during a sync pass.
pub const LIST_TIMEOUT: Duration = Duration::from_secs(3);
/// Whole-file fetch.
pub const FETCH_TIMEOUT: Duration = Duration::from_secs(5);
/// One-shot join against a bootstrap node.
pub const JOIN_TIMEOUT: Duration = Duration::from_secs(5);
/// Inventory request from the interactive listing.
pub const SHELL_LIST_TIMEOUT: Duration = Duration::from_secs(2);

/// How often the listening loop wakes up to check the running flag.
pub const SERVER_POLL: Duration = Duration::from_secs(1);
/// Directory poll interval of the watcher.
pub const WATCH_INTERVAL: Duration = Duration::from_secs(2);
/// Interval between unprompted full sync passes.
pub const SYNC_INTERVAL: Duration = Duration::from_secs(30);
