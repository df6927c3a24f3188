use std::collections::HashSet;
use std::io;
use std::io::prelude::*;
use std::path::Path;

use clap::{Arg, ArgMatches, Command};
use rand::Rng;

use dirsync_config::DEFAULT_SYNC_DIR;
use dirsync_core::utils::Logger;
use dirsync_node::Node;

pub static LOGGER: Logger = Logger::compact("dirsync");

/// Builds the CLI definition for the `dirsync` node.
///
/// One invocation runs one node: it binds the given UDP port, mirrors the
/// given directory, and drops into an interactive shell for everything else
/// (listing, syncing, peer management). An initial peer can be supplied with
/// `--peer host:port`; more can be added from the shell, or learned by
/// joining an existing network.
///
/// Example:
/// ```bash
/// dirsync --id alpha --port 9001 --dir ./mirror --peer 192.168.1.20:9002
/// ```
pub fn create_command() -> Command {
    Command::new("dirsync")
        .about("Peer-to-peer directory synchronization node")
        .arg(
            Arg::new("ID")
                .help("Node identifier (random if omitted)")
                .short('i')
                .long("id")
                .value_name("ID"),
        )
        .arg(
            Arg::new("PORT")
                .help("UDP listening port")
                .required(true)
                .short('p')
                .long("port")
                .value_name("PORT"),
        )
        .arg(
            Arg::new("DIR")
                .help("Directory to keep in sync")
                .short('d')
                .long("dir")
                .value_name("PATH"),
        )
        .arg(
            Arg::new("PEER")
                .help("Initial peer as host:port")
                .long("peer")
                .value_name("HOST:PORT"),
        )
}

/// Turns parsed arguments into a ready (not yet started) node.
pub fn build_node(matches: &ArgMatches) -> io::Result<Node> {
    let port: u16 = matches
        .get_one::<String>("PORT")
        .unwrap() // required arg
        .parse()
        .map_err(|_| {
            io::Error::new(io::ErrorKind::InvalidInput, "port must be a number in 1-65535")
        })?;

    let id = match matches.get_one::<String>("ID") {
        Some(id) => id.clone(),
        None => format!("node-{:04x}", rand::thread_rng().gen::<u16>()),
    };

    let dir = matches
        .get_one::<String>("DIR")
        .map(String::as_str)
        .unwrap_or(DEFAULT_SYNC_DIR);

    let node = Node::new(id, port, dir)?;

    if let Some(spec) = matches.get_one::<String>("PEER") {
        match parse_peer(spec) {
            Some((host, peer_port)) => {
                node.add_peer(&host, peer_port);
            }
            None => LOGGER.error(format!("ignoring bad --peer '{}', expected host:port", spec)),
        }
    }

    Ok(node)
}

/// Splits a `host:port` spec. IPv6 hosts keep their colons; only the last
/// one separates the port.
pub fn parse_peer(spec: &str) -> Option<(String, u16)> {
    let (host, port) = spec.rsplit_once(':')?;
    if host.is_empty() {
        return None;
    }
    let port = port.parse().ok()?;
    Some((host.to_string(), port))
}

/// Numbered menu loop on stdin. Failures report inline and the session keeps
/// going; only `9`, EOF, or a stopped node end it.
pub fn run_shell(node: &Node) -> io::Result<()> {
    print_menu(node.id());

    let stdin = io::stdin();
    let mut line = String::new();
    while node.is_running() {
        print!("[{}]> ", node.id());
        io::stdout().flush()?;

        line.clear();
        if stdin.read_line(&mut line)? == 0 {
            node.stop();
            break;
        }

        match line.trim() {
            "1" => show_files(node),
            "2" => node.sync_now(),
            "3" => {
                if let Err(err) = prompt_add_peer(node) {
                    LOGGER.error(err);
                }
            }
            "4" => show_stats(node),
            "5" => show_peers(node),
            "6" => {
                if let Err(err) = prompt_add_file(node) {
                    LOGGER.error(err);
                }
            }
            "7" => {
                if let Err(err) = prompt_remove_file(node) {
                    LOGGER.error(err);
                }
            }
            "8" => {
                if let Err(err) = prompt_join(node) {
                    LOGGER.error(err);
                }
            }
            "9" => {
                node.stop();
                break;
            }
            "" => {}
            other => println!("unknown command '{}'", other),
        }
    }

    Ok(())
}

fn print_menu(id: &str) {
    println!();
    println!("dirsync node '{}'", id);
    println!("  1  list files");
    println!("  2  sync now");
    println!("  3  add peer");
    println!("  4  stats");
    println!("  5  show peers");
    println!("  6  add file");
    println!("  7  remove file");
    println!("  8  join network");
    println!("  9  quit");
    println!();
}

fn read_input(prompt: &str) -> io::Result<String> {
    print!("{}: ", prompt);
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().read_line(&mut line)?;
    Ok(line.trim().to_string())
}

fn show_files(node: &Node) {
    let local = match node.local_files() {
        Ok(files) => files,
        Err(err) => {
            LOGGER.error(err);
            return;
        }
    };

    println!("\nLocal:");
    if local.is_empty() {
        println!("  none");
    } else {
        for (name, size, digest) in &local {
            println!("  - {} ({} bytes) hash {:.8}...", name, size, digest);
        }
    }

    println!("\nOn the network:");
    let network = node.network_files();
    if network.is_empty() {
        println!("  none");
    } else {
        let local_names: HashSet<&str> = local.iter().map(|(name, _, _)| name.as_str()).collect();
        let mut names: Vec<&String> = network.keys().collect();
        names.sort();
        for name in names {
            let mark = if local_names.contains(name.as_str()) {
                "have"
            } else {
                "need"
            };
            let holders: Vec<String> = network[name].iter().map(|peer| peer.to_string()).collect();
            println!("  [{}] {} at: {}", mark, name, holders.join(", "));
        }
    }
    println!();
}

fn show_stats(node: &Node) {
    let stats = node.stats();
    println!();
    println!("Files sent:     {}", stats.files_sent);
    println!("Files received: {}", stats.files_received);
    println!("Bytes sent:     {}", stats.bytes_sent);
    println!("Bytes received: {}", stats.bytes_received);
    println!("Sync passes:    {}", stats.sync_passes);
    println!("Peers:          {}", node.peers().len());
    match stats.last_sync {
        Some(at) => println!("Last sync:      {}", at.format("%H:%M:%S")),
        None => println!("Last sync:      never"),
    }
    println!();
}

fn show_peers(node: &Node) {
    let peers = node.peers();
    println!("\nPeers:");
    if peers.is_empty() {
        println!("  none");
    } else {
        for (index, peer) in peers.iter().enumerate() {
            println!("  {}. {}", index + 1, peer);
        }
    }
    println!();
}

fn prompt_add_peer(node: &Node) -> io::Result<()> {
    let host = read_input("Host")?;
    let port: u16 = read_input("Port")?
        .parse()
        .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "bad port"))?;
    if !node.add_peer(&host, port) {
        println!("already known (or that's this node's own port)");
    }
    Ok(())
}

fn prompt_add_file(node: &Node) -> io::Result<()> {
    let source = read_input("File")?;
    let name = node.add_local_file(Path::new(&source))?;
    println!("'{}' added", name);
    Ok(())
}

fn prompt_remove_file(node: &Node) -> io::Result<()> {
    let name = read_input("Name")?;
    node.remove_local_file(&name)?;
    println!("'{}' removed", name);
    Ok(())
}

fn prompt_join(node: &Node) -> io::Result<()> {
    let host = read_input("Bootstrap host")?;
    let port: u16 = read_input("Bootstrap port")?
        .parse()
        .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "bad port"))?;
    match node.join(&host, port) {
        Ok(learned) => println!("connected, {} peer(s) learned", learned),
        Err(err) => println!("join failed: {}", err),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_required_and_optional_args() {
        let matches = create_command().get_matches_from([
            "dirsync", "--id", "alpha", "--port", "9001", "--dir", "./mirror",
        ]);
        assert_eq!(matches.get_one::<String>("ID").unwrap(), "alpha");
        assert_eq!(matches.get_one::<String>("PORT").unwrap(), "9001");
        assert_eq!(matches.get_one::<String>("DIR").unwrap(), "./mirror");
        assert!(matches.get_one::<String>("PEER").is_none());
    }

    #[test]
    fn port_is_required() {
        let result = create_command().try_get_matches_from(["dirsync", "--id", "alpha"]);
        assert!(result.is_err());
    }

    #[test]
    fn parse_peer_accepts_host_colon_port() {
        assert_eq!(
            parse_peer("192.168.1.20:9002"),
            Some(("192.168.1.20".to_string(), 9002))
        );
    }

    #[test]
    fn parse_peer_rejects_junk() {
        assert_eq!(parse_peer("no-port-here"), None);
        assert_eq!(parse_peer(":9002"), None);
        assert_eq!(parse_peer("host:notaport"), None);
    }

    #[test]
    fn parse_peer_keeps_ipv6_colons() {
        assert_eq!(parse_peer("::1:9002"), Some(("::1".to_string(), 9002)));
    }
}
