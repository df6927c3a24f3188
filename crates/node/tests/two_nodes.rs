use std::fs;
use std::thread;
use std::time::{Duration, Instant};

use dirsync_core::entities::{Message, Peer};
use dirsync_node::{transport, Node};
use tempfile::TempDir;

fn wait_for(cond: impl Fn() -> bool, max: Duration) -> bool {
    let start = Instant::now();
    while start.elapsed() < max {
        if cond() {
            return true;
        }
        thread::sleep(Duration::from_millis(50));
    }
    cond()
}

fn running_node(id: &str, port: u16) -> (Node, TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let node = Node::new(id, port, dir.path()).unwrap();
    node.start().unwrap();
    (node, dir)
}

#[test]
fn join_then_sync_transfers_a_file() {
    let (node_b, dir_b) = running_node("b", 19102);
    fs::write(dir_b.path().join("report.txt"), b"quarterly numbers").unwrap();

    let (node_a, dir_a) = running_node("a", 19101);

    node_a.join("127.0.0.1", 19102).unwrap();
    assert!(node_a
        .peers()
        .contains(&Peer::new("127.0.0.1", 19102)));
    assert!(
        wait_for(
            || node_b.peers().iter().any(|peer| peer.port == 19101),
            Duration::from_secs(2)
        ),
        "bootstrap never registered the joiner"
    );

    node_a.sync_now();

    let copied = dir_a.path().join("report.txt");
    assert_eq!(fs::read(&copied).unwrap(), b"quarterly numbers");
    assert_eq!(node_a.stats().files_received, 1);
    assert_eq!(
        node_a.stats().bytes_received,
        b"quarterly numbers".len() as u64
    );
    assert!(node_a.stats().sync_passes >= 1);

    node_a.stop();
    node_b.stop();
}

#[test]
fn join_learns_the_bootstrap_peer_list() {
    let (bootstrap, _dir) = running_node("boot", 19112);
    bootstrap.add_peer("127.0.0.1", 19121);
    bootstrap.add_peer("127.0.0.1", 19122);

    let (joiner, _dir2) = running_node("newcomer", 19111);
    let learned = joiner.join("127.0.0.1", 19112).unwrap();
    assert_eq!(learned, 3);

    let peers = joiner.peers();
    assert!(peers.contains(&Peer::new("127.0.0.1", 19112)));
    assert!(peers.contains(&Peer::new("127.0.0.1", 19121)));
    assert!(peers.contains(&Peer::new("127.0.0.1", 19122)));
    // Its own port never shows up, so the joiner did not learn itself.
    assert!(peers.iter().all(|peer| peer.port != 19111));

    joiner.stop();
    bootstrap.stop();
}

#[test]
fn present_files_are_never_refetched_even_on_digest_mismatch() {
    let (node_a, dir_a) = running_node("left", 19131);
    let (node_b, dir_b) = running_node("right", 19132);
    fs::write(dir_a.path().join("shared.txt"), b"left version").unwrap();
    fs::write(dir_b.path().join("shared.txt"), b"right version").unwrap();

    node_a.add_peer("127.0.0.1", 19132);
    node_b.add_peer("127.0.0.1", 19131);

    node_a.sync_now();
    node_b.sync_now();
    node_a.sync_now();

    // Divergence is permanent: presence, not content, drives transfers.
    assert_eq!(fs::read(dir_a.path().join("shared.txt")).unwrap(), b"left version");
    assert_eq!(fs::read(dir_b.path().join("shared.txt")).unwrap(), b"right version");
    assert_eq!(node_a.stats().files_received, 0);
    assert_eq!(node_b.stats().files_received, 0);

    node_a.stop();
    node_b.stop();
}

#[test]
fn removing_a_file_propagates_the_delete() {
    let (node_a, dir_a) = running_node("origin", 19141);
    let (node_b, dir_b) = running_node("mirror", 19142);
    fs::write(dir_a.path().join("doomed.txt"), b"short lived").unwrap();
    fs::write(dir_b.path().join("doomed.txt"), b"short lived").unwrap();

    node_a.add_peer("127.0.0.1", 19142);

    node_a.remove_local_file("doomed.txt").unwrap();
    assert!(!dir_a.path().join("doomed.txt").exists());
    assert!(
        wait_for(
            || !dir_b.path().join("doomed.txt").exists(),
            Duration::from_secs(3)
        ),
        "peer kept the deleted file"
    );

    node_a.stop();
    node_b.stop();
}

#[test]
fn sync_pass_survives_a_dead_peer() {
    let (node_b, dir_b) = running_node("alive", 19152);
    fs::write(dir_b.path().join("payload.bin"), b"\x00\x01\x02").unwrap();

    let (node_a, dir_a) = running_node("fetcher", 19151);
    // Queried first, answers never: the pass must skip it and move on.
    node_a.add_peer("127.0.0.1", 19159);
    node_a.add_peer("127.0.0.1", 19152);

    node_a.sync_now();

    assert_eq!(
        fs::read(dir_a.path().join("payload.bin")).unwrap(),
        b"\x00\x01\x02"
    );

    node_a.stop();
    node_b.stop();
}

#[test]
fn ping_is_answered_with_pong() {
    let (node, _dir) = running_node("echo", 19161);

    let reply = transport::request(
        &Message::Ping {},
        &Peer::new("127.0.0.1", 19161),
        Duration::from_secs(2),
    )
    .unwrap();
    assert_eq!(
        reply,
        Message::Pong {
            node_id: "echo".into()
        }
    );

    node.stop();
}

#[test]
fn get_file_for_an_absent_name_is_silence() {
    let (node, _dir) = running_node("quiet", 19171);

    let result = transport::request(
        &Message::GetFile {
            filename: "missing.txt".into(),
            node_id: "probe".into(),
        },
        &Peer::new("127.0.0.1", 19171),
        Duration::from_millis(300),
    );
    assert!(matches!(
        result,
        Err(dirsync_core::entities::Error::Timeout)
    ));

    node.stop();
}

#[test]
fn list_files_reports_the_current_inventory() {
    let (node, dir) = running_node("librarian", 19181);
    fs::write(dir.path().join("one.txt"), b"1").unwrap();
    fs::write(dir.path().join("two.txt"), b"22").unwrap();

    let reply = transport::request(
        &Message::ListFiles {
            node_id: "probe".into(),
        },
        &Peer::new("127.0.0.1", 19181),
        Duration::from_secs(3),
    )
    .unwrap();

    match reply {
        Message::FileList { node_id, files } => {
            assert_eq!(node_id, "librarian");
            assert_eq!(files.len(), 2);
            assert!(files.contains_key("one.txt"));
            assert!(files.contains_key("two.txt"));
            assert!(files.values().all(|digest| digest.len() == 32));
        }
        other => panic!("expected FILE_LIST, got {:?}", other),
    }

    node.stop();
}

#[test]
fn stop_flips_the_running_flag() {
    let (node, _dir) = running_node("mortal", 19191);
    assert!(node.is_running());
    node.stop();
    assert!(!node.is_running());
}
