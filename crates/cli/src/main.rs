use std::io;

use dirsync_cli::*;

fn main() -> io::Result<()> {
    let matches = create_command().get_matches();

    let node = build_node(&matches)?;
    node.start()?;

    run_shell(&node)
}
