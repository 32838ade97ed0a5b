//! Opening written images in the platform viewer.

use std::path::Path;
use std::process::{Command, Stdio};

use crate::verbose::vprintln;

fn viewer_command(path: &Path) -> Command {
    if cfg!(target_os = "macos") {
        let mut cmd = Command::new("open");
        cmd.arg(path);
        cmd
    } else if cfg!(windows) {
        let mut cmd = Command::new("cmd");
        cmd.args(["/C", "start", ""]).arg(path);
        cmd
    } else {
        let mut cmd = Command::new("xdg-open");
        cmd.arg(path);
        cmd
    }
}

/// Launch the viewer for `path` without waiting for it.
///
/// A missing or failing viewer only produces a warning; the image is
/// already on disk.
pub fn show(path: &Path) {
    let mut cmd = viewer_command(path);
    cmd.stdin(Stdio::null()).stdout(Stdio::null()).stderr(Stdio::null());
    match cmd.spawn() {
        Ok(_) => vprintln!("  Opened {} in viewer", path.display()),
        Err(e) => eprintln!("warning: could not open {}: {e}", path.display()),
    }
}
