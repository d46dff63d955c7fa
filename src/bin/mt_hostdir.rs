// mt_hostdir.rs: filesystem probe run as the entrypoint of host-dir mount test containers.
// Usage: mt-hostdir [--write_new_file=PATH] [--file_mode=PATH] [--file_content=PATH]

use std::io;
use std::process::exit;

use clap::Parser;

use hostdir_mount_tester::config::{ProbeArgs, ProbeConfig};
use hostdir_mount_tester::logging::init_tracing;
use hostdir_mount_tester::probe::Probe;

fn main() {
    init_tracing();

    let config = ProbeConfig::from(ProbeArgs::parse());
    let probe = Probe::new(config);

    let stdout = io::stdout();
    let mut out = stdout.lock();
    let report = probe.run(&mut out);
    drop(out);
    exit(report.exit_code());
}
