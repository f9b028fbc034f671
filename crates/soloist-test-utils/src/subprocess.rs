// Copyright (c) 2025-2026 Federico Hoerth <memparanoid@gmail.com>
// SPDX-License-Identifier: GPL-3.0-only
// See LICENSE in the repository root for full license text.

use std::io::{BufRead, BufReader, Read, Write};
use std::process::{Child, ChildStdout, Command, Stdio};

/// Environment variable carrying the guard key into child tests.
pub const KEY_ENV: &str = "SOLOIST_TEST_KEY";

/// Line a holder prints once it has done its work and is waiting.
pub const READY_LINE: &str = "soloist-ready";

fn child_command(test_name: &str, key: &str) -> Command {
    let exe = std::env::current_exe().expect("Failed to current_exe()");
    let mut command = Command::new(exe);
    command
        .args([
            "--exact",
            test_name,
            "--ignored",
            "--test-threads=1",
            "--nocapture",
        ])
        .env(KEY_ENV, key);
    command
}

/// Runs an ignored test as a subprocess and returns its exit code.
pub fn run_test_as_subprocess(test_name: &str, key: &str) -> Option<i32> {
    let status = child_command(test_name, key)
        .status()
        .expect("Failed to run subprocess");

    status.code()
}

/// Starts an ignored test that keeps running until [`Holder::finish`].
///
/// Returns once the child has printed [`READY_LINE`].
pub fn spawn_holder(test_name: &str, key: &str) -> Holder {
    spawn_holders(test_name, key, 1)
        .pop()
        .expect("Failed to spawn holder")
}

/// Starts `count` copies of an ignored test at once, then waits until
/// every one of them has printed [`READY_LINE`].
pub fn spawn_holders(test_name: &str, key: &str, count: usize) -> Vec<Holder> {
    let children: Vec<Child> = (0..count)
        .map(|_| {
            child_command(test_name, key)
                .stdin(Stdio::piped())
                .stdout(Stdio::piped())
                .spawn()
                .expect("Failed to spawn subprocess")
        })
        .collect();

    children.into_iter().map(Holder::wait_ready).collect()
}

/// A running child test spawned by [`spawn_holder`].
pub struct Holder {
    child: Child,
    _stdout: BufReader<ChildStdout>,
}

impl Holder {
    fn wait_ready(mut child: Child) -> Self {
        let stdout = child.stdout.take().expect("Failed to take child stdout");
        let mut stdout = BufReader::new(stdout);
        let mut line = String::new();

        loop {
            line.clear();
            let read = stdout
                .read_line(&mut line)
                .expect("Failed to read child stdout");
            assert!(read != 0, "child exited before signalling readiness");
            // libtest may print "test <name> ... " on the same line.
            if line.trim_end().ends_with(READY_LINE) {
                break;
            }
        }

        Self {
            child,
            _stdout: stdout,
        }
    }

    /// Closes the child's stdin and waits for its exit code.
    pub fn finish(mut self) -> Option<i32> {
        drop(self.child.stdin.take());
        let status = self.child.wait().expect("Failed to wait for child");
        status.code()
    }
}

impl Drop for Holder {
    fn drop(&mut self) {
        // Children still running here were never finished, e.g. after a failed assertion.
        if let Ok(None) = self.child.try_wait() {
            let _ = self.child.kill();
            let _ = self.child.wait();
        }
    }
}

/// Reads the key passed by the parent test.
pub fn key_from_env() -> String {
    std::env::var(KEY_ENV).expect("Failed to read SOLOIST_TEST_KEY")
}

/// Tells the parent that the child is ready.
pub fn signal_ready() {
    let mut stdout = std::io::stdout();
    writeln!(stdout, "{READY_LINE}").expect("Failed to write ready line");
    stdout.flush().expect("Failed to flush stdout");
}

/// Blocks until the parent closes stdin.
pub fn wait_for_parent() {
    let mut sink = Vec::new();
    let _ = std::io::stdin().read_to_end(&mut sink);
}
