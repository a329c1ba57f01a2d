//! Stand-in engine used by the integration tests
//!
//! Reads commands from stdin, one per line:
//!
//! - `PING` prints `PONG`
//! - `ERR <text>` prints `<text>` to stderr
//! - `ECHO <text>` prints `<text>`
//! - `CWD` prints the working directory
//! - `HANG` makes the engine ignore `EXIT` and end of input
//! - `CRASH` exits with code 3
//! - `DEAF` closes stdin, prints `deaf`, then idles for three seconds
//! - `EXIT` exits with code 0
//!
//! Anything else is echoed back as `ok: <line>`.

use std::io::{self, BufRead, Write};
use std::process;
use std::thread;
use std::time::Duration;

fn main() {
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    let mut hanging = false;

    let _ = writeln!(stdout, "mock engine ready");

    for line in stdin.lock().lines() {
        let Ok(line) = line else { break };
        let command = line.trim_end();

        match command.split_once(' ') {
            Some(("ERR", text)) => {
                eprintln!("{text}");
                continue;
            }
            Some(("ECHO", text)) => {
                let _ = writeln!(stdout, "{text}");
                continue;
            }
            _ => {}
        }

        match command {
            "PING" => {
                let _ = writeln!(stdout, "PONG");
            }
            "CWD" => match std::env::current_dir() {
                Ok(dir) => {
                    let _ = writeln!(stdout, "{}", dir.display());
                }
                Err(e) => eprintln!("cwd unavailable: {e}"),
            },
            "HANG" => {
                hanging = true;
                let _ = writeln!(stdout, "hanging");
            }
            "CRASH" => process::exit(3),
            "DEAF" => {
                close_stdin();
                let _ = writeln!(stdout, "deaf");
                let _ = stdout.flush();
                thread::sleep(Duration::from_secs(3));
                process::exit(0);
            }
            "EXIT" if !hanging => {
                let _ = writeln!(stdout, "bye");
                process::exit(0);
            }
            "EXIT" => {}
            other => {
                let _ = writeln!(stdout, "ok: {other}");
            }
        }
        let _ = stdout.flush();
    }

    while hanging {
        thread::sleep(Duration::from_secs(60));
    }
}

/// Close fd 0 so later writes from the console fail
#[cfg(unix)]
fn close_stdin() {
    use std::os::fd::{FromRawFd, OwnedFd};
    // SAFETY: fd 0 is never read again; the caller only sleeps and exits.
    drop(unsafe { OwnedFd::from_raw_fd(0) });
}

#[cfg(not(unix))]
fn close_stdin() {}
