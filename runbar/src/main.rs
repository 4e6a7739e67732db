//! Run long functions in the background behind a predicted-time progress window.
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

use runbar_lib::{Host, run};
use std::io::{BufRead, Write};
use std::io::{stderr, stdin, stdout};
use std::thread;
use tokio::sync::mpsc::{self, UnboundedReceiver};

/// Default host that talks to the real terminal.
///
/// Standard input is read line by line on a dedicated thread, so waiting for a command
/// never stalls the progress windows.
#[derive(Debug, Default)]
pub struct RealHost {
    lines: Option<UnboundedReceiver<String>>,
}

impl RealHost {
    fn lines(&mut self) -> &mut UnboundedReceiver<String> {
        self.lines.get_or_insert_with(spawn_stdin_reader)
    }
}

fn spawn_stdin_reader() -> UnboundedReceiver<String> {
    let (tx, rx) = mpsc::unbounded_channel();
    let _ = thread::spawn(move || {
        for line in stdin().lock().lines() {
            let Ok(line) = line else { break };
            if tx.send(line).is_err() {
                break;
            }
        }
    });
    rx
}

#[cfg_attr(coverage_nightly, coverage(off))]
impl Host for RealHost {
    fn output(&mut self) -> impl Write {
        stdout()
    }

    fn error(&mut self) -> impl Write {
        stderr()
    }

    async fn next_command(&mut self) -> Option<String> {
        self.lines().recv().await
    }

    async fn wait_for_dismissal(&mut self) {
        let _ = self.lines().recv().await;
    }
}

#[tokio::main]
#[cfg_attr(coverage_nightly, coverage(off))]
async fn main() -> Result<(), ohno::AppError> {
    run(&mut RealHost::default(), std::env::args()).await
}
