use std::io::Read;
use std::process::ChildStderr;
use std::thread::{self, JoinHandle};

/// Collects a child's stderr on a helper thread
///
/// The pipe is read continuously so a chatty child can never block on a full
/// stderr buffer while we are reading its stdout or waiting for it to exit.
pub(crate) struct StderrDrain {
    handle: Option<JoinHandle<String>>,
}

impl StderrDrain {
    pub(crate) fn spawn(stderr: Option<ChildStderr>) -> Self {
        let handle = stderr.map(|mut pipe| {
            thread::spawn(move || {
                let mut buf = Vec::new();
                let _ = pipe.read_to_end(&mut buf);
                String::from_utf8_lossy(&buf).trim().to_string()
            })
        });
        Self { handle }
    }

    /// Everything the child wrote; call after the child has exited
    pub(crate) fn collect(&mut self) -> String {
        self.handle
            .take()
            .and_then(|handle| handle.join().ok())
            .unwrap_or_default()
    }
}
