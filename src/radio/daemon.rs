use std::io;
use std::process::{Child, Command as StdCommand, Stdio};

/// Lifecycle of the external rig control process.
pub trait Daemon {
    fn is_running(&mut self) -> bool;
    fn start(&mut self) -> io::Result<()>;
    fn stop(&mut self);
}

/// Runs the daemon as a child process, e.g. `rigctld -m120 -r/dev/ttyUSB0 -s38400`.
pub struct ProcessDaemon {
    cmd: String,
    child: Option<Child>,
}

impl ProcessDaemon {
    pub fn new(cmd: &str) -> Self {
        Self {
            cmd: cmd.to_string(),
            child: None,
        }
    }
}

impl Daemon for ProcessDaemon {
    fn is_running(&mut self) -> bool {
        let Some(child) = &mut self.child else {
            return false;
        };

        match child.try_wait() {
            Ok(None) => true,
            Ok(Some(status)) => {
                log::warn!("{} exited with {}", self.cmd, status);
                self.child = None;
                false
            }
            Err(e) => {
                log::error!("{} wait error: {}", self.cmd, e);
                false
            }
        }
    }

    fn start(&mut self) -> io::Result<()> {
        if self.is_running() {
            return Ok(());
        }

        let mut parts = self.cmd.split_whitespace();
        let program = parts.next().ok_or_else(|| {
            io::Error::new(io::ErrorKind::InvalidInput, "empty daemon command")
        })?;

        log::info!("Starting daemon: {}", self.cmd);
        let child = StdCommand::new(program)
            .args(parts)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()?;
        log::info!("Daemon spawned (PID: {})", child.id());

        self.child = Some(child);
        Ok(())
    }

    fn stop(&mut self) {
        if let Some(mut child) = self.child.take() {
            log::info!("Stopping daemon (PID: {})", child.id());
            let _ = child.kill();
            let _ = child.wait();
        }
    }
}

impl Drop for ProcessDaemon {
    fn drop(&mut self) {
        self.stop();
    }
}
