use std::io;
use std::net::{Ipv4Addr, SocketAddr};

use tokio::net::TcpStream;
use tokio::sync::oneshot::{self, error::TryRecvError};

use crate::radio::mode::RadioMode;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RigCommand {
    SetFreq(u64),
    /// Mode and passband in Hz, 0 for the mode's default.
    SetMode(RadioMode, u32),
    SetPtt(bool),
}

impl RigCommand {
    pub fn to_line(&self) -> String {
        match self {
            RigCommand::SetFreq(hz) => format!("\\set_freq {}\n", hz),
            RigCommand::SetMode(mode, passband) => format!("\\set_mode {} {}\n", mode, passband),
            RigCommand::SetPtt(on) => format!("\\set_ptt {}\n", u8::from(*on)),
        }
    }
}

/// Write-only command link to the rig. No responses are read.
pub trait CommandChannel {
    fn send(&mut self, command: RigCommand) -> io::Result<()>;
}

pub trait Connector {
    type Channel: CommandChannel;

    fn connect(&mut self) -> io::Result<Self::Channel>;
}

pub struct RigctlChannel {
    stream: TcpStream,
}

impl CommandChannel for RigctlChannel {
    /// Non-blocking write. A full socket buffer means the daemon stopped
    /// reading and is reported as an error rather than waited on.
    fn send(&mut self, command: RigCommand) -> io::Result<()> {
        let line = command.to_line();
        log::debug!("rigctl <- {}", line.trim_end());
        let written = self.stream.try_write(line.as_bytes())?;
        if written < line.len() {
            return Err(io::Error::new(
                io::ErrorKind::WriteZero,
                "partial rigctl command write",
            ));
        }
        Ok(())
    }
}

/// Connects to a rig control daemon listening on localhost.
///
/// The connect runs as a task on the current runtime; `connect` polls it and
/// returns `WouldBlock` while it is still in flight.
pub struct RigctlConnector {
    port: u16,
    pending: Option<oneshot::Receiver<io::Result<TcpStream>>>,
}

impl RigctlConnector {
    pub fn new(port: u16) -> Self {
        Self {
            port,
            pending: None,
        }
    }

    fn start_connect(&self) -> oneshot::Receiver<io::Result<TcpStream>> {
        let addr = SocketAddr::from((Ipv4Addr::LOCALHOST, self.port));
        let (tx, rx) = oneshot::channel();
        tokio::spawn(async move {
            if tx.send(TcpStream::connect(addr).await).is_err() {
                log::debug!("rigctl connect finished after it was abandoned");
            }
        });
        rx
    }
}

impl Connector for RigctlConnector {
    type Channel = RigctlChannel;

    fn connect(&mut self) -> io::Result<RigctlChannel> {
        let mut pending = match self.pending.take() {
            Some(rx) => rx,
            None => self.start_connect(),
        };
        match pending.try_recv() {
            Ok(result) => {
                let stream = result?;
                stream.set_nodelay(true)?;
                Ok(RigctlChannel { stream })
            }
            Err(TryRecvError::Empty) => {
                self.pending = Some(pending);
                Err(io::ErrorKind::WouldBlock.into())
            }
            Err(TryRecvError::Closed) => Err(io::Error::other("rigctl connect task ended")),
        }
    }
}
