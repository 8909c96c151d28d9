use std::path::PathBuf;
use std::time::{Duration, Instant};

use serde::Serialize;

use crate::catalog::TransponderMode;
use crate::radio::channel::{CommandChannel, Connector, RigCommand};
use crate::radio::daemon::Daemon;
use crate::radio::error::RadioError;
use crate::radio::mode::{radio_mode, LinkDirection, RadioMode};
use crate::tracker::FrequencyState;

pub const DEFAULT_SETTLE: Duration = Duration::from_millis(200);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, strum_macros::Display)]
pub enum RadioLinkState {
    Disabled,
    Starting,
    Connected,
    Disconnected,
}

#[derive(Debug)]
struct PendingRestore {
    at: Instant,
    frequency: u64,
    mode: RadioMode,
}

/// Keeps the transceiver on the corrected frequencies through the rig control daemon.
///
/// All commands are fire-and-forget. A failed write is treated like the
/// daemon going away: the channel is dropped and the link is `Disconnected`.
pub struct RadioController<D: Daemon, C: Connector> {
    device: PathBuf,
    settle: Duration,
    daemon: D,
    connector: C,
    channel: Option<C::Channel>,
    state: RadioLinkState,
    transmitting: bool,
    restore: Option<PendingRestore>,
    status: String,
}

impl<D: Daemon, C: Connector> RadioController<D, C> {
    pub fn new(device: PathBuf, settle: Duration, daemon: D, connector: C) -> Self {
        Self {
            device,
            settle,
            daemon,
            connector,
            channel: None,
            state: RadioLinkState::Disabled,
            transmitting: false,
            restore: None,
            status: "CAT off".to_string(),
        }
    }

    pub fn state(&self) -> RadioLinkState {
        self.state
    }

    pub fn is_transmitting(&self) -> bool {
        self.transmitting
    }

    /// One-line status for the display.
    pub fn status(&self) -> &str {
        &self.status
    }

    /// Start the daemon and connect. Without the radio device this is a no-op.
    pub fn enable(&mut self) -> Result<(), RadioError> {
        if !matches!(
            self.state,
            RadioLinkState::Disabled | RadioLinkState::Disconnected
        ) {
            return Ok(());
        }

        if !self.device.exists() {
            log::info!("Radio device {} not present", self.device.display());
            self.state = RadioLinkState::Disabled;
            self.status = format!("no radio at {}", self.device.display());
            return Ok(());
        }

        if let Err(e) = self.daemon.start() {
            log::error!("Failed to start rig control daemon: {}", e);
            self.state = RadioLinkState::Disabled;
            self.status = format!("daemon failed: {}", e);
            return Err(e.into());
        }

        log::info!("Rig control daemon starting");
        self.state = RadioLinkState::Starting;
        self.status = "CAT starting".to_string();
        self.try_connect();
        Ok(())
    }

    /// Safe in any state. Unkeys and closes the channel before stopping the daemon.
    pub fn disable(&mut self) {
        if self.state != RadioLinkState::Disabled {
            log::info!("CAT disabled");
        }
        self.unkey();
        self.channel = None;
        self.daemon.stop();
        self.transmitting = false;
        self.restore = None;
        self.state = RadioLinkState::Disabled;
        self.status = "CAT off".to_string();
    }

    /// Per-tick health check. Also finishes a connect in progress and a pending
    /// downlink restore whose settle time has passed.
    pub fn poll(&mut self, now: Instant) -> Result<(), RadioError> {
        if !matches!(
            self.state,
            RadioLinkState::Starting | RadioLinkState::Connected
        ) {
            return Ok(());
        }

        if !self.daemon.is_running() {
            let err = RadioError::DaemonLost;
            self.lose(&err);
            return Err(err);
        }
        if !self.device.exists() {
            let err = RadioError::DeviceUnavailable(self.device.display().to_string());
            self.lose(&err);
            return Err(err);
        }

        if self.state == RadioLinkState::Starting {
            self.try_connect();
        }
        self.finish_restore(now);
        Ok(())
    }

    /// Push the current frequencies to the rig. Never sends downlink commands while transmitting.
    pub fn sync(
        &mut self,
        frequencies: &FrequencyState,
        mode: Option<TransponderMode>,
        transmitting: bool,
        now: Instant,
    ) {
        if self.state != RadioLinkState::Connected {
            return;
        }

        if transmitting {
            self.restore = None;
            if let (Some(up), Some(mode)) = (frequencies.uplink_corrected, mode) {
                if !self.send_pair(up, radio_mode(mode, LinkDirection::Uplink)) {
                    return;
                }
            }
            self.send(RigCommand::SetPtt(true));
            return;
        }

        if self.restore.is_some() {
            self.finish_restore(now);
            return;
        }

        if let (Some(down), Some(mode)) = (frequencies.downlink_corrected, mode) {
            if !self.send_pair(down, radio_mode(mode, LinkDirection::Downlink)) {
                return;
            }
        }
        self.send(RigCommand::SetPtt(false));
    }

    /// Key or unkey the transmitter. The downlink is restored `settle` after unkeying.
    pub fn set_ptt(
        &mut self,
        enabled: bool,
        frequencies: &FrequencyState,
        mode: Option<TransponderMode>,
        now: Instant,
    ) {
        if self.state != RadioLinkState::Connected {
            return;
        }

        if !enabled {
            // Unkeying must not depend on the transponder still having an uplink.
            self.transmitting = false;
            self.restore = None;
            if self.send(RigCommand::SetPtt(false)) {
                log::info!("PTT off");
                if let (Some(down), Some(mode)) = (frequencies.downlink_corrected, mode) {
                    self.restore = Some(PendingRestore {
                        at: now + self.settle,
                        frequency: down,
                        mode: radio_mode(mode, LinkDirection::Downlink),
                    });
                }
            }
            return;
        }

        let (Some(up), Some(mode)) = (frequencies.uplink_corrected, mode) else {
            log::debug!("No uplink, ignoring PTT");
            return;
        };
        self.restore = None;
        if self.send_pair(up, radio_mode(mode, LinkDirection::Uplink))
            && self.send(RigCommand::SetPtt(true))
        {
            log::info!("PTT on");
            self.transmitting = true;
        }
    }

    fn try_connect(&mut self) {
        match self.connector.connect() {
            Ok(channel) => {
                log::info!("CAT connected");
                self.channel = Some(channel);
                self.state = RadioLinkState::Connected;
                self.status = "CAT on".to_string();
            }
            Err(e) => log::debug!("Rig control daemon not ready: {}", e),
        }
    }

    fn finish_restore(&mut self, now: Instant) {
        let due = self.restore.as_ref().map(|r| now >= r.at).unwrap_or(false);
        if !due {
            return;
        }
        if let Some(restore) = self.restore.take() {
            self.send_pair(restore.frequency, restore.mode);
        }
    }

    fn send_pair(&mut self, frequency: u64, mode: RadioMode) -> bool {
        self.send(RigCommand::SetFreq(frequency)) && self.send(RigCommand::SetMode(mode, 0))
    }

    fn send(&mut self, command: RigCommand) -> bool {
        let Some(channel) = self.channel.as_mut() else {
            return false;
        };
        match channel.send(command) {
            Ok(()) => true,
            Err(e) => {
                log::warn!("Rig command {:?} failed: {}", command, e);
                self.lose(&RadioError::DaemonLost);
                false
            }
        }
    }

    /// Best effort PTT off on the open channel, without treating a failure as a loss.
    fn unkey(&mut self) {
        if !self.transmitting {
            return;
        }
        self.transmitting = false;
        if let Some(channel) = self.channel.as_mut() {
            if let Err(e) = channel.send(RigCommand::SetPtt(false)) {
                log::debug!("PTT off on close failed: {}", e);
            }
        }
    }

    fn lose(&mut self, reason: &RadioError) {
        log::warn!("CAT lost: {}", reason);
        self.unkey();
        self.channel = None;
        self.daemon.stop();
        self.transmitting = false;
        self.restore = None;
        self.state = RadioLinkState::Disconnected;
        self.status = reason.to_string();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::{Cell, RefCell};
    use std::io;
    use std::rc::Rc;

    #[derive(Clone, Default)]
    struct Shared {
        log: Rc<RefCell<Vec<RigCommand>>>,
        ready: Rc<Cell<bool>>,
        broken: Rc<Cell<bool>>,
        running: Rc<Cell<bool>>,
        starts: Rc<Cell<u32>>,
    }

    struct FakeChannel(Shared);

    impl CommandChannel for FakeChannel {
        fn send(&mut self, command: RigCommand) -> io::Result<()> {
            if self.0.broken.get() {
                return Err(io::Error::new(io::ErrorKind::BrokenPipe, "gone"));
            }
            self.0.log.borrow_mut().push(command);
            Ok(())
        }
    }

    struct FakeConnector(Shared);

    impl Connector for FakeConnector {
        type Channel = FakeChannel;

        fn connect(&mut self) -> io::Result<FakeChannel> {
            if self.0.ready.get() {
                Ok(FakeChannel(self.0.clone()))
            } else {
                Err(io::Error::new(io::ErrorKind::ConnectionRefused, "not yet"))
            }
        }
    }

    struct FakeDaemon(Shared);

    impl Daemon for FakeDaemon {
        fn is_running(&mut self) -> bool {
            self.0.running.get()
        }

        fn start(&mut self) -> io::Result<()> {
            self.0.starts.set(self.0.starts.get() + 1);
            self.0.running.set(true);
            Ok(())
        }

        fn stop(&mut self) {
            self.0.running.set(false);
        }
    }

    type Controller = RadioController<FakeDaemon, FakeConnector>;

    fn controller(device: PathBuf) -> (Controller, Shared) {
        let shared = Shared::default();
        shared.ready.set(true);
        let controller = RadioController::new(
            device,
            DEFAULT_SETTLE,
            FakeDaemon(shared.clone()),
            FakeConnector(shared.clone()),
        );
        (controller, shared)
    }

    fn connected() -> (Controller, Shared) {
        let (mut controller, shared) = controller(std::env::temp_dir());
        controller.enable().unwrap();
        assert_eq!(controller.state(), RadioLinkState::Connected);
        (controller, shared)
    }

    fn frequencies(uplink: Option<u64>) -> FrequencyState {
        FrequencyState {
            uplink_base: uplink,
            downlink_base: Some(145_960_000),
            uplink_corrected: uplink,
            downlink_corrected: Some(145_960_000),
            nudge_offset_hz: 0,
        }
    }

    #[test]
    fn test_enable_without_device_stays_disabled() {
        let (mut controller, shared) = controller(PathBuf::from("/dev/sat-o-track-missing"));
        controller.enable().unwrap();
        controller.sync(
            &frequencies(Some(435_120_000)),
            Some(TransponderMode::Linear),
            false,
            Instant::now(),
        );
        assert_eq!(controller.state(), RadioLinkState::Disabled);
        assert_eq!(shared.starts.get(), 0);
        assert!(shared.log.borrow().is_empty());
    }

    #[test]
    fn test_enable_waits_for_daemon() {
        let (mut controller, shared) = controller(std::env::temp_dir());
        shared.ready.set(false);
        controller.enable().unwrap();
        assert_eq!(controller.state(), RadioLinkState::Starting);

        shared.ready.set(true);
        controller.poll(Instant::now()).unwrap();
        assert_eq!(controller.state(), RadioLinkState::Connected);
        assert_eq!(controller.status(), "CAT on");
    }

    #[test]
    fn test_ptt_sequence() {
        let (mut controller, shared) = connected();
        let freqs = frequencies(Some(435_120_000));
        let t0 = Instant::now();

        controller.set_ptt(true, &freqs, Some(TransponderMode::Linear), t0);
        assert!(controller.is_transmitting());
        controller.set_ptt(false, &freqs, Some(TransponderMode::Linear), t0);
        assert!(!controller.is_transmitting());

        // Nothing before the settle time has passed.
        controller.poll(t0 + Duration::from_millis(100)).unwrap();
        assert_eq!(shared.log.borrow().len(), 4);

        controller.poll(t0 + DEFAULT_SETTLE).unwrap();
        assert_eq!(
            shared.log.borrow().as_slice(),
            [
                RigCommand::SetFreq(435_120_000),
                RigCommand::SetMode(RadioMode::Lsb, 0),
                RigCommand::SetPtt(true),
                RigCommand::SetPtt(false),
                RigCommand::SetFreq(145_960_000),
                RigCommand::SetMode(RadioMode::Usb, 0),
            ]
        );
    }

    #[test]
    fn test_sync_while_transmitting_sends_no_downlink() {
        let (mut controller, shared) = connected();
        let freqs = frequencies(Some(145_990_000));
        controller.sync(&freqs, Some(TransponderMode::Fm), true, Instant::now());
        assert_eq!(
            shared.log.borrow().as_slice(),
            [
                RigCommand::SetFreq(145_990_000),
                RigCommand::SetMode(RadioMode::Fm, 0),
                RigCommand::SetPtt(true),
            ]
        );
    }

    #[test]
    fn test_sync_receiving_sends_downlink() {
        let (mut controller, shared) = connected();
        controller.sync(
            &frequencies(None),
            Some(TransponderMode::Digi),
            false,
            Instant::now(),
        );
        assert_eq!(
            shared.log.borrow().as_slice(),
            [
                RigCommand::SetFreq(145_960_000),
                RigCommand::SetMode(RadioMode::Usb, 0),
                RigCommand::SetPtt(false),
            ]
        );
    }

    #[test]
    fn test_sync_holds_off_during_settle() {
        let (mut controller, shared) = connected();
        let freqs = frequencies(Some(435_120_000));
        let t0 = Instant::now();
        controller.set_ptt(true, &freqs, Some(TransponderMode::Linear), t0);
        controller.set_ptt(false, &freqs, Some(TransponderMode::Linear), t0);
        controller.sync(&freqs, Some(TransponderMode::Linear), false, t0);
        assert_eq!(shared.log.borrow().len(), 4);
    }

    #[test]
    fn test_ptt_without_uplink_is_ignored() {
        let (mut controller, shared) = connected();
        controller.set_ptt(true, &frequencies(None), Some(TransponderMode::Cw), Instant::now());
        assert!(!controller.is_transmitting());
        assert!(shared.log.borrow().is_empty());
    }

    #[test]
    fn test_ptt_off_after_uplink_disappears() {
        let (mut controller, shared) = connected();
        let t0 = Instant::now();
        controller.set_ptt(true, &frequencies(Some(145_990_000)), Some(TransponderMode::Fm), t0);
        assert!(controller.is_transmitting());

        // Operator switched to a beacon-only transponder while keyed.
        let beacon = frequencies(None);
        controller.set_ptt(false, &beacon, Some(TransponderMode::Cw), t0);
        assert!(!controller.is_transmitting());

        controller.sync(&beacon, Some(TransponderMode::Cw), controller.is_transmitting(), t0);
        assert_eq!(shared.log.borrow()[3..], [RigCommand::SetPtt(false)]);

        controller.poll(t0 + DEFAULT_SETTLE).unwrap();
        assert_eq!(
            shared.log.borrow()[4..],
            [
                RigCommand::SetFreq(145_960_000),
                RigCommand::SetMode(RadioMode::Cw, 0),
            ]
        );
    }

    #[test]
    fn test_ptt_off_without_transponder_skips_restore() {
        let (mut controller, shared) = connected();
        let t0 = Instant::now();
        controller.set_ptt(true, &frequencies(Some(145_990_000)), Some(TransponderMode::Fm), t0);
        controller.set_ptt(false, &FrequencyState::default(), None, t0);
        assert!(!controller.is_transmitting());

        controller.poll(t0 + DEFAULT_SETTLE).unwrap();
        assert_eq!(shared.log.borrow().last(), Some(&RigCommand::SetPtt(false)));
        assert_eq!(shared.log.borrow().len(), 4);
    }

    #[test]
    fn test_no_transponder_sends_only_ptt_off() {
        let (mut controller, shared) = connected();
        controller.sync(&FrequencyState::default(), None, false, Instant::now());
        assert_eq!(shared.log.borrow().as_slice(), [RigCommand::SetPtt(false)]);
    }

    #[test]
    fn test_daemon_death_disconnects() {
        let (mut controller, shared) = connected();
        shared.running.set(false);
        let err = controller.poll(Instant::now()).unwrap_err();
        assert_eq!(err.kind(), "DaemonLost");
        assert_eq!(controller.state(), RadioLinkState::Disconnected);
        assert_eq!(controller.status(), "rig control daemon lost");

        controller.sync(
            &frequencies(None),
            Some(TransponderMode::Fm),
            false,
            Instant::now(),
        );
        assert!(shared.log.borrow().is_empty());

        controller.enable().unwrap();
        assert_eq!(controller.state(), RadioLinkState::Connected);
        assert_eq!(shared.starts.get(), 2);
    }

    #[test]
    fn test_missing_device_disconnects() {
        let (mut controller, shared) = controller(PathBuf::from("/dev/sat-o-track-missing"));
        // Force the connected state as if the device had vanished after enabling.
        controller.daemon.start().unwrap();
        controller.try_connect();
        assert_eq!(controller.state(), RadioLinkState::Connected);

        let err = controller.poll(Instant::now()).unwrap_err();
        assert_eq!(err.kind(), "DeviceUnavailable");
        assert!(!shared.running.get());
        assert_eq!(controller.state(), RadioLinkState::Disconnected);
    }

    #[test]
    fn test_device_loss_while_keyed_unkeys() {
        let (mut controller, shared) = connected();
        controller.set_ptt(
            true,
            &frequencies(Some(145_990_000)),
            Some(TransponderMode::Fm),
            Instant::now(),
        );
        shared.running.set(false);
        assert!(controller.poll(Instant::now()).is_err());
        assert!(!controller.is_transmitting());
        assert_eq!(shared.log.borrow().last(), Some(&RigCommand::SetPtt(false)));
    }

    #[test]
    fn test_disable_when_idle_writes_nothing() {
        let (mut controller, shared) = connected();
        controller.disable();
        assert!(shared.log.borrow().is_empty());
    }

    #[test]
    fn test_write_failure_disconnects() {
        let (mut controller, shared) = connected();
        shared.broken.set(true);
        controller.sync(
            &frequencies(None),
            Some(TransponderMode::Fm),
            false,
            Instant::now(),
        );
        assert_eq!(controller.state(), RadioLinkState::Disconnected);
        assert!(!shared.running.get());
    }

    #[test]
    fn test_disable_stops_everything() {
        let (mut controller, shared) = connected();
        controller.set_ptt(
            true,
            &frequencies(Some(435_120_000)),
            Some(TransponderMode::Linear),
            Instant::now(),
        );
        controller.disable();
        assert_eq!(controller.state(), RadioLinkState::Disabled);
        assert!(!controller.is_transmitting());
        assert!(!shared.running.get());
        assert_eq!(shared.log.borrow().last(), Some(&RigCommand::SetPtt(false)));

        let writes = shared.log.borrow().len();
        controller.sync(
            &frequencies(None),
            Some(TransponderMode::Fm),
            false,
            Instant::now(),
        );
        assert_eq!(shared.log.borrow().len(), writes);
    }
}
