use crate::catalog::TransponderMode;

/// Operating modes understood by the rig control daemon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
#[strum(serialize_all = "UPPERCASE")]
pub enum RadioMode {
    Usb,
    Lsb,
    Cw,
    Cwr,
    Rtty,
    Rttyr,
    Am,
    Fm,
    Wfm,
    Ams,
    Pktlsb,
    Pktusb,
    Pktfm,
    Ecssusb,
    Ecsslsb,
    Fax,
    Sam,
    Sal,
    Sah,
    Dsb,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkDirection {
    Uplink,
    Downlink,
}

pub fn radio_mode(mode: TransponderMode, direction: LinkDirection) -> RadioMode {
    match (mode, direction) {
        (TransponderMode::Linear, LinkDirection::Uplink) => RadioMode::Lsb,
        (TransponderMode::Linear, LinkDirection::Downlink) => RadioMode::Usb,
        (TransponderMode::Fm, _) => RadioMode::Fm,
        (TransponderMode::Cw, _) => RadioMode::Cw,
        (TransponderMode::Digi, _) => RadioMode::Usb,
    }
}
