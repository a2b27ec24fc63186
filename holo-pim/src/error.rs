//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//
// Sponsored by NLnet as part of the Next Generation Internet initiative.
// See: https://nlnet.nl/NGI0
//

use tracing::{debug, warn};

use crate::addr::PimAddr;
use crate::interface::Vid;

// PIM errors.
#[derive(Debug)]
pub enum Error {
    // I/O errors
    IoError(IoError),
    // Packet input
    MalformedMessage(Vid, String),
    UnknownSelectorTarget(PimAddr, PimAddr),
    // State-machine degradation
    MissingRpfNeighbor(PimAddr, PimAddr),
    MissingRp(PimAddr),
    // Internal
    InvariantViolation(&'static str),
}

// PIM I/O errors.
#[derive(Debug)]
pub enum IoError {
    SocketError(std::io::Error),
    MulticastJoinError(std::io::Error),
    RecvError(std::io::Error),
    SendError(std::io::Error),
    IbusSendError(String),
}

// ===== impl Error =====

impl Error {
    pub(crate) fn log(&self) {
        match self {
            Error::IoError(error) => {
                error.log();
            }
            Error::MalformedMessage(vif, reason) => {
                warn!(?vif, %reason, "{}", self);
            }
            Error::UnknownSelectorTarget(source, group) => {
                warn!(%source, %group, "{}", self);
            }
            Error::MissingRpfNeighbor(source, group) => {
                warn!(%source, %group, "{}", self);
            }
            Error::MissingRp(group) => {
                warn!(%group, "{}", self);
            }
            Error::InvariantViolation(where_) => {
                // Debug builds panic in the caller before this is ever
                // reached; release builds just log and drop the
                // action (`spec.md` §7).
                debug!(%where_, "{}", self);
            }
        }
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::IoError(error) => error.fmt(f),
            Error::MalformedMessage(..) => {
                write!(f, "malformed PIM message")
            }
            Error::UnknownSelectorTarget(..) => {
                write!(f, "Register-Stop names unknown (S,G)")
            }
            Error::MissingRpfNeighbor(..) => {
                write!(f, "no RPF neighbor found for entry")
            }
            Error::MissingRp(..) => {
                write!(f, "no RP configured for group")
            }
            Error::InvariantViolation(..) => {
                write!(f, "internal invariant violation")
            }
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::IoError(error) => Some(error),
            _ => None,
        }
    }
}

impl From<IoError> for Error {
    fn from(error: IoError) -> Error {
        Error::IoError(error)
    }
}

// ===== impl IoError =====

impl IoError {
    pub(crate) fn log(&self) {
        match self {
            IoError::SocketError(error) => {
                warn!(%error, "{}", self);
            }
            IoError::MulticastJoinError(error) => {
                warn!(%error, "{}", self);
            }
            IoError::RecvError(error) | IoError::SendError(error) => {
                warn!(%error, "{}", self);
            }
            IoError::IbusSendError(reason) => {
                warn!(%reason, "{}", self);
            }
        }
    }
}

impl std::fmt::Display for IoError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IoError::SocketError(..) => write!(f, "failed to create raw socket"),
            IoError::MulticastJoinError(..) => {
                write!(f, "failed to join the all-PIM-routers multicast group")
            }
            IoError::RecvError(..) => write!(f, "failed to receive packet"),
            IoError::SendError(..) => write!(f, "failed to send packet"),
            IoError::IbusSendError(..) => write!(f, "failed to send ibus message"),
        }
    }
}

impl std::error::Error for IoError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            IoError::SocketError(error)
            | IoError::MulticastJoinError(error)
            | IoError::RecvError(error)
            | IoError::SendError(error) => Some(error),
            IoError::IbusSendError(..) => None,
        }
    }
}
