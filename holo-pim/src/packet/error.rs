//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//
// Sponsored by NLnet as part of the Next Generation Internet initiative.
// See: https://nlnet.nl/NGI0
//

use serde::{Deserialize, Serialize};

// Type aliases.
pub type DecodeResult<T> = Result<T, DecodeError>;

// PIM message decoding errors.
#[derive(Debug)]
#[derive(Deserialize, Serialize)]
pub enum DecodeError {
    ReadOutOfBounds,
    InvalidVersion(u8),
    UnknownMessageType(u8),
    InvalidChecksum,
    InvalidAddressFamily(u8),
    InvalidEncodingType(u8),
    InvalidHoldtime(u16),
    InvalidMaskLen(u8),
    TruncatedGroupList,
}

// ===== impl DecodeError =====

impl std::fmt::Display for DecodeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DecodeError::ReadOutOfBounds => {
                write!(f, "attempted to read out of bounds")
            }
            DecodeError::InvalidVersion(version) => {
                write!(f, "invalid version: {version}")
            }
            DecodeError::UnknownMessageType(msg_type) => {
                write!(f, "unknown message type: {msg_type}")
            }
            DecodeError::InvalidChecksum => {
                write!(f, "invalid checksum")
            }
            DecodeError::InvalidAddressFamily(family) => {
                write!(f, "invalid address family: {family}")
            }
            DecodeError::InvalidEncodingType(enc_type) => {
                write!(f, "invalid encoding type: {enc_type}")
            }
            DecodeError::InvalidHoldtime(holdtime) => {
                write!(f, "invalid holdtime: {holdtime}")
            }
            DecodeError::InvalidMaskLen(mask_len) => {
                write!(f, "invalid mask length: {mask_len}")
            }
            DecodeError::TruncatedGroupList => {
                write!(f, "truncated group list")
            }
        }
    }
}

impl std::error::Error for DecodeError {}

impl From<bytes::TryGetError> for DecodeError {
    fn from(_error: bytes::TryGetError) -> DecodeError {
        DecodeError::ReadOutOfBounds
    }
}
