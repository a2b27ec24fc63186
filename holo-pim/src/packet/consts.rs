//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//
// Sponsored by NLnet as part of the Next Generation Internet initiative.
// See: https://nlnet.nl/NGI0
//

use num_derive::{FromPrimitive, ToPrimitive};
use serde::{Deserialize, Serialize};

pub const VERSION: u8 = 2;

// PIM message types.
//
// IANA registry:
// https://www.iana.org/assignments/pim-parameters/pim-parameters.xhtml#pim-parameters-1
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
#[derive(FromPrimitive, ToPrimitive)]
#[derive(Deserialize, Serialize)]
pub enum MessageType {
    Hello = 0,
    Register = 1,
    RegisterStop = 2,
    JoinPrune = 3,
    Assert = 5,
}

// Address Family Identifiers used by encoded addresses.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
#[derive(FromPrimitive, ToPrimitive)]
#[derive(Deserialize, Serialize)]
pub enum AddressFamily {
    Ipv4 = 1,
    Ipv6 = 2,
}

pub const ENCODING_TYPE_NATIVE: u8 = 0;

// Encoded-source-address flags (RFC 4601 §4.9.1).
pub const ESA_FLAG_SPARSE: u8 = 0x04;
pub const ESA_FLAG_WC: u8 = 0x02;
pub const ESA_FLAG_RPT: u8 = 0x01;
