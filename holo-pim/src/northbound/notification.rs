//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//
// Sponsored by NLnet as part of the Next Generation Internet initiative.
// See: https://nlnet.nl/NGI0
//

// `ietf-pim` defines no notifications of its own, and none of the
// events this engine tracks (Join/Prune state transitions, Assert
// outcomes, Register-Stop) are promoted to a YANG notification here;
// Hello-driven neighbor loss, which is the usual source of a
// northbound "neighbor down" trap in other `holo` protocols, is out of
// scope for this instance (`spec.md` §1). A protocol-specific
// notification can be added the way `holo-bfd`/`holo-isis` do it, by
// building a [`holo_yang::YangObject`] and calling
// `holo_northbound::notification::send()`, if a use case arises.
