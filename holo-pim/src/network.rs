//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//
// Sponsored by NLnet as part of the Next Generation Internet initiative.
// See: https://nlnet.nl/NGI0
//

//! Raw IP-protocol-103 socket ownership and the per-interface Tx/Rx
//! loops, grounded on `holo-ospf::network`'s raw-socket model but
//! collapsed to one family-agnostic implementation since `PimAddr`
//! already carries its own family (no `NetworkVersion<V>` split).

use std::io::{IoSlice, IoSliceMut};
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use std::ops::Deref;
use std::os::fd::AsRawFd;
use std::str::FromStr;
use std::sync::Arc;
use std::sync::LazyLock as Lazy;

use bytes::{Buf, Bytes, BytesMut};
use holo_utils::capabilities;
use holo_utils::ip::AddressFamily;
use holo_utils::socket::{AsyncFd, Socket};
use nix::sys::socket::{self, SockaddrIn, SockaddrIn6};
use tokio::sync::mpsc::error::SendError;
use tokio::sync::mpsc::{Sender, UnboundedReceiver};

use crate::addr::PimAddr;
use crate::collections::InterfaceId;
use crate::error::{Error, IoError};
use crate::instance::{InstanceArenas, InstanceUpView};
use crate::interface::Vid;
use crate::jp::{JpEntryType, JpGroup as AssembledJpGroup};
use crate::packet;
use crate::packet::consts::{ESA_FLAG_RPT, ESA_FLAG_SPARSE, ESA_FLAG_WC};
use crate::packet::jp::{JoinPrune, JpGroup as WireJpGroup};
use crate::packet::{EncodedGroupAddr, EncodedSourceAddr, EncodedUnicastAddr};
use crate::tasks::messages::input::NetRxPacketMsg;
use crate::tasks::messages::output::NetTxPacketMsg;

/// PIM's IANA-assigned IP protocol number (RFC 4601 §4.9).
pub const PIM_IP_PROTO: i32 = 103;

static ALL_PIM_ROUTERS_V4: Lazy<Ipv4Addr> =
    Lazy::new(|| Ipv4Addr::from_str("224.0.0.13").unwrap());
static ALL_PIM_ROUTERS_V6: Lazy<Ipv6Addr> =
    Lazy::new(|| Ipv6Addr::from_str("ff02::d").unwrap());

pub fn all_pim_routers(af: AddressFamily) -> IpAddr {
    match af {
        AddressFamily::Ipv4 => IpAddr::V4(*ALL_PIM_ROUTERS_V4),
        AddressFamily::Ipv6 => IpAddr::V6(*ALL_PIM_ROUTERS_V6),
    }
}

/// Creates the raw PIM socket for `ifname`, bound to that interface so
/// traffic sent and received on it never crosses to another vif.
pub fn socket(ifname: &str, af: AddressFamily) -> Result<Socket, std::io::Error> {
    #[cfg(not(feature = "testing"))]
    {
        use socket2::{Domain, Protocol, Type};

        let domain = match af {
            AddressFamily::Ipv4 => Domain::IPV4,
            AddressFamily::Ipv6 => Domain::IPV6,
        };
        let socket = capabilities::raise(|| {
            Socket::new(domain, Type::RAW, Some(Protocol::from(PIM_IP_PROTO)))
        })?;

        socket.set_nonblocking(true)?;
        socket.bind_device(Some(ifname.as_bytes()))?;
        match af {
            AddressFamily::Ipv4 => {
                socket.set_multicast_loop_v4(false)?;
                socket.set_multicast_ttl_v4(1)?;
            }
            AddressFamily::Ipv6 => {
                socket.set_multicast_loop_v6(false)?;
                socket.set_multicast_hops_v6(1)?;
            }
        }

        Ok(socket)
    }
    #[cfg(feature = "testing")]
    {
        let _ = (ifname, af);
        Ok(Socket {})
    }
}

pub fn join_multicast(
    socket: &Socket,
    af: AddressFamily,
    ifindex: u32,
) -> Result<(), std::io::Error> {
    #[cfg(not(feature = "testing"))]
    {
        let sockref = socket2::SockRef::from(socket);
        match af {
            AddressFamily::Ipv4 => sockref.join_multicast_v4_n(
                &ALL_PIM_ROUTERS_V4,
                &socket2::InterfaceIndexOrAddress::Index(ifindex),
            ),
            AddressFamily::Ipv6 => {
                sockref.join_multicast_v6(&ALL_PIM_ROUTERS_V6, ifindex)
            }
        }
    }
    #[cfg(feature = "testing")]
    {
        let _ = (socket, af, ifindex);
        Ok(())
    }
}

pub fn leave_multicast(
    socket: &Socket,
    af: AddressFamily,
    ifindex: u32,
) -> Result<(), std::io::Error> {
    #[cfg(not(feature = "testing"))]
    {
        let sockref = socket2::SockRef::from(socket);
        match af {
            AddressFamily::Ipv4 => sockref.leave_multicast_v4_n(
                &ALL_PIM_ROUTERS_V4,
                &socket2::InterfaceIndexOrAddress::Index(ifindex),
            ),
            AddressFamily::Ipv6 => {
                sockref.leave_multicast_v6(&ALL_PIM_ROUTERS_V6, ifindex)
            }
        }
    }
    #[cfg(feature = "testing")]
    {
        let _ = (socket, af, ifindex);
        Ok(())
    }
}

// Raw IPv4 sockets deliver the IP header alongside the payload; raw
// IPv6 sockets don't. Strips it when present so both paths hand the
// same thing (a PIM common header at offset 0) to `packet::decode_header`.
fn strip_ip_hdr(buf: &mut Bytes, af: AddressFamily) {
    if af != AddressFamily::Ipv4 {
        return;
    }
    if buf.len() < 20 {
        return;
    }
    let hdr_len = buf[0] & 0x0F;
    buf.advance((hdr_len << 2) as usize);
}

#[cfg(not(feature = "testing"))]
async fn send_packet(
    socket: &AsyncFd<Socket>,
    dst: PimAddr,
    bytes: &[u8],
) -> Result<usize, IoError> {
    let iov = [IoSlice::new(bytes)];

    match dst {
        IpAddr::V4(addr) => {
            let sockaddr: SockaddrIn =
                std::net::SocketAddrV4::new(addr, 0).into();
            socket
                .async_io(tokio::io::Interest::WRITABLE, |socket| {
                    socket::sendmsg(
                        socket.as_raw_fd(),
                        &iov,
                        &[],
                        socket::MsgFlags::empty(),
                        Some(&sockaddr),
                    )
                    .map_err(|errno| errno.into())
                })
                .await
                .map_err(IoError::SendError)
        }
        IpAddr::V6(addr) => {
            let sockaddr: SockaddrIn6 =
                std::net::SocketAddrV6::new(addr, 0, 0, 0).into();
            socket
                .async_io(tokio::io::Interest::WRITABLE, |socket| {
                    socket::sendmsg(
                        socket.as_raw_fd(),
                        &iov,
                        &[],
                        socket::MsgFlags::empty(),
                        Some(&sockaddr),
                    )
                    .map_err(|errno| errno.into())
                })
                .await
                .map_err(IoError::SendError)
        }
    }
}

/// Drains the per-interface Tx channel, finalizing the checksum on
/// each outgoing message right before the socket write.
#[cfg(not(feature = "testing"))]
pub(crate) async fn write_loop(
    socket: Arc<AsyncFd<Socket>>,
    mut net_tx_packetc: UnboundedReceiver<NetTxPacketMsg>,
) {
    while let Some(NetTxPacketMsg { vid: _, dst, bytes }) =
        net_tx_packetc.recv().await
    {
        let mut buf = BytesMut::from(&bytes[..]);
        packet::finalize_checksum(&mut buf);
        if let Err(error) = send_packet(&socket, dst, &buf).await {
            error.log();
        }
    }
}

#[cfg(feature = "testing")]
pub(crate) async fn write_loop(
    _socket: Arc<AsyncFd<Socket>>,
    _net_tx_packetc: UnboundedReceiver<NetTxPacketMsg>,
) {
    std::future::pending().await
}

/// Reads raw PIM packets off `socket`, decodes their common header and
/// forwards the still-undecoded body for per-type decode on the main
/// task (`tasks::process_net_rx_packet`).
#[cfg(not(feature = "testing"))]
pub(crate) async fn read_loop(
    socket: Arc<AsyncFd<Socket>>,
    vid: Vid,
    af: AddressFamily,
    net_rx_packetp: Sender<NetRxPacketMsg>,
) -> Result<(), SendError<NetRxPacketMsg>> {
    let mut buf = [0; 8192];
    let mut iov = [IoSliceMut::new(&mut buf)];

    loop {
        let result = match af {
            AddressFamily::Ipv4 => {
                socket
                    .async_io(tokio::io::Interest::READABLE, |socket| {
                        socket::recvmsg::<SockaddrIn>(
                            socket.as_raw_fd(),
                            &mut iov,
                            None,
                            socket::MsgFlags::empty(),
                        )
                        .map_err(|errno| errno.into())
                        .map(|msg| {
                            let src = msg.address.map(|a| IpAddr::V4(a.ip()));
                            (src, msg.bytes)
                        })
                    })
                    .await
            }
            AddressFamily::Ipv6 => {
                socket
                    .async_io(tokio::io::Interest::READABLE, |socket| {
                        socket::recvmsg::<SockaddrIn6>(
                            socket.as_raw_fd(),
                            &mut iov,
                            None,
                            socket::MsgFlags::empty(),
                        )
                        .map_err(|errno| errno.into())
                        .map(|msg| {
                            let src = msg.address.map(|a| IpAddr::V6(a.ip()));
                            (src, msg.bytes)
                        })
                    })
                    .await
            }
        };

        match result {
            Ok((Some(src), n)) => {
                let mut bytes = Bytes::copy_from_slice(&iov[0].deref()[0..n]);
                strip_ip_hdr(&mut bytes, af);
                let msg_type = packet::decode_header(&mut bytes);
                let msg = NetRxPacketMsg { vid, src, bytes, msg_type };
                net_rx_packetp.send(msg).await?;
            }
            Ok((None, _)) => {
                IoError::RecvError(std::io::Error::other(
                    "received packet without source address",
                ))
                .log();
            }
            Err(error) if error.kind() == std::io::ErrorKind::Interrupted => {
                continue;
            }
            Err(error) => {
                IoError::RecvError(error).log();
            }
        }
    }
}

#[cfg(feature = "testing")]
pub(crate) async fn read_loop(
    _socket: Arc<AsyncFd<Socket>>,
    _vid: Vid,
    _af: AddressFamily,
    _net_rx_packetp: Sender<NetRxPacketMsg>,
) -> Result<(), SendError<NetRxPacketMsg>> {
    std::future::pending().await
}

fn source_flags(entry_type: JpEntryType) -> u8 {
    let mut flags = ESA_FLAG_SPARSE;
    match entry_type {
        JpEntryType::Rp => flags |= ESA_FLAG_WC | ESA_FLAG_RPT,
        JpEntryType::Wc => flags |= ESA_FLAG_WC,
        JpEntryType::Sg => {}
        JpEntryType::SgRpt => flags |= ESA_FLAG_RPT,
    }
    flags
}

fn mask_len(addr: PimAddr) -> u8 {
    if addr.is_ipv4() { 32 } else { 128 }
}

fn assemble_wire_group(group: &AssembledJpGroup) -> WireJpGroup {
    let mut joins = Vec::new();
    let mut prunes = Vec::new();
    for item in &group.items {
        let source = EncodedSourceAddr {
            addr: item.source,
            mask_len: mask_len(item.source),
            flags: source_flags(item.entry_type),
        };
        match item.action {
            crate::jp::JpAction::Join => joins.push(source),
            crate::jp::JpAction::Prune => prunes.push(source),
        }
    }
    WireJpGroup {
        group: EncodedGroupAddr {
            addr: group.group,
            mask_len: group.mask_len,
        },
        joins,
        prunes,
    }
}

/// Flushes every neighbor's pending Join/Prune batch on `iface_id` as
/// one wire message per neighbor, addressed to that neighbor and sent
/// to the ALL-PIM-ROUTERS group so other routers on the LAN can
/// suppress their own joins (RFC 4601 §4.5.1).
pub(crate) fn send_jp_batch(
    instance: &mut InstanceUpView<'_>,
    arenas: &mut InstanceArenas,
    iface_id: InterfaceId,
) -> Result<(), Error> {
    let Some(iface) = arenas.interfaces.iter().find(|i| i.id == iface_id) else {
        return Ok(());
    };
    let vid = iface.vid;
    let Some(net) = &iface.state.net else {
        return Ok(());
    };
    let net_tx_packetp = net.net_tx_packetp.clone();
    let af = if iface.state.primary_addr.is_none_or(|a| a.is_ipv4()) {
        AddressFamily::Ipv4
    } else {
        AddressFamily::Ipv6
    };
    let dst = all_pim_routers(af);

    for nbr in instance.state.neighbors.iter_mut().filter(|n| n.vid == vid) {
        if nbr.outbound_jp_batch.is_empty() {
            continue;
        }
        let groups = nbr.outbound_jp_batch.take();
        let jp = JoinPrune {
            upstream_neighbor: EncodedUnicastAddr(nbr.addr),
            holdtime: iface.config.jp_holdtime,
            groups: groups.iter().map(assemble_wire_group).collect(),
        };
        let bytes = jp.encode().to_vec();
        let _ = net_tx_packetp.send(NetTxPacketMsg { vid, dst, bytes });
    }

    Ok(())
}

