//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//
// Sponsored by NLnet as part of the Next Generation Internet initiative.
// See: https://nlnet.nl/NGI0
//

//! MrtTables (C6): the arenas and lookup indices backing the four MRE
//! kinds plus the MFC, following the arena-plus-key-tree idiom used
//! throughout the workspace (c.f. `holo-isis::collections`).

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::marker::PhantomData;

use generational_arena::Index;
use ipnetwork::IpNetwork;

use crate::addr::{PimAddr, prefix_bounds};
use crate::interface::{Interface, InterfaceIndex, Vid};
use crate::mfc::PimMfc;
use crate::mre::PimMre;
use crate::neighbor::{NbrKey, NeighborIndex, PimNbr};
use crate::rp::RpTable;

pub type ObjectId = u32;
pub type InterfaceId = ObjectId;
pub type NeighborId = ObjectId;
pub type MreId = ObjectId;
pub type MfcId = ObjectId;
pub type MreIndex = Index;
pub type MfcIndex = Index;

#[derive(Debug)]
pub struct Arena<T>(generational_arena::Arena<T>);

impl<T> Default for Arena<T> {
    fn default() -> Arena<T> {
        Arena(Default::default())
    }
}

impl<T> std::ops::Index<Index> for Arena<T> {
    type Output = T;
    fn index(&self, index: Index) -> &T {
        &self.0[index]
    }
}

impl<T> std::ops::IndexMut<Index> for Arena<T> {
    fn index_mut(&mut self, index: Index) -> &mut T {
        &mut self.0[index]
    }
}

impl<T> Arena<T> {
    pub fn get(&self, index: Index) -> Option<&T> {
        self.0.get(index)
    }

    pub fn get_mut(&mut self, index: Index) -> Option<&mut T> {
        self.0.get_mut(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Index, &T)> {
        self.0.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (Index, &mut T)> {
        self.0.iter_mut()
    }
}

// ===== single-address-keyed container: (*,*,RP) and (*,G) =====

/// Container for entries keyed by a single address: (*,*,RP) by RP
/// address, (*,G) by group address.
#[derive(Debug)]
pub struct AddrTable<T> {
    id_tree: HashMap<ObjectId, Index>,
    addr_tree: BTreeMap<PimAddr, Index>,
    next_id: ObjectId,
    _marker: PhantomData<T>,
}

impl<T> Default for AddrTable<T> {
    fn default() -> AddrTable<T> {
        AddrTable {
            id_tree: Default::default(),
            addr_tree: Default::default(),
            next_id: 0,
            _marker: PhantomData,
        }
    }
}

impl<T> AddrTable<T> {
    pub fn insert(
        &mut self,
        arena: &mut Arena<T>,
        addr: PimAddr,
        make: impl FnOnce(ObjectId) -> T,
    ) -> Index {
        self.next_id += 1;
        let id = self.next_id;
        let idx = arena.0.insert(make(id));
        self.id_tree.insert(id, idx);
        self.addr_tree.insert(addr, idx);
        idx
    }

    pub fn remove(&mut self, arena: &mut Arena<T>, id: ObjectId, addr: PimAddr) {
        self.id_tree.remove(&id);
        if let Some(idx) = self.addr_tree.remove(&addr) {
            arena.0.remove(idx);
        }
    }

    pub fn get_by_addr(&self, addr: PimAddr) -> Option<Index> {
        self.addr_tree.get(&addr).copied()
    }

    pub fn get_by_id(&self, id: ObjectId) -> Option<Index> {
        self.id_tree.get(&id).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = Index> + '_ {
        self.addr_tree.values().copied()
    }

    pub fn iter_with_addr(&self) -> impl Iterator<Item = (PimAddr, Index)> + '_ {
        self.addr_tree.iter().map(|(addr, idx)| (*addr, *idx))
    }
}

// ===== (source, group)-keyed container: (S,G), (S,G,rpt), MFC =====

/// Container for entries keyed by `(source, group)`: (S,G),
/// (S,G,rpt), and the MFC. Maintains both a source-major and a
/// group-major index so callers can iterate in either order, plus a
/// combined key used to resume an interrupted time-slice
/// (`source_group_by_addr_begin`, `spec.md` §4.6).
#[derive(Debug)]
pub struct SgTable<T> {
    id_tree: HashMap<ObjectId, Index>,
    sg_tree: BTreeMap<(PimAddr, PimAddr), Index>,
    gs_tree: BTreeMap<(PimAddr, PimAddr), Index>,
    next_id: ObjectId,
    _marker: PhantomData<T>,
}

impl<T> Default for SgTable<T> {
    fn default() -> SgTable<T> {
        SgTable {
            id_tree: Default::default(),
            sg_tree: Default::default(),
            gs_tree: Default::default(),
            next_id: 0,
            _marker: PhantomData,
        }
    }
}

impl<T> SgTable<T> {
    pub fn insert(
        &mut self,
        arena: &mut Arena<T>,
        source: PimAddr,
        group: PimAddr,
        make: impl FnOnce(ObjectId) -> T,
    ) -> Index {
        self.next_id += 1;
        let id = self.next_id;
        let idx = arena.0.insert(make(id));
        self.id_tree.insert(id, idx);
        self.sg_tree.insert((source, group), idx);
        self.gs_tree.insert((group, source), idx);
        idx
    }

    pub fn remove(
        &mut self,
        arena: &mut Arena<T>,
        id: ObjectId,
        source: PimAddr,
        group: PimAddr,
    ) {
        self.id_tree.remove(&id);
        if let Some(idx) = self.sg_tree.remove(&(source, group)) {
            self.gs_tree.remove(&(group, source));
            arena.0.remove(idx);
        }
    }

    pub fn find(&self, source: PimAddr, group: PimAddr) -> Option<Index> {
        self.sg_tree.get(&(source, group)).copied()
    }

    pub fn get_by_id(&self, id: ObjectId) -> Option<Index> {
        self.id_tree.get(&id).copied()
    }

    pub fn source_by_addr(
        &self,
        source: PimAddr,
    ) -> impl Iterator<Item = Index> + '_ {
        let zero = crate::addr::zero_addr(source.is_ipv4());
        self.sg_tree.range((source, zero)..).map(|(_, idx)| *idx)
    }

    pub fn group_by_addr(
        &self,
        group: PimAddr,
    ) -> impl Iterator<Item = Index> + '_ {
        let zero = crate::addr::zero_addr(group.is_ipv4());
        self.gs_tree.range((group, zero)..).map(|(_, idx)| *idx)
    }

    pub fn source_group_by_addr(
        &self,
        source: PimAddr,
        group: PimAddr,
    ) -> impl Iterator<Item = Index> + '_ {
        self.sg_tree.range((source, group)..).map(|(_, idx)| *idx)
    }

    pub fn source_by_prefix(
        &self,
        prefix: IpNetwork,
    ) -> impl Iterator<Item = Index> + '_ {
        let (first, last) = prefix_bounds(prefix);
        let group_floor = crate::addr::zero_addr(first.is_ipv4());
        self.sg_tree
            .range((first, group_floor)..)
            .take_while(move |((s, _), _)| *s <= last)
            .map(|(_, idx)| *idx)
    }

    pub fn iter(&self) -> impl Iterator<Item = Index> + '_ {
        self.sg_tree.values().copied()
    }

    pub fn len(&self) -> usize {
        self.sg_tree.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sg_tree.is_empty()
    }
}

// ===== Interfaces =====

#[derive(Debug, Default)]
pub struct Interfaces {
    arena: Arena<Interface>,
    id_tree: HashMap<InterfaceId, InterfaceIndex>,
    name_tree: BTreeMap<String, InterfaceIndex>,
    vid_tree: HashMap<Vid, InterfaceIndex>,
    next_id: InterfaceId,
    next_vid: u32,
}

impl Interfaces {
    pub fn insert(&mut self, ifname: &str) -> &mut Interface {
        self.next_id += 1;
        self.next_vid += 1;
        let vid = Vid(self.next_vid);
        let id = self.next_id;
        let name = ifname.to_owned();
        let idx = self
            .arena
            .0
            .insert_with(|index| Interface::new(index, id, vid, name));
        let iface = &mut self.arena[idx];
        self.id_tree.insert(iface.id, idx);
        self.name_tree.insert(iface.name.clone(), idx);
        self.vid_tree.insert(iface.vid, idx);
        iface
    }

    pub fn delete(&mut self, idx: InterfaceIndex) {
        let iface = &self.arena[idx];
        self.id_tree.remove(&iface.id);
        self.name_tree.remove(&iface.name);
        self.vid_tree.remove(&iface.vid);
        self.arena.0.remove(idx);
    }

    pub fn get_by_name(&self, name: &str) -> Option<&Interface> {
        self.name_tree.get(name).map(|idx| &self.arena[*idx])
    }

    pub fn get_mut_by_name(&mut self, name: &str) -> Option<&mut Interface> {
        self.name_tree
            .get(name)
            .copied()
            .map(move |idx| &mut self.arena[idx])
    }

    pub fn get_by_id(&self, id: InterfaceId) -> Option<&Interface> {
        self.id_tree.get(&id).map(|idx| &self.arena[*idx])
    }

    pub fn get_mut_by_id(&mut self, id: InterfaceId) -> Option<&mut Interface> {
        self.id_tree
            .get(&id)
            .copied()
            .map(move |idx| &mut self.arena[idx])
    }

    pub fn get_by_vid(&self, vid: Vid) -> Option<&Interface> {
        self.vid_tree.get(&vid).map(|idx| &self.arena[*idx])
    }

    pub fn get_mut_by_vid(&mut self, vid: Vid) -> Option<&mut Interface> {
        self.vid_tree
            .get(&vid)
            .copied()
            .map(move |idx| &mut self.arena[idx])
    }

    pub fn iter(&self) -> impl Iterator<Item = &Interface> {
        self.name_tree.values().map(|idx| &self.arena[*idx])
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Interface> {
        self.arena.0.iter_mut().map(|(_, iface)| iface)
    }
}

impl std::ops::Index<InterfaceIndex> for Interfaces {
    type Output = Interface;
    fn index(&self, idx: InterfaceIndex) -> &Interface {
        &self.arena[idx]
    }
}

impl std::ops::IndexMut<InterfaceIndex> for Interfaces {
    fn index_mut(&mut self, idx: InterfaceIndex) -> &mut Interface {
        &mut self.arena[idx]
    }
}

// ===== Neighbors =====

#[derive(Debug, Default)]
pub struct Neighbors {
    arena: Arena<PimNbr>,
    id_tree: HashMap<NeighborId, NeighborIndex>,
    key_tree: BTreeMap<(Vid, PimAddr), NeighborIndex>,
    next_id: NeighborId,
}

impl Neighbors {
    pub fn insert(&mut self, vid: Vid, addr: PimAddr) -> NeighborIndex {
        self.next_id += 1;
        let id = self.next_id;
        let idx = self.arena.0.insert_with(|index| {
            PimNbr::new(index, id, vid, addr)
        });
        self.id_tree.insert(id, idx);
        self.key_tree.insert((vid, addr), idx);
        idx
    }

    pub fn delete(&mut self, key: NbrKey) {
        if let Some(idx) = self.key_tree.remove(&(key.vid, key.addr)) {
            let id = self.arena[idx].id;
            self.id_tree.remove(&id);
            self.arena.0.remove(idx);
        }
    }

    pub fn get_by_key(&self, key: NbrKey) -> Option<&PimNbr> {
        self.key_tree
            .get(&(key.vid, key.addr))
            .map(|idx| &self.arena[*idx])
    }

    pub fn get_mut_by_key(&mut self, key: NbrKey) -> Option<&mut PimNbr> {
        self.key_tree
            .get(&(key.vid, key.addr))
            .copied()
            .map(move |idx| &mut self.arena[idx])
    }

    pub fn get_mut(&mut self, idx: NeighborIndex) -> Option<&mut PimNbr> {
        self.arena.get_mut(idx)
    }

    pub fn get(&self, idx: NeighborIndex) -> Option<&PimNbr> {
        self.arena.get(idx)
    }

    pub fn iter(&self) -> impl Iterator<Item = &PimNbr> {
        self.key_tree.values().map(|idx| &self.arena[*idx])
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut PimNbr> {
        self.arena.0.iter_mut().map(|(_, nbr)| nbr)
    }
}

// ===== MrtTables =====

/// The five MRE/MFC containers plus the RP-Set, grouped the way
/// `spec.md` §4.6 describes them. `PimMre`/`PimMfc` objects
/// themselves live in the two arenas; the four/one key-trees above
/// only ever hold indices into those arenas.
#[derive(Debug, Default)]
pub struct MrtTables {
    pub mre_arena: Arena<PimMre>,
    pub mfc_arena: Arena<PimMfc>,
    pub mre_rp: AddrTable<PimMre>,
    pub mre_wc: AddrTable<PimMre>,
    pub mre_sg: SgTable<PimMre>,
    pub mre_sg_rpt: SgTable<PimMre>,
    pub mfc: SgTable<PimMfc>,
    pub rps: RpTable,
    // Configured SPT-switch packet threshold, mirrored from
    // `InstanceCfg` the same way `rps` mirrors the configured RP-Set;
    // `None` means switch to the SPT on the first packet.
    pub spt_switch_threshold_packets: Option<u64>,
    // MFC entries reprogrammed since the last drain, mirroring
    // `holo_routing::rib::Rib`'s `ip_update_queue` dirty-set pattern
    // for batching southbound kernel writes.
    pub dirty_mfc: BTreeSet<MfcId>,
    // (source, group) pairs removed since the last drain; tracked
    // separately from `dirty_mfc` because by the time the drain runs
    // the entry (and its id) no longer exists in `mfc`/`mfc_arena`.
    pub deleted_mfc: Vec<(PimAddr, PimAddr)>,
}

#[cfg(test)]
mod tests {
    use std::net::{IpAddr, Ipv4Addr};

    use super::*;

    fn addr(last: u8) -> PimAddr {
        IpAddr::V4(Ipv4Addr::new(192, 0, 2, last))
    }

    #[test]
    fn mrt_tables_default_dirty_sets_are_empty() {
        let tables = MrtTables::default();
        assert!(tables.dirty_mfc.is_empty());
        assert!(tables.deleted_mfc.is_empty());
        assert!(tables.spt_switch_threshold_packets.is_none());
    }

    #[test]
    fn dirty_mfc_tracks_inserted_entry_id() {
        let mut tables = MrtTables::default();
        let source = addr(1);
        let group = addr(2);
        let idx = tables
            .mfc
            .insert(&mut tables.mfc_arena, source, group, PimMfc::new);
        let id = tables.mfc_arena[idx].id;

        tables.dirty_mfc.insert(id);
        assert!(tables.dirty_mfc.contains(&id));

        let found = tables.mfc.find(source, group).unwrap();
        assert_eq!(tables.mfc_arena[found].id, id);
    }

    #[test]
    fn deleted_mfc_survives_entry_removal() {
        let mut tables = MrtTables::default();
        let source = addr(1);
        let group = addr(2);
        let idx = tables
            .mfc
            .insert(&mut tables.mfc_arena, source, group, PimMfc::new);
        let id = tables.mfc_arena[idx].id;

        tables.mfc.remove(&mut tables.mfc_arena, id, source, group);
        tables.dirty_mfc.remove(&id);
        tables.deleted_mfc.push((source, group));

        assert!(tables.mfc.find(source, group).is_none());
        assert_eq!(tables.deleted_mfc, vec![(source, group)]);
    }
}
