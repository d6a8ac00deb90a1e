//! The device context (spec §3 "Device context"): geometry, the active
//! label, the in-memory partition set, dirty-sector tracking, and the
//! ask channel, all in one place a label driver operates on.

use crate::ask::AskChannel;
use crate::device::{BlockDevice, DeviceGeometry};
use crate::label::LabelKind;
use crate::table::PartitionTable;
use std::any::Any;
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;
use std::sync::Arc;

/// A nested label (BSD disklabel inside an MBR slice) shares its
/// parent's file descriptor rather than opening a second one (spec §3:
/// "ownership of the buffer is tracked and freed exactly once").
pub type SharedDevice = Rc<RefCell<dyn BlockDevice>>;

pub struct Context {
    pub device_path: Option<String>,
    device: SharedDevice,
    pub read_only: bool,
    pub geometry: DeviceGeometry,

    /// Present only for a nested context (e.g. a BSD disklabel living
    /// inside a DOS slice).
    pub parent_geometry: Option<Box<DeviceGeometry>>,
    pub parent_label: Option<LabelKind>,

    /// Sector 0 (or the primary bootsector), shared with a parent
    /// context when one exists.
    pub first_sector: Rc<RefCell<Vec<u8>>>,

    pub active_label: Option<LabelKind>,
    pub table: PartitionTable,

    ask: Arc<dyn AskChannel>,

    /// Sectors a driver has modified in memory but not yet flushed;
    /// `write` drains this in the order a driver chooses (spec §4.2,
    /// §4.8).
    dirty: BTreeMap<u64, Vec<u8>>,

    /// Byte ranges slated to be zeroed immediately before the final
    /// write (C10, spec §4.8).
    wipe_ranges: Vec<(u64, u64)>,

    pub device_used: bool,
    pub collision_name: Option<String>,

    /// Opaque per-label scratch state (e.g. MBR's extended-container
    /// offset/index) a driver stashes between calls without the core
    /// crate needing to know its shape.
    pub label_state: Option<Box<dyn Any>>,
}

impl Context {
    pub fn new(device: SharedDevice, geometry: DeviceGeometry, ask: Arc<dyn AskChannel>) -> Self {
        Self {
            device_path: None,
            device,
            read_only: false,
            geometry,
            parent_geometry: None,
            parent_label: None,
            first_sector: Rc::new(RefCell::new(vec![0u8; geometry.logical_sector_size as usize])),
            active_label: None,
            table: PartitionTable::new(),
            ask,
            dirty: BTreeMap::new(),
            wipe_ranges: Vec::new(),
            device_used: false,
            collision_name: None,
            label_state: None,
        }
    }

    /// Build a nested context for a label embedded inside one of
    /// `self`'s partitions (e.g. BSD inside an MBR slice), sharing the
    /// device handle (spec §3: "optional parent context reference").
    pub fn nested(&self, slice_geometry: DeviceGeometry) -> Self {
        let mut child = Context::new(self.device.clone(), slice_geometry, self.ask.clone());
        child.device_path = self.device_path.clone();
        child.parent_geometry = Some(Box::new(self.geometry));
        child.parent_label = self.active_label;
        child
    }

    pub fn ask(&self) -> &dyn AskChannel {
        self.ask.as_ref()
    }

    pub fn read_sector(&self, lba: u64) -> crate::error::Result<Vec<u8>> {
        if let Some(d) = self.dirty.get(&lba) {
            return Ok(d.clone());
        }
        self.device.borrow_mut().read_sector(lba)
    }

    /// Stage a sector write; it only reaches the device on `flush_dirty`
    /// (driven by a label driver's `write`).
    pub fn stage_sector(&mut self, lba: u64, data: Vec<u8>) {
        self.dirty.insert(lba, data);
    }

    pub fn is_dirty(&self) -> bool {
        !self.dirty.is_empty()
    }

    pub fn dirty_lbas(&self) -> Vec<u64> {
        self.dirty.keys().copied().collect()
    }

    /// Flush staged sectors to the device in ascending LBA order,
    /// honoring any caller-provided explicit order first (spec §4.8:
    /// "guarantees that critical sectors are written in an order that
    /// leaves the disk re-probeable").
    pub fn flush_dirty_ordered(&mut self, order: &[u64]) -> crate::error::Result<()> {
        for &lba in order {
            if let Some(data) = self.dirty.remove(&lba) {
                self.device.borrow_mut().write_sector(lba, &data)?;
            }
        }
        // anything left unspecified goes out in ascending order
        let rest: Vec<u64> = self.dirty.keys().copied().collect();
        for lba in rest {
            let data = self.dirty.remove(&lba).unwrap();
            self.device.borrow_mut().write_sector(lba, &data)?;
        }
        Ok(())
    }

    pub fn mark_wipe(&mut self, start_byte: u64, end_byte: u64) {
        self.wipe_ranges.push((start_byte, end_byte));
    }

    pub fn wipe_ranges(&self) -> &[(u64, u64)] {
        &self.wipe_ranges
    }

    pub fn clear_wipe_ranges(&mut self) {
        self.wipe_ranges.clear();
    }
}
