//! Test doubles, grounded on the teacher's `MockDevice`/
//! `MockDeviceManager` pattern (`core/src/test_utils.rs`): a mock that
//! never touches real hardware, plus call-count tracking a test can
//! assert on.

use crate::ask::{Ask, AskChannel, AskResult};
use crate::device::BlockDevice;
use crate::error::{PtableError, Result};
use std::cell::RefCell;
use std::sync::{Arc, Mutex};

/// An in-memory block device backed by a `Vec<u8>`, for tests that
/// build a disk image and round-trip it through a label driver without
/// touching the filesystem.
pub struct MemDevice {
    sector_size: u32,
    sectors: Vec<u8>,
    pub read_count: RefCell<usize>,
    pub write_count: RefCell<usize>,
}

impl MemDevice {
    pub fn new(sector_size: u32, sector_count: u64) -> Self {
        Self {
            sector_size,
            sectors: vec![0u8; sector_size as usize * sector_count as usize],
            read_count: RefCell::new(0),
            write_count: RefCell::new(0),
        }
    }

    pub fn raw(&self) -> &[u8] {
        &self.sectors
    }
}

impl BlockDevice for MemDevice {
    fn read_sector(&mut self, lba: u64) -> Result<Vec<u8>> {
        *self.read_count.get_mut() += 1;
        let start = lba as usize * self.sector_size as usize;
        let end = start + self.sector_size as usize;
        self.sectors
            .get(start..end)
            .map(|s| s.to_vec())
            .ok_or_else(|| PtableError::IoError(std::io::Error::new(std::io::ErrorKind::UnexpectedEof, "read past end")))
    }

    fn write_sector(&mut self, lba: u64, data: &[u8]) -> Result<()> {
        *self.write_count.get_mut() += 1;
        let start = lba as usize * self.sector_size as usize;
        let end = start + data.len();
        if end > self.sectors.len() {
            return Err(PtableError::IoError(std::io::Error::new(
                std::io::ErrorKind::UnexpectedEof,
                "write past end",
            )));
        }
        self.sectors[start..end].copy_from_slice(data);
        Ok(())
    }

    fn sector_count(&self) -> u64 {
        self.sectors.len() as u64 / self.sector_size as u64
    }

    fn sector_size(&self) -> u32 {
        self.sector_size
    }
}

/// An ask channel that answers every request with a scripted queue of
/// results, recording how many asks it served (mirrors the teacher's
/// `enumerate_call_count` bookkeeping on `MockDeviceManager`).
pub struct ScriptedAskChannel {
    answers: Mutex<Vec<AskResult>>,
    pub call_count: Mutex<usize>,
}

impl ScriptedAskChannel {
    pub fn new(answers: Vec<AskResult>) -> Arc<Self> {
        Arc::new(Self {
            answers: Mutex::new(answers),
            call_count: Mutex::new(0),
        })
    }

    /// A channel that accepts every yes/no and acknowledges every
    /// info/warn, useful when a test doesn't care about prompts.
    pub fn accepting() -> Arc<Self> {
        Self::new(Vec::new())
    }
}

impl AskChannel for ScriptedAskChannel {
    fn ask(&self, request: Ask) -> Result<AskResult> {
        *self.call_count.lock().unwrap() += 1;
        let mut answers = self.answers.lock().unwrap();
        if !answers.is_empty() {
            return Ok(answers.remove(0));
        }
        Ok(match request {
            Ask::YesNo { .. } => AskResult::YesNo(true),
            Ask::Info { .. } | Ask::Warn { .. } | Ask::WarnErrno { .. } => AskResult::Acknowledged,
            Ask::Number { spec, .. } => AskResult::Number(spec.default),
            Ask::String { .. } => AskResult::String(String::new()),
            Ask::Menu { spec, .. } => AskResult::MenuKey(
                spec.default_key
                    .or_else(|| spec.items.first().map(|i| i.key.clone()))
                    .unwrap_or_default(),
            ),
        })
    }
}
