//! The partition table (spec §3 "Partition table"): an arena of
//! `Partition` values owned by ordinal, plus the free-space entries a
//! label driver's enumerator produces for display.

use crate::partition::Partition;

#[derive(Debug, Clone, Default)]
pub struct PartitionTable {
    entries: Vec<Partition>,
}

impl PartitionTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Partition> {
        self.entries.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Partition> {
        self.entries.iter_mut()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, partno: u32) -> Option<&Partition> {
        self.entries.iter().find(|p| p.partno == Some(partno))
    }

    pub fn get_mut(&mut self, partno: u32) -> Option<&mut Partition> {
        self.entries.iter_mut().find(|p| p.partno == Some(partno))
    }

    /// Insert a partition, keeping entries ordered by ordinal for
    /// label-level operations (spec §3: "Ordered by ordinal for
    /// label-level operations").
    pub fn add(&mut self, partition: Partition) {
        let pos = self
            .entries
            .iter()
            .position(|p| p.partno > partition.partno)
            .unwrap_or(self.entries.len());
        self.entries.insert(pos, partition);
    }

    pub fn remove(&mut self, partno: u32) -> Option<Partition> {
        let idx = self.entries.iter().position(|p| p.partno == Some(partno))?;
        Some(self.entries.remove(idx))
    }

    pub fn replace(&mut self, partno: u32, partition: Partition) -> Option<Partition> {
        let idx = self.entries.iter().position(|p| p.partno == Some(partno))?;
        Some(std::mem::replace(&mut self.entries[idx], partition))
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Partitions ordered by start LBA, for user display (spec §3:
    /// "may be re-ordered by start for user display").
    pub fn by_start(&self) -> Vec<&Partition> {
        let mut v: Vec<&Partition> = self.entries.iter().collect();
        v.sort_by_key(|p| p.start);
        v
    }

    pub fn next_free_ordinal(&self, first: u32) -> u32 {
        let mut n = first;
        while self.get(n).is_some() {
            n += 1;
        }
        n
    }

    /// Diff against another table: ordinals present in `self` but not
    /// `other`, and vice versa. Used by the reread-changes path
    /// (spec §3).
    pub fn diff<'a>(&'a self, other: &'a PartitionTable) -> TableDiff<'a> {
        let mut added = Vec::new();
        let mut removed = Vec::new();
        for p in &self.entries {
            if let Some(partno) = p.partno {
                if other.get(partno).is_none() {
                    removed.push(p);
                }
            }
        }
        for p in &other.entries {
            if let Some(partno) = p.partno {
                if self.get(partno).is_none() {
                    added.push(p);
                }
            }
        }
        TableDiff { added, removed }
    }
}

#[derive(Debug)]
pub struct TableDiff<'a> {
    pub added: Vec<&'a Partition>,
    pub removed: Vec<&'a Partition>,
}
