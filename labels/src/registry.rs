//! The label-driver registry (C6), grounded on the teacher's
//! `FormatterRegistry` (`core/src/registry.rs`): a flat map from kind
//! to a shared trait object, queried by the host to find the driver
//! that claims a device and to offer "create a new label" choices.

use ptable_core::{LabelDriver, LabelKind};
use std::collections::HashMap;
use std::sync::Arc;

pub struct LabelRegistry {
    drivers: HashMap<LabelKind, Arc<dyn LabelDriver>>,
    /// Probe order: the first driver to return `Ok(true)` from `probe`
    /// wins (spec §1 dataflow: "C6 probes drivers in order until one
    /// claims the first sector").
    probe_order: Vec<LabelKind>,
}

impl LabelRegistry {
    pub fn new() -> Self {
        Self {
            drivers: HashMap::new(),
            probe_order: Vec::new(),
        }
    }

    pub fn register(&mut self, driver: Arc<dyn LabelDriver>) {
        let kind = driver.kind();
        self.probe_order.push(kind);
        self.drivers.insert(kind, driver);
    }

    pub fn get(&self, kind: LabelKind) -> Option<Arc<dyn LabelDriver>> {
        self.drivers.get(&kind).cloned()
    }

    pub fn probe_order(&self) -> &[LabelKind] {
        &self.probe_order
    }

    pub fn list(&self) -> Vec<LabelKind> {
        self.probe_order.clone()
    }

    /// The stock registry: GPT probed before DOS/MBR, since a GPT disk
    /// carries a protective MBR that would otherwise make the MBR
    /// driver claim it first; BSD/SGI/SUN follow.
    pub fn standard() -> Self {
        let mut reg = Self::new();
        reg.register(Arc::new(crate::gpt::GptDriver));
        reg.register(Arc::new(crate::mbr::MbrDriver));
        reg.register(Arc::new(crate::bsd::BsdDriver));
        reg.register(Arc::new(crate::sgi::SgiDriver));
        reg.register(Arc::new(crate::sun::SunDriver));
        reg
    }
}

impl Default for LabelRegistry {
    fn default() -> Self {
        Self::new()
    }
}
