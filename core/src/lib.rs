pub mod align;
pub mod ask;
pub mod context;
pub mod debug;
pub mod device;
pub mod error;
pub mod label;
pub mod partition;
pub mod table;
pub mod types;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use ask::{Ask, AskChannel, AskResult, MenuItem, MenuSpec, NumberSpec};
pub use context::Context;
pub use device::{BlockDevice, DeviceGeometry};
pub use error::{PtableError, Result};
pub use label::{LabelDriver, LabelKind, VerifyIssue};
pub use partition::{Extent, FollowDefault, Partition, PartitionHandle, PartitionTemplate};
pub use table::PartitionTable;
pub use types::{PartitionType, TypeId, TypeRegistry};
