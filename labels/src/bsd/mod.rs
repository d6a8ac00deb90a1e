//! BSD disklabel support (C2): on-disk layout plus the driver.

mod driver;
mod layout;

pub use driver::BsdDriver;
