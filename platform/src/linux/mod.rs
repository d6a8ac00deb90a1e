mod device;

pub use device::{open, LinuxBlockDevice};
