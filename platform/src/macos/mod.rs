mod device;

pub use device::{open, MacOsBlockDevice};
