mod device;

pub use device::{open, WindowsBlockDevice};
