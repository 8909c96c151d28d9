mod error;
mod filter;
mod source;

pub use filter::{BearingFilter, DEFAULT_TAPS};
pub use source::{Bearing, Compass, FileBearingSource};
