//! Physical input capture and logical mapping.

pub mod discover;
pub mod mapper;
pub mod reader;

pub use discover::{enumerate_candidates, open_keyboard, open_pointer, DeviceCandidate};
pub use mapper::{InputMapper, WheelMapping};
pub use reader::{InputReader, ToggleDetector};
