//! Sequence playback against a device.

pub mod device;
pub mod executor;
pub mod library;

pub use device::{DeviceController, SimulatedDevice};
pub use executor::{Plan, RunReport, SequenceExecutor, Step};
pub use library::{DirectoryLibrary, InMemoryLibrary, SequenceLibrary};
