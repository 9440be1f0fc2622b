pub mod region;
pub mod registry;

pub use region::{Crossing, LocalRegion};
pub use registry::{Local, LocalDispatch, RegistryError};
