pub mod memory;
pub mod timeout;

pub use memory::InMemoryRegionDirectory;
pub use timeout::{TimeoutDirectory, DEFAULT_LOOKUP_TIMEOUT};
