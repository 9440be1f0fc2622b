pub mod generator;
pub mod ledger;

pub use generator::NonceGenerator;
pub use ledger::{NonceLedger, DEFAULT_RETENTION};
