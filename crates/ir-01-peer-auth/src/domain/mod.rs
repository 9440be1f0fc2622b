pub mod credential;

pub use credential::{credentials_match, generate_authorization, GridSendKey};
