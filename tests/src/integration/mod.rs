//! Cross-crate integration tests. Every host listens on `127.0.0.1:0`.

#[cfg(test)]
mod harness;

mod local_dispatch;
mod object_crossing;
mod peer_failures;
mod region_host;
