//! Dispatcher configuration.

use serde::{Deserialize, Serialize};
use std::fmt;

/// How regions reach each other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InterregionMode {
    /// Co-hosted regions in-process, everything else over HTTP.
    #[default]
    Rest,
    /// Co-hosted regions only. The network is never touched.
    Local,
}

impl fmt::Display for InterregionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InterregionMode::Rest => f.write_str("rest"),
            InterregionMode::Local => f.write_str("local"),
        }
    }
}
