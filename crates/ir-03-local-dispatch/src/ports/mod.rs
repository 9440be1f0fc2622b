pub mod outbound;

pub use outbound::{RecordingScene, RegionScene, SceneCall};
