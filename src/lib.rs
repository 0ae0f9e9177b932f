mod error;
mod config;
mod notes;
mod transformation;
mod edit_window;
mod distance_metrics;
mod adaptive_edit_distance;
mod transformation_matcher;
mod stream_matcher;
mod sequence_scheduler;
mod skip_sequence;
mod fugal_element_extractor;
mod fugue_analyzer;

pub use error::*;
pub use config::*;
pub use notes::*;
pub use transformation::*;
pub use edit_window::*;
pub use distance_metrics::*;
pub use adaptive_edit_distance::*;
pub use transformation_matcher::*;
pub use stream_matcher::*;
pub use sequence_scheduler::*;
pub use skip_sequence::*;
pub use fugal_element_extractor::*;
pub use fugue_analyzer::*;
