//! Generation backends
//!
//! Provides the service abstraction for text/image/audio/video generation.

mod traits;
mod registry;
mod mock;
mod openai;
pub mod style;

pub use traits::*;
pub use registry::*;
pub use mock::{MockConfig, MockService};
pub use openai::OpenAiTextService;
pub use style::{Culture, StylePreset};
