//! Post content: assembly, hashtags and the post record.

pub mod assembler;
pub mod hashtags;
pub mod post;

pub use assembler::PostAssembler;
pub use hashtags::{clean_text, derive_hashtags};
pub use post::{Post, PostMetadata, PostRecord, CONTENT_TYPE};
