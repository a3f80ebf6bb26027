//! Archive probing and extraction.
//!
//! The walker treats this module as its archive collaborator: [`probe`]
//! answers "is this an archive?" without ever failing, and [`extract_to`]
//! unpacks a probed archive into a directory.

pub mod compression;
pub mod detect;
pub mod extract;

// Re-export main types for convenience
pub use compression::CompressionCodec;
pub use detect::ArchiveHandle;
pub use detect::ArchiveType;
pub use detect::probe;
pub use extract::extract_to;
