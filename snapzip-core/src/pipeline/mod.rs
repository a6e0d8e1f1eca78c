//! Pipeline module for snappy compression and decompression operations.

mod counting;
mod sync;

pub use sync::{compress, decompress};
