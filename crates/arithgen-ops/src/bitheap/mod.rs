//! Bit heaps and their compression

mod compressor;
mod heap;

pub use compressor::{compressor_cost, compressor_outputs, CompressorSearch, Partition};
pub use heap::{BitHeap, BitSource};
