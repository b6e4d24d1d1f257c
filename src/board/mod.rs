//! Board store gateway: optimistic-concurrency reads and writes of the
//! board document against the remote drive.

mod store;

pub use store::{BoardSnapshot, BoardStore};
