//! tokenkeeper-file - filesystem-backed credential store.

mod store;

pub use store::FileStore;
