pub mod distance;
pub mod error;
pub mod memory;
pub mod store;
pub mod unsupported;

pub use distance::{cosine_distance, l2_distance};
pub use error::VecError;
pub use memory::MemoryVectorStore;
pub use store::{Neighbor, VectorStore, closest};
pub use unsupported::NoVectorSupport;
