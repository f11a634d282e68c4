//! Engine connections implementing [`tcinit_kernel::AdminClient`].

pub mod memory;
pub mod mongo;

pub use memory::MemoryAdmin;
pub use mongo::MongoAdmin;
