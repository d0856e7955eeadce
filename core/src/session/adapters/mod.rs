pub mod file;
pub mod in_memory;

pub use file::FileSessionProvider;
pub use in_memory::InMemorySessionProvider;
