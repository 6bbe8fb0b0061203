// Taskhive Infrastructure - In-Memory Adapter
// Implements: TaskStore (memory-resident, no durability)

mod memory_store;

pub use memory_store::InMemoryTaskStore;
