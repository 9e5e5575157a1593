pub mod generation_llm;
pub mod memory_store;

pub use generation_llm::OpenAiGenerationAdapter;
pub use memory_store::MemoryStore;
