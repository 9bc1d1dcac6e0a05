//! In-memory reference adapters for the persistence ports.
//!
//! Each adapter guards its tables with a single [`std::sync::Mutex`] so the
//! multi-row mutations the ports require (roster change plus counter) are
//! observed atomically. Locks are poison-tolerant: a panicking writer does
//! not wedge every later request.

mod memory_directory;
mod memory_guilds;
mod memory_notes;
mod memory_progress;

pub use memory_directory::InMemoryUserDirectory;
pub use memory_guilds::InMemoryGuildRepository;
pub use memory_notes::InMemoryNoteRepository;
pub use memory_progress::InMemoryProgressRepository;
