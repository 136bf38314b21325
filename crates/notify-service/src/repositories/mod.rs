pub mod messages;

pub use messages::{InMemoryMessageStore, MessageStore, PgMessageStore};
