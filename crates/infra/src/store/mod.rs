//! Backing-store boundary.
//!
//! The backup job and the HTTP handlers depend only on the narrow
//! [`RecordStore`] surface (select-all / insert / delete-by-filter per named
//! collection), never on a concrete client.
//!
//! - `postgrest`: Supabase REST (PostgREST) adapter over `reqwest`
//! - `in_memory`: tests/dev adapter with scripted failures

pub mod in_memory;
pub mod postgrest;
pub mod r#trait;

pub use in_memory::{InMemoryRecordStore, StoreOp};
pub use postgrest::PostgrestStore;
pub use r#trait::{RecordStore, StoreError};
