//! Story Chains
//!
//! - **`db`** - story rows, sequence assignment, hearts
//! - **`handlers`** - `/api/stories` endpoints

pub mod db;

pub mod handlers;

pub use handlers::{create_story, get_chain, heart_story, list_chains, next_chain_id};
