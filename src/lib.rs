//! Backend of the halal restaurant finder: restaurants with favorites and
//! ratings, a shelter registry, a food donation directory and recipe ideas
//! generated from picked ingredients.
//!
//! All state lives in memory and is gone when the process exits.

pub mod config;
pub mod data;
pub mod directory;
pub mod error;
pub mod rating;
pub mod recipe;
pub mod search;
pub mod store;

pub use error::{RecipeError, StoreError};
pub use store::{Entry, ListStore, Record, RecordId};
