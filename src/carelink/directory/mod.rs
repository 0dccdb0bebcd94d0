//! Public healthcare directory: doctors, labs, ambulances, pharmacies and
//! clinics, plus search suggestions.

pub mod client;
pub mod types;

pub use self::client::DirectoryClient;
pub use self::types::{Category, Listing, SearchFilters, Suggestion};
