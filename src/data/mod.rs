//! Record model, CSV schema handling and file persistence for the PPP data set.

pub mod amount;
pub mod persist;
pub mod record;
pub mod schema;
pub mod store;
