//! HTTP clients for the external collaborators.

mod catalog_client;
mod oracle_client;

pub use catalog_client::CatalogClient;
pub use oracle_client::ChatOracle;
