//! CLI command implementations

pub mod cache;
pub mod combined;
pub mod config;
pub mod episodes;
pub mod movies;
pub mod report;
pub mod scan;

pub use cache::execute as cache;
pub use combined::execute as combined;
pub use config::execute as config;
pub use episodes::execute as episodes;
pub use movies::execute as movies;
