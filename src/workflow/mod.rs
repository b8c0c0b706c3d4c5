pub mod context;
pub mod directory;
pub mod engine;
pub mod error;
pub mod reports;
pub mod schema;
pub mod status;
pub mod transitions;
