pub mod engine;
pub mod journal;
pub mod limits;
pub mod model;
pub mod observability;
pub mod shell;
pub mod snapshot;
pub mod sql;
pub mod store;
pub mod validate;
