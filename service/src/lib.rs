pub mod processing;
pub mod routes;
pub mod state;
pub mod tools;
