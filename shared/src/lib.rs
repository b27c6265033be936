pub mod coordinates;
pub mod models;
