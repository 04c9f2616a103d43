pub mod csv;
pub mod reports;
pub mod text;
