pub mod checks;
pub mod entities;
pub mod errors;
pub mod report;
