pub mod analyze;
pub mod export;
pub mod kb;
pub mod scan;
