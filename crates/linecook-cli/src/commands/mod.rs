pub mod batch;
pub mod extract;
pub mod print;
pub mod validate;
