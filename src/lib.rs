pub mod entropy_coding;
pub mod helpers;
pub mod macros;
