pub mod compare;
pub mod download;
pub mod filter;
pub mod generate;
