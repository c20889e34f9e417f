pub mod config;
pub mod extract_file;
pub mod inst;
pub mod sim;
