pub mod data_processing;
pub mod file_io;
