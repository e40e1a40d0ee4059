pub mod cache;
pub mod file_time;
pub mod matching;
pub mod scan_file;
