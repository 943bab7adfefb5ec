pub mod dataset;
pub mod job;
pub mod raw_table;
