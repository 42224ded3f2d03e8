// Adapters layer: spreadsheet readers and report writers.

pub mod export;
pub mod reader;
