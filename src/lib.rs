pub mod charts;
pub mod config;
pub mod dataset;
pub mod output;
pub mod parser;
pub mod pipeline;
pub mod preprocess;
pub mod report;
pub mod stats;
