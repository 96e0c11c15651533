pub mod analyze;
pub mod apply;
pub mod config;
pub mod recommend;
pub mod report;
