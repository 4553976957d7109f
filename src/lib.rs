pub mod cli;
pub mod compile;
pub mod config;
pub mod ctx;
pub mod error;
pub mod experiment;
pub mod io;
pub mod math;
pub mod pipeline;
pub mod schema;
pub mod squares;
