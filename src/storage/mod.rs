pub mod dataset;
pub mod results;
