pub mod analyzers;
pub mod charts;
pub mod filters;
pub mod loader;
pub mod output;
pub mod prompt;
