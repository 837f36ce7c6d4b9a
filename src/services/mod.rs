pub mod diagnostics;
pub mod engine;
pub mod environment;
pub mod modules;
pub mod routing;
pub mod startup;
