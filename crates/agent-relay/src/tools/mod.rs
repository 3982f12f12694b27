//! A set of demo tools that the router agent uses.

mod translator;
mod weather;

pub use translator::HandOffToTranslatorTool;
pub use weather::LookupWeatherTool;
