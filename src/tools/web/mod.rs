//! Web tools (search, weather)

pub mod search;
pub mod weather;

pub use search::{SearchProvider, SearchResult, WebSearchTool};
pub use weather::WeatherTool;
