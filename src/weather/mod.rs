// Weather module.
// OpenWeatherMap geocoding and current conditions.

pub mod client;
pub mod types;

pub use client::{OpenWeatherClient, WeatherSource};
pub use types::{Coordinates, WeatherSnapshot};
