//! Geoapify geocoding and boundary API client.

mod client;
mod wire;

pub use client::GeoapifyClient;
