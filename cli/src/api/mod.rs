pub mod client;
pub mod models;

pub use client::{FeedClient, FeedSource, USGS_ALL_DAY_URL};
