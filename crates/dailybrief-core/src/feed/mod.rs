mod collector;
mod extract;
mod fetcher;
mod models;
mod parser;
mod score;

pub use collector::FeedCollector;
pub use fetcher::{FeedFetcher, FetchFeed};
pub use models::{Article, FeedItem};
pub use parser::parse_feed;
