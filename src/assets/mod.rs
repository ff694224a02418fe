mod cache;
mod feed;

pub use cache::{AssetPriceCache, DEFAULT_SEARCH_LIMIT, DEFAULT_STALENESS};
pub use feed::{AssetFeed, HttpAssetFeed, DEFAULT_FEED_URL, DEFAULT_FETCH_TIMEOUT};
