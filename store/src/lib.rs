//! Flat-file item storage and the stats memo built on top of it.
//!
//! ## Layout
//!
//! ```text
//! data/items.json   top-level JSON array of items, pretty-printed
//! data/items.tmp    transient sibling used for atomic replacement
//! ```

pub mod persistence;
pub mod stats;

pub use persistence::ItemStore;
pub use persistence::StoreError;
pub use persistence::StoreMarker;
pub use stats::StatsCache;

/// Default location of the catalog document, relative to the working directory.
pub const DEFAULT_DATA_PATH: &str = "data/items.json";
