//! Wire types shared by the catalog server, its HTTP client and the TUI.

pub mod api;
pub mod item;
pub mod stats;

pub use api::ErrorBody;
pub use api::ItemsPage;
pub use api::ListQuery;
pub use item::Item;
pub use stats::Stats;

/// Base URL the client talks to when nothing else is configured.
pub const DEFAULT_BASE_URL: &str = "http://localhost:3001";

/// Route prefix for the item collection.
pub const ITEMS_PATH: &str = "/api/items";

/// Route for the category statistics.
pub const STATS_PATH: &str = "/api/stats";
