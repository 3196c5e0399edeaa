pub mod footer;
pub mod header;
pub mod overlay;

pub use footer::draw_footer;
pub use header::draw_header;
pub use overlay::{draw_overlay, stat_items};
