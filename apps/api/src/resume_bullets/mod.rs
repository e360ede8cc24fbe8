// Saved resume bullets. Generated bullets are usually stored in batches.

pub mod handlers;
