// Saved cover letters, generated or written by hand.

pub mod handlers;
