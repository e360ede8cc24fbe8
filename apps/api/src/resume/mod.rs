// Resume text extraction from uploaded PDFs and screenshots.

pub mod extract;
pub mod handlers;
