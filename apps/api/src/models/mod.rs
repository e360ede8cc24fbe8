pub mod cover_letter;
pub mod job;
pub mod photo;
pub mod resume_bullet;
