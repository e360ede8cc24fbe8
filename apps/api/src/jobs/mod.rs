// Job application records: the tracker's core CRUD surface.

pub mod handlers;
