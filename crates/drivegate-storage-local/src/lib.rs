//! Local filesystem storage backend.
//!
//! Objects live under `{root}/{space_id}/{suffix}_{filename}`; the random
//! suffix makes concurrent uploads from the same space non-colliding and
//! keeps deleted locators from ever being reused.

mod backend;

pub use backend::LocalFileBackend;
