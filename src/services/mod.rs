//! Services that can be selected at process entry.

pub mod notification;
