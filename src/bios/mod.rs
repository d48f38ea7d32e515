//! # BIOS Module
//!
//! Tables and transformations that mirror what the machine's own disk
//! routines do, kept separate so that images and file systems can share them.

pub mod skew;
