//! Wire formats: the JSON configuration document and the shell's
//! desktop-toolbar records.

pub mod appbar;
pub mod document;
