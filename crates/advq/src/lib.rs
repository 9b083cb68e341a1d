//! advq: advanced search query compiler.
//!
//! Compiles media-library search queries such as
//! `artist:queen year<1980 NOT starred:y` and ordering lists such as
//! `-ranking, artist` into parameterized SQL, and prints the result for
//! inspection.

#![warn(missing_docs)]

pub mod cli;
