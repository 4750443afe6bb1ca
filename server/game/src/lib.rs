#![allow(
    clippy::must_use_candidate,
    clippy::module_name_repetitions,
    clippy::cast_possible_truncation,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::wildcard_imports,
    clippy::redundant_closure_for_method_calls
)]

pub mod config;
pub mod console;
pub mod data;
pub mod identity;
pub mod managers;
pub mod server;
pub mod store;
pub mod texture;
pub mod util;
