//! `mailscribe` — draft email replies and summaries with a language model.
//!
//! The library extracts prompt text from HTML and MIME bodies, builds and
//! sends chat-completion requests, splices generated replies into compose
//! bodies without disturbing quotes or signatures, and renders markdown
//! summaries as sanitized HTML.

pub mod assistant;
pub mod completion;
pub mod config;
pub mod error;
pub mod extract;
pub mod host;
pub mod model;
pub mod render;
pub mod splice;
