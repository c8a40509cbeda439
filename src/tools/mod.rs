//! Tool implementations for Mallard.
//!
//! This module contains the implementations behind the MCP surface:
//! the search tool and the prompt generators.

pub mod prompts;
pub mod search;

pub use prompts::*;
pub use search::*;
