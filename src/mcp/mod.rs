// SPDX-FileCopyrightText: 2026 Scriven contributors
// SPDX-License-Identifier: MIT

//! Model Context Protocol (MCP) server surface.
//!
//! The MCP layer is how an agent inspects documents and applies command
//! batches against their trees.

mod server;
mod types;

pub use server::ScrivenMcp;
