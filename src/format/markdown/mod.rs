// SPDX-FileCopyrightText: 2026 Scriven contributors
// SPDX-License-Identifier: MIT

//! Markdown parsing and serialization.
//!
//! Parsing is CommonMark via `pulldown-cmark`; serialization walks the tree
//! back to text. The two are shape-stable: parsing the serialized text yields
//! a tree with the same kinds, depths, values, and child order (ids are
//! reassigned, they never survive a trip through text).

pub mod parse;
pub mod serialize;

pub use parse::parse_markdown;
pub use serialize::serialize_markdown;
