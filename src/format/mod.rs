// SPDX-FileCopyrightText: 2026 Scriven contributors
// SPDX-License-Identifier: MIT

//! Document text parsing/serialization.
//!
//! Markdown is the only supported text format; trees go in and out of it.

pub mod markdown;
