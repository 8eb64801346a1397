// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Source adapters: factories that build named streams from configuration.

mod file_lines;
mod inline;
mod registry;

pub use file_lines::FileLinesSourceFactory;
pub use inline::InlineSourceFactory;
pub use registry::SourceRegistry;
