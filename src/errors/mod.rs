// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

mod config;
mod stream;

pub use config::ValidationError;
pub use stream::StreamError;
