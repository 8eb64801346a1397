// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Single-input stages backing the `Flow` operator methods.

pub(crate) mod async_stage;
pub(crate) mod flat_map;
pub(crate) mod iter_source;
pub(crate) mod map;
pub(crate) mod take;
