// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! N-ary combinators: fan-in (merge, concat, zip) and fan-out (broadcast).

pub(crate) mod broadcast;
pub(crate) mod concat;
pub(crate) mod merge;
pub(crate) mod zip;
