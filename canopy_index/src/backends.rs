// Copyright 2025 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Built-in spatial backends.

pub(crate) mod flatvec;
pub(crate) mod grid;
