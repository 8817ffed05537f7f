// Copyright 2026 The Vigil Project
// SPDX-License-Identifier: Apache-2.0

pub mod config;
pub mod eval;
pub mod evidence;
pub mod fusion;
pub mod keywords;
pub mod normalize;
pub mod signal;
pub mod validate;
