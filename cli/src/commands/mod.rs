// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Command implementations for the selfheal CLI

pub mod analyze;
pub mod config;
pub mod serve;

pub use self::analyze::AnalyzeArgs;
pub use self::config::ConfigCommand;
