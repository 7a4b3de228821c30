// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Presentation Layer (`selfheal-core`)
//!
//! HTTP surface that translates external requests into application service
//! calls. No pipeline logic lives here; all real work is delegated to
//! `crate::application`.
//!
//! | Module | Transport | Description |
//! |--------|-----------|-------------|
//! | [`api`] | HTTP (Axum) | Analysis, healing and monitoring endpoints |

pub mod api;
