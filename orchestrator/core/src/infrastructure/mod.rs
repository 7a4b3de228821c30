// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

pub mod healing_actions;
pub mod json_extract;
pub mod ledger;
pub mod llm;
pub mod mock_analysis;
pub mod recent_errors;
pub mod service_context;

pub use healing_actions::HealingActions;
pub use ledger::{HealingLedger, LedgerCounts};
pub use recent_errors::RecentErrorWindow;
