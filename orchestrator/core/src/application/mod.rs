// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

pub mod analysis_orchestrator;
pub mod healing_executor;
pub mod insight_generator;
pub mod pattern_store;
pub mod runtime;

pub use analysis_orchestrator::AnalysisOrchestrator;
pub use healing_executor::HealingExecutor;
pub use insight_generator::InsightGenerator;
pub use pattern_store::{PatternStore, RecordOutcome};
pub use runtime::{HealingCycle, HealingRuntime};
