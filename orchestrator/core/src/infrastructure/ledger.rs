// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Ledger
//!
//! Provides healing ledger functionality for the system.
//!
//! # Architecture
//!
//! - **Layer:** Infrastructure Layer
//! - **Purpose:** Implements the bounded in-memory execution ledger

use chrono::Utc;
use dashmap::DashMap;
use parking_lot::Mutex;
use std::collections::{BTreeMap, VecDeque};

use crate::domain::analysis::HealingRecommendation;
use crate::domain::healing::{ExecutionId, HealingExecution, HealingExecutionResult, HealingStatus};

#[derive(Default)]
struct LedgerIndex {
    order: VecDeque<ExecutionId>,
    total: u64,
    by_status: BTreeMap<HealingStatus, u64>,
}

/// Lifetime counters, unaffected by eviction
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LedgerCounts {
    pub total: u64,
    pub by_status: BTreeMap<HealingStatus, u64>,
}

pub struct HealingLedger {
    capacity: usize,
    entries: DashMap<ExecutionId, HealingExecution>,
    index: Mutex<LedgerIndex>,
}

impl HealingLedger {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            entries: DashMap::new(),
            index: Mutex::new(LedgerIndex::default()),
        }
    }

    pub fn append(&self, recommendation: &HealingRecommendation, result: &HealingExecutionResult) {
        let entry = HealingExecution {
            execution_id: result.execution_id,
            recommendation: recommendation.clone(),
            result: result.clone(),
            timestamp: Utc::now(),
        };

        let mut index = self.index.lock();
        index.total += 1;
        *index.by_status.entry(result.status).or_insert(0) += 1;
        index.order.push_back(entry.execution_id);
        self.entries.insert(entry.execution_id, entry);

        while index.order.len() > self.capacity {
            if let Some(evicted) = index.order.pop_front() {
                self.entries.remove(&evicted);
            }
        }
    }

    pub fn get(&self, id: &ExecutionId) -> Option<HealingExecution> {
        self.entries.get(id).map(|e| e.value().clone())
    }

    /// At most `limit` entries, newest first by append order
    pub fn history(&self, limit: usize) -> Vec<HealingExecution> {
        let index = self.index.lock();
        index
            .order
            .iter()
            .rev()
            .filter_map(|id| self.get(id))
            .take(limit)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn counts(&self) -> LedgerCounts {
        let index = self.index.lock();
        LedgerCounts {
            total: index.total,
            by_status: index.by_status.clone(),
        }
    }
}
