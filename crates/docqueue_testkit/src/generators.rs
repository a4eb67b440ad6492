//! Property-based test generators.
//!
//! Provides proptest strategies for operation scripts run against a
//! manager, and a sequential model to check them against.

use proptest::prelude::*;
use serde_json::{json, Value};

/// One step of a script run against a manager holding `{"counter": n}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptOp {
    /// Plain write of `{"counter": value}`.
    Write(i64),
    /// Plain read; must observe the model's current value.
    Read,
    /// Transaction adding `delta` to the counter.
    Update(i64),
}

impl ScriptOp {
    /// The document a plain write of `value` produces.
    #[must_use]
    pub fn document(value: i64) -> Value {
        json!({ "counter": value })
    }
}

/// Strategy for a single script step.
pub fn script_op_strategy() -> impl Strategy<Value = ScriptOp> {
    prop_oneof![
        3 => (-1000i64..1000).prop_map(ScriptOp::Write),
        3 => Just(ScriptOp::Read),
        2 => (-10i64..10).prop_map(ScriptOp::Update),
    ]
}

/// Strategy for a script of up to `max_len` steps.
pub fn script_strategy(max_len: usize) -> impl Strategy<Value = Vec<ScriptOp>> {
    prop::collection::vec(script_op_strategy(), 1..=max_len)
}

/// Strategy for a thread count and a per-thread update count.
pub fn contention_strategy() -> impl Strategy<Value = (usize, usize)> {
    (1usize..6, 1usize..12)
}

/// Sequential model of a script: the counter each read should observe and
/// every document stored, in order.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ScriptModel {
    /// Current counter value; absent until the first write.
    pub counter: Option<i64>,
    /// Expected result of each read, in order.
    pub reads: Vec<Value>,
    /// Expected stored documents, in order.
    pub stores: Vec<Value>,
}

impl ScriptModel {
    /// Runs `script` through the model.
    #[must_use]
    pub fn run(script: &[ScriptOp]) -> Self {
        let mut model = Self::default();
        for op in script {
            model.apply(op);
        }
        model
    }

    fn current(&self) -> Value {
        self.counter.map_or_else(|| json!({}), ScriptOp::document)
    }

    fn apply(&mut self, op: &ScriptOp) {
        match op {
            ScriptOp::Write(value) => {
                self.counter = Some(*value);
                self.stores.push(ScriptOp::document(*value));
            }
            ScriptOp::Read => self.reads.push(self.current()),
            ScriptOp::Update(delta) => {
                let next = self.counter.unwrap_or(0) + delta;
                self.counter = Some(next);
                self.stores.push(ScriptOp::document(next));
            }
        }
    }
}

/// Configuration for property tests.
#[derive(Debug, Clone)]
pub struct PropTestConfig {
    /// Number of test cases to run.
    pub cases: u32,
    /// Maximum shrink iterations.
    pub max_shrink_iters: u32,
}

impl Default for PropTestConfig {
    fn default() -> Self {
        Self {
            cases: 64,
            max_shrink_iters: 500,
        }
    }
}

impl PropTestConfig {
    /// Creates a config for quick tests.
    #[must_use]
    pub fn quick() -> Self {
        Self {
            cases: 16,
            max_shrink_iters: 50,
        }
    }

    /// Creates a config for thorough tests.
    #[must_use]
    pub fn thorough() -> Self {
        Self {
            cases: 256,
            max_shrink_iters: 2000,
        }
    }

    /// Converts to proptest config.
    #[must_use]
    pub fn to_proptest_config(&self) -> proptest::test_runner::Config {
        proptest::test_runner::Config {
            cases: self.cases,
            max_shrink_iters: self.max_shrink_iters,
            ..Default::default()
        }
    }
}
