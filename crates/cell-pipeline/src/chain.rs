//! Ordered stage chains and their builder

use crate::stage::{Phase, Stage};
use cell_core::{CellContext, Outcome, Value};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, trace};

/// Which way a chain converts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// Text to typed value
    Decode,
    /// Typed value to text
    Encode,
}

impl Direction {
    /// Position of a phase within a chain of this direction.
    ///
    /// Trimmed text reaches the null checks, so blank cells count as empty.
    /// Decode validates the parsed value, so conversion precedes constraints.
    /// Encode validates the typed value before it is rendered.
    #[must_use]
    pub fn rank(self, phase: Phase) -> u8 {
        match (self, phase) {
            (_, Phase::Normalize) => 0,
            (_, Phase::Absence) => 1,
            (Self::Decode, Phase::Text) | (Self::Encode, Phase::Constrain) => 2,
            (_, Phase::Convert) => 3,
            (Self::Decode, Phase::Constrain) | (Self::Encode, Phase::Text) => 4,
            (_, Phase::Custom) => 5,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Decode => f.write_str("decode"),
            Self::Encode => f.write_str("encode"),
        }
    }
}

/// An immutable sequence of stages for one field and direction.
///
/// Cloning is cheap; clones share the stage list. A chain holds no mutable
/// state and can be run from many threads at once.
#[derive(Debug, Clone)]
pub struct Chain {
    direction: Direction,
    stages: Arc<[Stage]>,
}

impl Chain {
    /// Chain running `stages` in the given order.
    ///
    /// Use [`ChainBuilder`] to get the direction's canonical order.
    #[must_use]
    pub fn new(direction: Direction, stages: Vec<Stage>) -> Self {
        Self {
            direction,
            stages: stages.into(),
        }
    }

    /// Chain that returns its input unchanged.
    #[must_use]
    pub fn identity(direction: Direction) -> Self {
        Self::new(direction, Vec::new())
    }

    #[must_use]
    pub fn direction(&self) -> Direction {
        self.direction
    }

    #[must_use]
    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.stages.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Stage names joined in execution order, e.g. `Optional -> ParseNumber`.
    #[must_use]
    pub fn describe(&self) -> String {
        if self.stages.is_empty() {
            return "(identity)".to_string();
        }
        self.stages
            .iter()
            .map(Stage::name)
            .collect::<Vec<_>>()
            .join(" -> ")
    }

    /// Thread a value through every stage, stopping at the first failure.
    ///
    /// # Errors
    ///
    /// Returns the failure of the first stage that rejects the value.
    pub fn execute(&self, value: Value, context: &CellContext) -> Outcome<Value> {
        let mut value = value;
        for stage in self.stages.iter() {
            value = stage.execute(value, context).inspect_err(|failure| {
                trace!(
                    direction = %self.direction,
                    stage = stage.name(),
                    row = context.row(),
                    column = context.column(),
                    key = failure.message_key(),
                    "stage rejected value"
                );
            })?;
        }
        Ok(value)
    }

    /// Decode raw cell text. `None` stands for an absent cell.
    ///
    /// The raw text is attached to the context when the caller has not done
    /// so already.
    ///
    /// # Errors
    ///
    /// Returns the conversion or constraint failure that stopped the chain.
    pub fn decode(&self, raw: Option<&str>, context: &CellContext) -> Outcome<Value> {
        let value = raw.map_or(Value::Null, Value::text);
        if context.raw().is_none() && raw.is_some() {
            let context = context.clone().with_raw(raw);
            self.execute(value, &context)
        } else {
            self.execute(value, context)
        }
    }

    /// Encode a typed value.
    ///
    /// # Errors
    ///
    /// Returns the conversion or constraint failure that stopped the chain.
    pub fn encode(&self, value: Value, context: &CellContext) -> Outcome<Value> {
        self.execute(value, context)
    }
}

/// Collects stages and orders them for a direction.
///
/// Stages of the same phase keep their insertion order.
#[derive(Debug, Clone)]
pub struct ChainBuilder {
    direction: Direction,
    stages: Vec<Stage>,
}

impl ChainBuilder {
    #[must_use]
    pub fn new(direction: Direction) -> Self {
        Self {
            direction,
            stages: Vec::new(),
        }
    }

    #[must_use]
    pub fn decode() -> Self {
        Self::new(Direction::Decode)
    }

    #[must_use]
    pub fn encode() -> Self {
        Self::new(Direction::Encode)
    }

    #[must_use]
    pub fn stage(mut self, stage: impl Into<Stage>) -> Self {
        self.stages.push(stage.into());
        self
    }

    #[must_use]
    pub fn stages(mut self, stages: impl IntoIterator<Item = Stage>) -> Self {
        self.stages.extend(stages);
        self
    }

    pub fn push(&mut self, stage: impl Into<Stage>) {
        self.stages.push(stage.into());
    }

    #[must_use]
    pub fn build(mut self) -> Chain {
        let direction = self.direction;
        self.stages
            .sort_by_key(|stage| direction.rank(stage.phase()));
        let chain = Chain::new(direction, self.stages);
        debug!(%direction, stages = %chain.describe(), "built chain");
        chain
    }
}
