use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use super::state::{BoardEvent, BoardState, CardValue, IntegrityError, StackIndex};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MoveNextToColumnAction {
    pub column_index: StackIndex,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MoveLastToGoalAction {
    pub column_index: StackIndex,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type")]
pub enum RuleError {
    ColumnIndexOutOfRange {
        index: StackIndex,
        count: StackIndex,
    },
    SourceExhausted,
    IntegrityViolation {
        error: IntegrityError,
    },
}

/// 一次动作返回给前端的快照：新盘面加上本次产生的事件。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleResolution {
    pub state: BoardState,
    pub events: Vec<BoardEvent>,
}

impl RuleResolution {
    pub fn new(state: BoardState, events: Vec<BoardEvent>) -> Self {
        Self { state, events }
    }
}

/// 盘面规则引擎，持有抽牌用的随机源。
pub struct RuleEngine {
    rng: SmallRng,
}

impl RuleEngine {
    pub fn new() -> Self {
        Self {
            rng: SmallRng::from_entropy(),
        }
    }

    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: SmallRng::seed_from_u64(seed),
        }
    }

    fn ensure_column_index(index: StackIndex, count: usize) -> Result<(), RuleError> {
        if index as usize >= count {
            return Err(RuleError::ColumnIndexOutOfRange {
                index,
                count: count as StackIndex,
            });
        }
        Ok(())
    }

    fn ensure_integrity(state: &BoardState) -> Result<(), RuleError> {
        state
            .integrity_check()
            .map_err(|error| RuleError::IntegrityViolation { error })
    }

    /// 重新发牌并选出第一张可抽的牌。
    pub fn reset_board(&mut self, state: &mut BoardState) -> Vec<BoardEvent> {
        *state = BoardState::default();
        state.deal();

        let mut events = vec![BoardEvent::BoardDealt];
        let next = Self::pick_next_source(state, &mut self.rng);
        let picked = BoardEvent::NextSourcePicked { value: next };
        state.record_event(picked.clone());
        events.push(picked);
        events
    }

    /// 把当前可抽的牌移入目标列，之后重新选牌。
    pub fn move_next_to_column(
        &mut self,
        state: &mut BoardState,
        action: MoveNextToColumnAction,
    ) -> Result<Vec<BoardEvent>, RuleError> {
        Self::ensure_integrity(state)?;
        Self::ensure_column_index(action.column_index, state.columns.len())?;

        let value = state.next_source_value.ok_or(RuleError::SourceExhausted)?;
        let source_index =
            state
                .find_source_with_top(value)
                .ok_or(RuleError::IntegrityViolation {
                    error: IntegrityError::NextSourceUnavailable { value },
                })?;
        let card =
            state.source_stacks[source_index]
                .pop()
                .ok_or(RuleError::IntegrityViolation {
                    error: IntegrityError::NextSourceUnavailable { value },
                })?;
        state.columns[action.column_index as usize].push(card);

        let mut events = Vec::new();
        let moved = BoardEvent::CardMovedToColumn {
            value: card,
            source_index: source_index as StackIndex,
            column_index: action.column_index,
        };
        state.record_event(moved.clone());
        events.push(moved);

        let next = Self::pick_next_source(state, &mut self.rng);
        let picked = BoardEvent::NextSourcePicked { value: next };
        state.record_event(picked.clone());
        events.push(picked);

        Ok(events)
    }

    /// 尝试把列顶的牌晋升到第一个能接收它的目标堆。
    pub fn move_last_to_goal(
        &mut self,
        state: &mut BoardState,
        action: MoveLastToGoalAction,
    ) -> Result<Vec<BoardEvent>, RuleError> {
        Self::ensure_integrity(state)?;
        Self::ensure_column_index(action.column_index, state.columns.len())?;

        // 空列与当前不合法的晋升都静默拒绝，盘面保持原样。
        let card = match state.top_of_column(action.column_index as usize) {
            Some(card) => card,
            None => return Ok(Vec::new()),
        };
        let goal_index = match state.goal_index_for(card) {
            Some(goal_index) => goal_index,
            None => return Ok(Vec::new()),
        };

        state.columns[action.column_index as usize].pop();
        state.goal_stacks[goal_index].push(card);

        let promoted = BoardEvent::CardPromoted {
            value: card,
            column_index: action.column_index,
            goal_index: goal_index as StackIndex,
        };
        state.record_event(promoted.clone());
        Ok(vec![promoted])
    }

    /// 在所有非空来源堆的顶牌里随机选出下一张可抽的牌。
    /// 候选一堆一项，顶牌相同的数值按堆数加权。
    pub fn pick_next_source(state: &mut BoardState, rng: &mut impl Rng) -> Option<CardValue> {
        let candidates = state.source_top_values();
        let value = if candidates.is_empty() {
            None
        } else {
            Some(candidates[rng.gen_range(0..candidates.len())])
        };
        state.next_source_value = value;
        value
    }
}

impl Default for RuleEngine {
    fn default() -> Self {
        Self::new()
    }
}
