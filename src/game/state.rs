use serde::{Deserialize, Serialize};

/// 来源堆数量。
pub const SOURCE_STACK_COUNT: usize = 16;
/// 每个数值的牌数。
pub const COPIES_PER_VALUE: usize = 6;
/// 中间列数量。
pub const COLUMN_COUNT: usize = 6;
/// 目标堆数量。
pub const GOAL_STACK_COUNT: usize = 6;
/// 整盘牌的总数。
pub const TOTAL_CARDS: usize = SOURCE_STACK_COUNT * COPIES_PER_VALUE;

/// 牌面数值（1..=16）。
pub type CardValue = u8;
/// 堆／列在各自序列中的下标。
pub type StackIndex = u8;

/// 盘面事件流，供前端做动画与调试回放。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type")]
pub enum BoardEvent {
    BoardDealt,
    NextSourcePicked {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        value: Option<CardValue>,
    },
    CardMovedToColumn {
        value: CardValue,
        source_index: StackIndex,
        column_index: StackIndex,
    },
    CardPromoted {
        value: CardValue,
        column_index: StackIndex,
        goal_index: StackIndex,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type")]
pub enum IntegrityError {
    SourceStackCountMismatch {
        expected: usize,
        actual: usize,
    },
    ColumnCountMismatch {
        expected: usize,
        actual: usize,
    },
    GoalStackCountMismatch {
        expected: usize,
        actual: usize,
    },
    ForeignCardInSource {
        source_index: StackIndex,
        expected: CardValue,
    },
    ValueOutOfRange {
        value: CardValue,
    },
    GoalOrderBroken {
        goal_index: StackIndex,
    },
    CardCountMismatch {
        expected: usize,
        actual: usize,
    },
    NextSourceUnavailable {
        value: CardValue,
    },
    NextSourceMissing,
}

/// 盘面整体状态。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BoardState {
    #[serde(default)]
    pub source_stacks: Vec<Vec<CardValue>>,
    #[serde(default)]
    pub columns: Vec<Vec<CardValue>>,
    #[serde(default)]
    pub goal_stacks: Vec<Vec<CardValue>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_source_value: Option<CardValue>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub event_log: Vec<BoardEvent>,
}

impl BoardState {
    /// 重新发牌：堆 i 放入 6 张数值 i+1 的牌，列与目标堆清空。
    pub fn deal(&mut self) {
        self.source_stacks = (0..SOURCE_STACK_COUNT)
            .map(|index| vec![index as CardValue + 1; COPIES_PER_VALUE])
            .collect();
        self.columns = vec![Vec::new(); COLUMN_COUNT];
        self.goal_stacks = vec![Vec::new(); GOAL_STACK_COUNT];
        self.next_source_value = None;
        self.record_event(BoardEvent::BoardDealt);
    }

    pub fn record_event(&mut self, event: BoardEvent) {
        self.event_log.push(event);
    }

    /// 每个非空来源堆的顶牌，一堆一项；顶牌相同的堆各占一项。
    pub fn source_top_values(&self) -> Vec<CardValue> {
        self.source_stacks
            .iter()
            .filter_map(|stack| stack.last().copied())
            .collect()
    }

    pub fn find_source_with_top(&self, value: CardValue) -> Option<usize> {
        self.source_stacks
            .iter()
            .position(|stack| stack.last() == Some(&value))
    }

    pub fn top_of_column(&self, column_index: usize) -> Option<CardValue> {
        self.columns
            .get(column_index)
            .and_then(|column| column.last().copied())
    }

    /// 能接收这张牌的第一个目标堆：1 进第一个空堆，其余接在 card-1 之上。
    pub fn goal_index_for(&self, card: CardValue) -> Option<usize> {
        if card > 1 {
            self.goal_stacks
                .iter()
                .position(|goal| goal.last() == Some(&(card - 1)))
        } else {
            self.goal_stacks.iter().position(|goal| goal.is_empty())
        }
    }

    pub fn total_cards(&self) -> usize {
        let in_sources: usize = self.source_stacks.iter().map(Vec::len).sum();
        let in_columns: usize = self.columns.iter().map(Vec::len).sum();
        let in_goals: usize = self.goal_stacks.iter().map(Vec::len).sum();
        in_sources + in_columns + in_goals
    }

    pub fn all_sources_empty(&self) -> bool {
        self.source_stacks.iter().all(|stack| stack.is_empty())
    }

    pub fn integrity_check(&self) -> Result<(), IntegrityError> {
        if self.source_stacks.len() != SOURCE_STACK_COUNT {
            return Err(IntegrityError::SourceStackCountMismatch {
                expected: SOURCE_STACK_COUNT,
                actual: self.source_stacks.len(),
            });
        }
        if self.columns.len() != COLUMN_COUNT {
            return Err(IntegrityError::ColumnCountMismatch {
                expected: COLUMN_COUNT,
                actual: self.columns.len(),
            });
        }
        if self.goal_stacks.len() != GOAL_STACK_COUNT {
            return Err(IntegrityError::GoalStackCountMismatch {
                expected: GOAL_STACK_COUNT,
                actual: self.goal_stacks.len(),
            });
        }

        // 来源堆只出不进，堆 i 里永远只有数值 i+1。
        for (index, stack) in self.source_stacks.iter().enumerate() {
            let expected = index as CardValue + 1;
            if stack.iter().any(|&card| card != expected) {
                return Err(IntegrityError::ForeignCardInSource {
                    source_index: index as StackIndex,
                    expected,
                });
            }
        }

        for column in &self.columns {
            for &card in column {
                if card == 0 || card as usize > SOURCE_STACK_COUNT {
                    return Err(IntegrityError::ValueOutOfRange { value: card });
                }
            }
        }

        // 目标堆自底向上必须是 1, 2, …, len。
        for (index, goal) in self.goal_stacks.iter().enumerate() {
            for (height, &card) in goal.iter().enumerate() {
                if card as usize != height + 1 {
                    return Err(IntegrityError::GoalOrderBroken {
                        goal_index: index as StackIndex,
                    });
                }
            }
        }

        let actual = self.total_cards();
        if actual != TOTAL_CARDS {
            return Err(IntegrityError::CardCountMismatch {
                expected: TOTAL_CARDS,
                actual,
            });
        }

        match self.next_source_value {
            Some(value) => {
                if self.find_source_with_top(value).is_none() {
                    return Err(IntegrityError::NextSourceUnavailable { value });
                }
            }
            None => {
                if !self.all_sources_empty() {
                    return Err(IntegrityError::NextSourceMissing);
                }
            }
        }

        Ok(())
    }

    /// 返回一个已走两步的示例盘面，方便前端调试或初始化。
    pub fn sample() -> Self {
        let mut state = BoardState::default();
        state.deal();

        // 两张 1 进列 0，顶上那张再晋升到目标堆 0。
        for _ in 0..2 {
            if let Some(card) = state.source_stacks[0].pop() {
                state.columns[0].push(card);
                state.record_event(BoardEvent::CardMovedToColumn {
                    value: card,
                    source_index: 0,
                    column_index: 0,
                });
            }
        }
        if let Some(card) = state.columns[0].pop() {
            state.goal_stacks[0].push(card);
            state.record_event(BoardEvent::CardPromoted {
                value: card,
                column_index: 0,
                goal_index: 0,
            });
        }

        // 固定下一张可抽的牌，保证示例盘面可复现。
        state.next_source_value = Some(2);
        state.record_event(BoardEvent::NextSourcePicked { value: Some(2) });
        state
    }
}

impl Default for BoardState {
    fn default() -> Self {
        Self {
            source_stacks: Vec::new(),
            columns: Vec::new(),
            goal_stacks: Vec::new(),
            next_source_value: None,
            event_log: Vec::new(),
        }
    }
}
