use std::str::FromStr;

use rand::rngs::SmallRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use crate::game::{BoardState, MoveLastToGoalAction, MoveNextToColumnAction, StackIndex};

/// 盘面支持的三个用户动作，按标签分发。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type")]
pub enum BoardAction {
    Reset,
    MoveNextToColumn { action: MoveNextToColumnAction },
    MoveLastToGoal { action: MoveLastToGoalAction },
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum HintStrategy {
    Greedy,
    Random,
}

impl FromStr for HintStrategy {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "greedy" | "default" => Ok(HintStrategy::Greedy),
            "random" => Ok(HintStrategy::Random),
            _ => Err(()),
        }
    }
}

impl Default for HintStrategy {
    fn default() -> Self {
        HintStrategy::Greedy
    }
}

/// 提示结果：建议的动作，外加可供界面高亮的可晋升列。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HintDecision {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action: Option<BoardAction>,
    pub promotable_columns: Vec<StackIndex>,
    pub strategy: HintStrategy,
}

/// 走子建议器，只读盘面，不做任何修改。
pub struct HintAdvisor {
    strategy: HintStrategy,
    rng: SmallRng,
}

impl HintAdvisor {
    pub fn new(strategy: HintStrategy) -> Self {
        Self {
            strategy,
            rng: SmallRng::from_entropy(),
        }
    }

    pub fn with_seed(strategy: HintStrategy, seed: u64) -> Self {
        Self {
            strategy,
            rng: SmallRng::seed_from_u64(seed),
        }
    }

    pub fn suggest(&mut self, state: &BoardState) -> HintDecision {
        let promotable: Vec<StackIndex> = state
            .columns
            .iter()
            .enumerate()
            .filter(|(_, column)| {
                column
                    .last()
                    .map_or(false, |&card| state.goal_index_for(card).is_some())
            })
            .map(|(index, _)| index as StackIndex)
            .collect();

        let action = match self.strategy {
            HintStrategy::Greedy => Self::greedy_action(state, &promotable),
            HintStrategy::Random => self.random_action(state, &promotable),
        };

        HintDecision {
            action,
            promotable_columns: promotable,
            strategy: self.strategy,
        }
    }

    fn greedy_action(state: &BoardState, promotable: &[StackIndex]) -> Option<BoardAction> {
        if let Some(&column_index) = promotable.first() {
            return Some(BoardAction::MoveLastToGoal {
                action: MoveLastToGoalAction { column_index },
            });
        }
        if state.next_source_value.is_some() {
            // 落到当前最矮的列，下标小的优先。
            let column_index = state
                .columns
                .iter()
                .enumerate()
                .min_by_key(|(index, column)| (column.len(), *index))
                .map(|(index, _)| index as StackIndex)?;
            return Some(BoardAction::MoveNextToColumn {
                action: MoveNextToColumnAction { column_index },
            });
        }
        None
    }

    fn random_action(&mut self, state: &BoardState, promotable: &[StackIndex]) -> Option<BoardAction> {
        let mut moves: Vec<BoardAction> = promotable
            .iter()
            .map(|&column_index| BoardAction::MoveLastToGoal {
                action: MoveLastToGoalAction { column_index },
            })
            .collect();
        if state.next_source_value.is_some() {
            moves.extend((0..state.columns.len()).map(|index| BoardAction::MoveNextToColumn {
                action: MoveNextToColumnAction {
                    column_index: index as StackIndex,
                },
            }));
        }
        moves.choose(&mut self.rng).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::{COLUMN_COUNT, SOURCE_STACK_COUNT};

    fn board_with_promotable_one() -> BoardState {
        let mut state = BoardState::default();
        state.deal();
        if let Some(card) = state.source_stacks[0].pop() {
            state.columns[2].push(card);
        }
        state.next_source_value = Some(4);
        state
    }

    #[test]
    fn hint_prefers_promotion_when_available() {
        let mut advisor = HintAdvisor::with_seed(HintStrategy::Greedy, 1);
        let state = board_with_promotable_one();

        let decision = advisor.suggest(&state);

        assert_eq!(decision.promotable_columns, vec![2]);
        assert_eq!(
            decision.action,
            Some(BoardAction::MoveLastToGoal {
                action: MoveLastToGoalAction { column_index: 2 }
            })
        );
    }

    #[test]
    fn hint_suggests_shortest_column_for_draw() {
        let mut advisor = HintAdvisor::with_seed(HintStrategy::Greedy, 1);
        let mut state = BoardState::default();
        state.deal();
        // 列 0 放一张 5，其余列为空；5 进不了任何目标堆。
        if let Some(card) = state.source_stacks[4].pop() {
            state.columns[0].push(card);
        }
        state.next_source_value = Some(4);

        let decision = advisor.suggest(&state);

        assert!(decision.promotable_columns.is_empty());
        assert_eq!(
            decision.action,
            Some(BoardAction::MoveNextToColumn {
                action: MoveNextToColumnAction { column_index: 1 }
            })
        );
    }

    #[test]
    fn hint_returns_no_action_on_exhausted_board() {
        let mut advisor = HintAdvisor::with_seed(HintStrategy::Greedy, 1);
        let mut state = BoardState::default();
        state.deal();
        // 清空全部来源堆；各列顶牌都无法晋升。
        for index in 0..SOURCE_STACK_COUNT {
            while let Some(card) = state.source_stacks[index].pop() {
                state.columns[index % COLUMN_COUNT].push(card);
            }
        }
        state.next_source_value = None;

        let decision = advisor.suggest(&state);

        assert!(decision.action.is_none());
        assert!(decision.promotable_columns.is_empty());
    }

    #[test]
    fn random_hint_only_returns_legal_moves() {
        let mut advisor = HintAdvisor::with_seed(HintStrategy::Random, 9);
        let state = board_with_promotable_one();

        for _ in 0..20 {
            let decision = advisor.suggest(&state);
            match decision.action.expect("legal moves exist") {
                BoardAction::MoveLastToGoal { action } => {
                    assert_eq!(action.column_index, 2, "only column 2 is promotable");
                }
                BoardAction::MoveNextToColumn { action } => {
                    assert!((action.column_index as usize) < COLUMN_COUNT);
                }
                BoardAction::Reset => panic!("the advisor never suggests a reset"),
            }
        }
    }
}
