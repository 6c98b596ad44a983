//! 盘面核心逻辑模块（状态模型、规则引擎等）。

pub mod rules;
pub mod state;

pub use rules::{
    MoveLastToGoalAction, MoveNextToColumnAction, RuleEngine, RuleError, RuleResolution,
};
pub use state::{
    BoardEvent,
    BoardState,
    CardValue,
    IntegrityError,
    StackIndex,
    COLUMN_COUNT,
    COPIES_PER_VALUE,
    GOAL_STACK_COUNT,
    SOURCE_STACK_COUNT,
    TOTAL_CARDS,
};
