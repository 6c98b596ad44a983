//! 提示模块（给前端的走子建议）。

pub mod advisor;

pub use advisor::{BoardAction, HintAdvisor, HintDecision, HintStrategy};
