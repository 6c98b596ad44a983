pub mod game;
pub mod hint;

use gloo_timers::future::TimeoutFuture;
use serde::Serialize;
use serde_json;
use serde_wasm_bindgen::{from_value, to_value};
use std::str::FromStr;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::future_to_promise;
use web_sys::js_sys::Promise;

pub use game::{
    BoardEvent, BoardState, CardValue, IntegrityError, MoveLastToGoalAction,
    MoveNextToColumnAction, RuleEngine, RuleError, RuleResolution, StackIndex, COLUMN_COUNT,
    COPIES_PER_VALUE, GOAL_STACK_COUNT, SOURCE_STACK_COUNT, TOTAL_CARDS,
};
pub use hint::{BoardAction, HintAdvisor, HintDecision, HintStrategy};

#[cfg(feature = "wee_alloc")]
#[global_allocator]
static ALLOC: wee_alloc::WeeAlloc = wee_alloc::WeeAlloc::INIT;

#[wasm_bindgen(start)]
pub fn start() {
    set_panic_hook();
}

#[wasm_bindgen]
pub fn greet(name: &str) -> String {
    let message = format!("你好，{name}! 欢迎来到纸牌桌。");
    web_sys::console::log_1(&message.clone().into());
    message
}

fn make_resolution(state: BoardState, events: Vec<BoardEvent>) -> RuleResolution {
    RuleResolution::new(state, events)
}

fn to_js_error(error: RuleError) -> JsValue {
    to_value(&error).unwrap_or_else(|serialize_err| JsValue::from_str(&serialize_err.to_string()))
}

fn serde_to_js_error<E: std::fmt::Display>(error: E) -> JsValue {
    JsValue::from_str(&error.to_string())
}

fn make_resolution_json(resolution: RuleResolution) -> Result<String, JsValue> {
    serde_json::to_string(&resolution).map_err(serde_to_js_error)
}

fn resolution_from_events(state: &BoardState, events: Vec<BoardEvent>) -> RuleResolution {
    RuleResolution::new(state.clone(), events)
}

fn engine_for_seed(seed: Option<u64>) -> RuleEngine {
    match seed {
        Some(seed) => RuleEngine::with_seed(seed),
        None => RuleEngine::new(),
    }
}

#[derive(Serialize)]
struct HintMoveResponse {
    decision: HintDecision,
    #[serde(skip_serializing_if = "Option::is_none")]
    applied: Option<RuleResolution>,
}

#[wasm_bindgen]
pub struct BoardEngine {
    state: BoardState,
    engine: RuleEngine,
}

#[wasm_bindgen]
impl BoardEngine {
    #[wasm_bindgen(constructor)]
    pub fn new(initial_state_json: Option<String>) -> Result<BoardEngine, JsValue> {
        let mut engine = RuleEngine::new();
        let state = if let Some(json) = initial_state_json {
            serde_json::from_str(&json).map_err(serde_to_js_error)?
        } else {
            let mut state = BoardState::default();
            engine.reset_board(&mut state);
            state
        };
        Ok(BoardEngine { state, engine })
    }

    /// 用固定种子创建引擎，整局抽牌序列可复现。
    pub fn with_seed(seed: u64) -> BoardEngine {
        let mut engine = RuleEngine::with_seed(seed);
        let mut state = BoardState::default();
        engine.reset_board(&mut state);
        BoardEngine { state, engine }
    }

    pub fn state_json(&self) -> Result<String, JsValue> {
        serde_json::to_string(&self.state).map_err(serde_to_js_error)
    }

    pub fn set_state_json(&mut self, json: &str) -> Result<(), JsValue> {
        let state: BoardState = serde_json::from_str(json).map_err(serde_to_js_error)?;
        self.state = state;
        Ok(())
    }

    pub fn reset(&mut self) -> Result<String, JsValue> {
        let events = self.engine.reset_board(&mut self.state);
        make_resolution_json(resolution_from_events(&self.state, events))
    }

    pub fn move_next_to_column(&mut self, column_index: u8) -> Result<String, JsValue> {
        let events = self
            .engine
            .move_next_to_column(&mut self.state, MoveNextToColumnAction { column_index })
            .map_err(to_js_error)?;
        make_resolution_json(resolution_from_events(&self.state, events))
    }

    pub fn move_last_to_goal(&mut self, column_index: u8) -> Result<String, JsValue> {
        let events = self
            .engine
            .move_last_to_goal(&mut self.state, MoveLastToGoalAction { column_index })
            .map_err(to_js_error)?;
        make_resolution_json(resolution_from_events(&self.state, events))
    }

    pub fn apply_hint(&mut self, strategy: Option<String>) -> Result<String, JsValue> {
        let strategy = strategy
            .as_deref()
            .and_then(|value| HintStrategy::from_str(value).ok())
            .unwrap_or_default();

        // 先在盘面副本上出提示，再应用建议的动作。
        let state_for_hint = self.state.clone();
        let mut advisor = HintAdvisor::new(strategy);
        let decision = advisor.suggest(&state_for_hint);

        let applied = if let Some(action) = decision.action.clone() {
            Some(self.apply_board_action(action)?)
        } else {
            None
        };

        let response = HintMoveResponse { decision, applied };
        serde_json::to_string(&response).map_err(serde_to_js_error)
    }

    pub fn think_hint(&self, strategy: Option<String>, delay_ms: Option<u32>) -> Promise {
        let state = self.state.clone();
        let strategy = strategy
            .and_then(|value| HintStrategy::from_str(&value).ok())
            .unwrap_or_default();
        let delay = delay_ms.unwrap_or(0);

        future_to_promise(async move {
            if delay > 0 {
                TimeoutFuture::new(delay).await;
            }
            let mut advisor = HintAdvisor::new(strategy);
            let decision = advisor.suggest(&state);
            let json = serde_json::to_string(&decision).map_err(serde_to_js_error)?;
            Ok(JsValue::from_str(&json))
        })
    }

    fn apply_board_action(&mut self, action: BoardAction) -> Result<RuleResolution, JsValue> {
        match action {
            BoardAction::Reset => {
                let events = self.engine.reset_board(&mut self.state);
                Ok(resolution_from_events(&self.state, events))
            }
            BoardAction::MoveNextToColumn { action } => {
                let events = self
                    .engine
                    .move_next_to_column(&mut self.state, action)
                    .map_err(to_js_error)?;
                Ok(resolution_from_events(&self.state, events))
            }
            BoardAction::MoveLastToGoal { action } => {
                let events = self
                    .engine
                    .move_last_to_goal(&mut self.state, action)
                    .map_err(to_js_error)?;
                Ok(resolution_from_events(&self.state, events))
            }
        }
    }
}

/// 返回一个示例盘面状态，方便前端调试或初始化。
#[wasm_bindgen(js_name = "createBoardState")]
pub fn create_board_state() -> Result<JsValue, JsValue> {
    to_value(&BoardState::sample()).map_err(JsValue::from)
}

/// 将传入的盘面状态深拷贝后返回。
#[wasm_bindgen(js_name = "cloneBoardState")]
pub fn clone_board_state(state: JsValue) -> Result<JsValue, JsValue> {
    let state: BoardState = from_value(state).map_err(JsValue::from)?;
    let cloned = state.clone();
    to_value(&cloned).map_err(JsValue::from)
}

/// 重新发牌；传入种子可复现抽牌序列。
#[wasm_bindgen(js_name = "resetBoard")]
pub fn reset_board(seed: Option<u64>) -> Result<JsValue, JsValue> {
    let mut engine = engine_for_seed(seed);
    let mut state = BoardState::default();
    let events = engine.reset_board(&mut state);
    to_value(&make_resolution(state, events)).map_err(JsValue::from)
}

#[wasm_bindgen(js_name = "moveNextToColumn")]
pub fn move_next_to_column(
    state: JsValue,
    column_index: u8,
    seed: Option<u64>,
) -> Result<JsValue, JsValue> {
    let mut state: BoardState = from_value(state).map_err(JsValue::from)?;
    let mut engine = engine_for_seed(seed);
    match engine.move_next_to_column(&mut state, MoveNextToColumnAction { column_index }) {
        Ok(events) => to_value(&make_resolution(state, events)).map_err(JsValue::from),
        Err(error) => Err(to_js_error(error)),
    }
}

#[wasm_bindgen(js_name = "moveLastToGoal")]
pub fn move_last_to_goal(state: JsValue, column_index: u8) -> Result<JsValue, JsValue> {
    let mut state: BoardState = from_value(state).map_err(JsValue::from)?;
    let mut engine = RuleEngine::new();
    match engine.move_last_to_goal(&mut state, MoveLastToGoalAction { column_index }) {
        Ok(events) => to_value(&make_resolution(state, events)).map_err(JsValue::from),
        Err(error) => Err(to_js_error(error)),
    }
}

#[wasm_bindgen(js_name = "validateState")]
pub fn validate_state(state: JsValue) -> Result<(), JsValue> {
    let state: BoardState = from_value(state).map_err(JsValue::from)?;
    state
        .integrity_check()
        .map_err(|error| to_js_error(RuleError::IntegrityViolation { error }))?;
    Ok(())
}

#[wasm_bindgen(js_name = "computeHint")]
pub fn compute_hint(
    state: JsValue,
    strategy: Option<String>,
    seed: Option<u64>,
) -> Result<JsValue, JsValue> {
    let state: BoardState = from_value(state).map_err(JsValue::from)?;
    let strategy = strategy
        .as_deref()
        .and_then(|value| HintStrategy::from_str(value).ok())
        .unwrap_or_default();
    let mut advisor = match seed {
        Some(seed) => HintAdvisor::with_seed(strategy, seed),
        None => HintAdvisor::new(strategy),
    };
    let decision = advisor.suggest(&state);
    to_value(&decision).map_err(JsValue::from)
}

#[cfg(feature = "console_error_panic_hook")]
fn set_panic_hook() {
    console_error_panic_hook::set_once();
}

#[cfg(not(feature = "console_error_panic_hook"))]
fn set_panic_hook() {}
