//! Command handlers exposing [`openclaw_core::nudge::NudgeEngine`] over the
//! dispatcher's `{command, args}` wire protocol.

use std::rc::Rc;

use openclaw_core::clock;
use openclaw_core::nudge::NudgeEngine;
use serde_json::Value;

use crate::dispatcher::Dispatcher;

pub fn build(engine: NudgeEngine) -> Dispatcher {
    let engine = Rc::new(engine);

    let e = Rc::clone(&engine);
    let check_all = move |_args: &Value| -> Result<Value, String> {
        let nudges = e.check_all(clock::now()).map_err(|e| e.to_string())?;
        serde_json::to_value(nudges).map_err(|e| e.to_string())
    };

    let e = Rc::clone(&engine);
    let morning_briefing = move |_args: &Value| -> Result<Value, String> {
        let briefing = e.morning_briefing(clock::now()).map_err(|e| e.to_string())?;
        serde_json::to_value(briefing).map_err(|e| e.to_string())
    };

    let e = Rc::clone(&engine);
    let relationship_review = move |_args: &Value| -> Result<Value, String> {
        let nudges = e.relationship_review(clock::now()).map_err(|e| e.to_string())?;
        serde_json::to_value(nudges).map_err(|e| e.to_string())
    };

    Dispatcher::new()
        .register("check_all", Box::new(check_all))
        .register("morning_briefing", Box::new(morning_briefing))
        .register("relationship_review", Box::new(relationship_review))
}
