//! Sandbox child: an embedded JavaScript engine on a dedicated thread.
//!
//! The engine has zero ambient authority. Before any execution the child
//! binds exactly seven names into the global scope: `query`, `callLlm`,
//! `gitLog`, `done`, `console.log`, and the read-only data globals `index`,
//! `workingMemory`, `scopeKeys`. `callLlm` and `gitLog` block on the
//! response channel under a correlation id; because each fragment is
//! compiled as an async function, `await` on them behaves as documented
//! (awaiting an already-settled value).
//!
//! Globals assigned by fragments persist for the sandbox's lifetime so the
//! model can accumulate intermediate results across turns.

use std::cell::RefCell;
use std::collections::HashMap;
use std::sync::mpsc::{Receiver, Sender};

use boa_engine::builtins::promise::PromiseState;
use boa_engine::object::ObjectInitializer;
use boa_engine::object::builtins::JsPromise;
use boa_engine::property::Attribute;
use boa_engine::{
    Context, JsNativeError, JsResult, JsString, JsValue, NativeFunction, Source, js_string,
};

use super::{ChildMessage, ControlMessage, ExecutionOutput, ResponseMessage, SandboxEnv};
use crate::index::QueryParams;
use crate::llm::ChatMessage;

/// Iteration cap for fragment loops; a hostile `while (true)` throws
/// instead of wedging the thread, which is what keeps a timed-out sandbox
/// recoverable.
const LOOP_ITERATION_LIMIT: u64 = 5_000_000;

enum PendingKind {
    Llm,
    GitLog,
}

struct ChildState {
    to_host: Sender<ChildMessage>,
    responses: Receiver<ResponseMessage>,
    env: SandboxEnv,
    next_request_id: u64,
    pending: HashMap<u64, PendingKind>,
    stdout: String,
    done: bool,
    done_answer: Option<String>,
}

thread_local! {
    static STATE: RefCell<Option<ChildState>> = const { RefCell::new(None) };
}

/// Child thread entry point: wait for `init`, bind the API, answer
/// `execute` messages until shutdown.
pub(crate) fn child_main(
    control_rx: &Receiver<ControlMessage>,
    responses: Receiver<ResponseMessage>,
    to_host: &Sender<ChildMessage>,
) {
    let env = match control_rx.recv() {
        Ok(ControlMessage::Init(env)) => *env,
        _ => return,
    };

    STATE.with_borrow_mut(|state| {
        *state = Some(ChildState {
            to_host: to_host.clone(),
            responses,
            env,
            next_request_id: 0,
            pending: HashMap::new(),
            stdout: String::new(),
            done: false,
            done_answer: None,
        });
    });

    let Ok(mut context) = build_context() else {
        return;
    };
    if to_host.send(ChildMessage::Ready).is_err() {
        return;
    }

    loop {
        match control_rx.recv() {
            Ok(ControlMessage::Execute { seq, code }) => {
                let output = execute_fragment(&mut context, &code);
                if to_host.send(ChildMessage::Result { seq, output }).is_err() {
                    break;
                }
            },
            Ok(ControlMessage::Init(_)) => {},
            Ok(ControlMessage::Shutdown) | Err(_) => break,
        }
    }
}

fn build_context() -> JsResult<Context> {
    let mut context = Context::default();
    context
        .runtime_limits_mut()
        .set_loop_iteration_limit(LOOP_ITERATION_LIMIT);

    let (index_json, memory_json, keys_json) = STATE.with_borrow(|state| {
        let state = state.as_ref().expect("child state initialized");
        (
            serde_json::to_value(&state.env.index).unwrap_or(serde_json::Value::Null),
            state
                .env
                .working_memory
                .as_ref()
                .and_then(|memory| serde_json::to_value(memory).ok())
                .unwrap_or(serde_json::Value::Null),
            serde_json::to_value(&state.env.scope_keys).unwrap_or(serde_json::Value::Null),
        )
    });

    let index_value = JsValue::from_json(&index_json, &mut context)?;
    let memory_value = JsValue::from_json(&memory_json, &mut context)?;
    let keys_value = JsValue::from_json(&keys_json, &mut context)?;

    context.register_global_property(js_string!("index"), index_value, Attribute::ENUMERABLE)?;
    context.register_global_property(
        js_string!("workingMemory"),
        memory_value,
        Attribute::ENUMERABLE,
    )?;
    context.register_global_property(js_string!("scopeKeys"), keys_value, Attribute::ENUMERABLE)?;

    context.register_global_callable(
        js_string!("query"),
        1,
        NativeFunction::from_fn_ptr(native_query),
    )?;
    context.register_global_callable(
        js_string!("callLlm"),
        1,
        NativeFunction::from_fn_ptr(native_call_llm),
    )?;
    context.register_global_callable(
        js_string!("gitLog"),
        1,
        NativeFunction::from_fn_ptr(native_git_log),
    )?;
    context.register_global_callable(
        js_string!("done"),
        1,
        NativeFunction::from_fn_ptr(native_done),
    )?;

    let console = ObjectInitializer::new(&mut context)
        .function(
            NativeFunction::from_fn_ptr(native_console_log),
            js_string!("log"),
            0,
        )
        .build();
    context.register_global_property(js_string!("console"), console, Attribute::ENUMERABLE)?;

    Ok(context)
}

/// Runs one fragment as an async function and collects its outcome.
fn execute_fragment(context: &mut Context, code: &str) -> ExecutionOutput {
    STATE.with_borrow_mut(|state| {
        let state = state.as_mut().expect("child state initialized");
        state.stdout.clear();
        state.done = false;
        state.done_answer = None;
    });

    let wrapped = format!("(async () => {{\n{code}\n}})()");
    let mut output = ExecutionOutput::default();

    match context.eval(Source::from_bytes(&wrapped)) {
        Ok(value) => {
            context.run_jobs();
            match promise_state(&value) {
                Some(PromiseState::Fulfilled(completion)) => {
                    if !completion.is_undefined() {
                        output.return_value = Some(js_display(&completion, context));
                    }
                },
                Some(PromiseState::Rejected(reason)) => {
                    output.error = Some(js_error_message(&reason, context));
                },
                Some(PromiseState::Pending) => {
                    output.error = Some("execution did not settle".to_string());
                },
                None => {
                    if !value.is_undefined() {
                        output.return_value = Some(js_display(&value, context));
                    }
                },
            }
        },
        Err(err) => output.error = Some(err.to_string()),
    }

    STATE.with_borrow_mut(|state| {
        let state = state.as_mut().expect("child state initialized");
        output.stdout = std::mem::take(&mut state.stdout);
        output.done = state.done;
        output.done_answer = state.done_answer.take();
    });
    output
}

fn promise_state(value: &JsValue) -> Option<PromiseState> {
    let object = value.as_object()?;
    JsPromise::from_object(object.clone())
        .ok()
        .map(|promise| promise.state())
}

// --- the seven-name API ---

fn native_query(_this: &JsValue, args: &[JsValue], context: &mut Context) -> JsResult<JsValue> {
    let params_json = match args.first() {
        None => serde_json::Value::Null,
        Some(value) => js_to_json(value, context)?,
    };
    let params: QueryParams = if params_json.is_null() {
        QueryParams::default()
    } else {
        serde_json::from_value(params_json).map_err(|e| {
            JsNativeError::typ().with_message(format!("invalid query params: {e}"))
        })?
    };

    let results = STATE.with_borrow(|state| {
        let state = state.as_ref().expect("child state initialized");
        serde_json::to_value(state.env.index.query(&params)).unwrap_or(serde_json::Value::Null)
    });
    JsValue::from_json(&results, context)
}

fn native_call_llm(_this: &JsValue, args: &[JsValue], context: &mut Context) -> JsResult<JsValue> {
    let json = match args.first() {
        None => serde_json::Value::Null,
        Some(value) => js_to_json(value, context)?,
    };
    let messages: Vec<ChatMessage> = serde_json::from_value(json).map_err(|e| {
        JsNativeError::typ().with_message(format!("callLlm expects [{{role, content}}]: {e}"))
    })?;

    let result = STATE.with_borrow_mut(|state| {
        let state = state.as_mut().expect("child state initialized");
        let id = state.next_request_id;
        state.next_request_id += 1;
        state.pending.insert(id, PendingKind::Llm);
        if state
            .to_host
            .send(ChildMessage::LlmRequest { id, messages })
            .is_err()
        {
            return Err("sandbox channel closed".to_string());
        }
        await_response(state, id)
    });

    match result {
        Ok(text) => Ok(JsValue::from(JsString::from(text.as_str()))),
        Err(message) => Err(JsNativeError::error().with_message(message).into()),
    }
}

fn native_git_log(_this: &JsValue, args: &[JsValue], context: &mut Context) -> JsResult<JsValue> {
    let json = match args.first() {
        None => serde_json::Value::Null,
        Some(value) => js_to_json(value, context)?,
    };
    let git_args: Vec<String> = serde_json::from_value(json).map_err(|e| {
        JsNativeError::typ().with_message(format!("gitLog expects an array of strings: {e}"))
    })?;

    let result = STATE.with_borrow_mut(|state| {
        let state = state.as_mut().expect("child state initialized");
        let id = state.next_request_id;
        state.next_request_id += 1;
        state.pending.insert(id, PendingKind::GitLog);
        if state
            .to_host
            .send(ChildMessage::GitLogRequest { id, args: git_args })
            .is_err()
        {
            return Err("sandbox channel closed".to_string());
        }
        await_response(state, id)
    });

    match result {
        Ok(text) => Ok(JsValue::from(JsString::from(text.as_str()))),
        Err(message) => Err(JsNativeError::error().with_message(message).into()),
    }
}

fn native_done(_this: &JsValue, args: &[JsValue], context: &mut Context) -> JsResult<JsValue> {
    let answer = match args.first() {
        None => None,
        Some(value) if value.is_undefined() => None,
        Some(value) => Some(js_display(value, context)),
    };
    STATE.with_borrow_mut(|state| {
        let state = state.as_mut().expect("child state initialized");
        state.done = true;
        state.done_answer = answer;
    });
    Ok(JsValue::undefined())
}

fn native_console_log(
    _this: &JsValue,
    args: &[JsValue],
    context: &mut Context,
) -> JsResult<JsValue> {
    let parts: Vec<String> = args.iter().map(|value| js_display(value, context)).collect();
    STATE.with_borrow_mut(|state| {
        let state = state.as_mut().expect("child state initialized");
        state.stdout.push_str(&parts.join(" "));
        state.stdout.push('\n');
    });
    Ok(JsValue::undefined())
}

/// Blocks on the response channel until the response for `id` arrives.
///
/// Execution is single-flight, but responses still correlate through the
/// pending map rather than by arrival order.
fn await_response(
    state: &mut ChildState,
    id: u64,
) -> std::result::Result<String, String> {
    loop {
        match state.responses.recv() {
            Ok(
                ResponseMessage::Llm { id: response_id, result }
                | ResponseMessage::GitLog { id: response_id, result },
            ) => {
                if state.pending.remove(&response_id).is_none() {
                    // a response nothing asked for; drop it
                    continue;
                }
                if response_id == id {
                    return result;
                }
            },
            Err(_) => return Err("sandbox channel closed".to_string()),
        }
    }
}

// --- value conversion helpers ---

fn js_to_json(value: &JsValue, context: &mut Context) -> JsResult<serde_json::Value> {
    if value.is_undefined() {
        return Ok(serde_json::Value::Null);
    }
    value.to_json(context)
}

/// Renders a value the way `console.log` should: strings raw, JSON for
/// anything JSON can express, engine display otherwise.
fn js_display(value: &JsValue, context: &mut Context) -> String {
    if let Some(s) = value.as_string() {
        return s.to_std_string_escaped();
    }
    if value.is_undefined() {
        return "undefined".to_string();
    }
    if value.is_null() {
        return "null".to_string();
    }
    match value.to_json(context) {
        Ok(json) => json.to_string(),
        Err(_) => value.display().to_string(),
    }
}

fn js_error_message(reason: &JsValue, context: &mut Context) -> String {
    reason
        .to_string(context)
        .map_or_else(|_| reason.display().to_string(), |s| s.to_std_string_escaped())
}
