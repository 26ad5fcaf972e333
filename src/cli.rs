use crate::actions::Dispatch;
use crate::api::types::MessageRef;
use crate::backend::BackendError;
use crate::page::{FrameError, HeadlessPage};
use crate::session::{PageSession, Settled};
use crate::tracker::FrameResize;
use log::{debug, warn};
use serde_json::{json, Value};
use std::io::{self, BufRead, Write};

struct CliState {
    session: PageSession<HeadlessPage>,
    /// Settled ops not yet reported through `completions`.
    completed: Vec<Settled>,
}

impl CliState {
    fn collect_completions(&mut self) {
        for settled in self.session.pump() {
            debug!("op {} settled in background", settled.op_id);
            self.completed.push(settled);
        }
    }
}

fn ok_response(data: Value) -> Value {
    let mut obj = match data {
        Value::Object(m) => m,
        _ => {
            let mut m = serde_json::Map::new();
            m.insert("data".to_string(), data);
            m
        }
    };
    obj.insert("ok".to_string(), Value::Bool(true));
    Value::Object(obj)
}

fn err_response(msg: &str) -> Value {
    json!({"ok": false, "error": msg})
}

fn str_field<'a>(input: &'a Value, name: &str) -> Result<&'a str, Value> {
    input
        .get(name)
        .and_then(|v| v.as_str())
        .ok_or_else(|| err_response(&format!("missing '{}' field", name)))
}

/// `uid` may be sent as a JSON string or number.
fn uid_field(input: &Value) -> Result<String, Value> {
    match input.get("uid") {
        Some(Value::String(s)) => Ok(s.clone()),
        Some(Value::Number(n)) => Ok(n.to_string()),
        _ => Err(err_response("missing 'uid' field")),
    }
}

fn message_ref(input: &Value) -> Result<MessageRef, Value> {
    let uid = uid_field(input)?;
    let folder = str_field(input, "folder")?;
    Ok(MessageRef::new(uid, folder))
}

fn settled_json(settled: &Settled) -> Value {
    let mut obj = json!({
        "op_id": settled.op_id,
        "action": settled.request.name(),
        "request_ok": settled.result.is_ok(),
        "reloaded": settled.reloaded,
    });
    if let Err(ref e) = settled.result {
        obj["request_error"] = json!(e);
    }
    obj
}

fn dispatch(state: &mut CliState, input: &Value) -> Value {
    let command = match input.get("command").and_then(|v| v.as_str()) {
        Some(c) => c,
        None => return err_response("missing 'command' field"),
    };

    // Completions that arrived since the last command are applied first.
    state.collect_completions();

    let result = match command {
        "mark_read" => cmd_mark(state, input, true),
        "mark_unread" => cmd_mark(state, input, false),
        "delete_mail" => cmd_delete_mail(state, input),
        "open_thread" => cmd_open_thread(state, input),
        "render_body" => cmd_render_body(state, input),
        "reply" => cmd_reply(state, input),
        "reply_encoded" => cmd_reply_encoded(state, input),
        "frame_content" => cmd_frame_content(state, input),
        "resize_frame" => cmd_resize_frame(state, input),
        "completions" => Ok(cmd_completions(state)),
        "state" => Ok(cmd_state(state)),
        _ => Err(err_response(&format!("unknown command '{}'", command))),
    };

    result.unwrap_or_else(|e| e)
}

fn backend_err(e: BackendError) -> Value {
    err_response(&e.to_string())
}

/// `"wait": false` returns as soon as the request is issued; the outcome is
/// reported later by `completions`.
fn wants_wait(input: &Value) -> bool {
    input.get("wait").and_then(|v| v.as_bool()).unwrap_or(true)
}

fn await_or_pending(state: &mut CliState, input: &Value, op_id: u64) -> Result<Value, Value> {
    if !wants_wait(input) {
        return Ok(json!({"op_id": op_id, "pending": true}));
    }
    let settled = state.session.wait_for(op_id).map_err(backend_err)?;
    let mut resp = settled_json(&settled);
    resp["pending"] = json!(false);
    Ok(resp)
}

// --- Command handlers ---

fn cmd_mark(state: &mut CliState, input: &Value, read: bool) -> Result<Value, Value> {
    let msg = message_ref(input)?;
    let submitted = if read {
        state.session.mark_as_read(&msg)
    } else {
        state.session.mark_as_unread(&msg)
    };
    let op_id = submitted.map_err(backend_err)?;

    await_or_pending(state, input, op_id).map(ok_response)
}

fn cmd_delete_mail(state: &mut CliState, input: &Value) -> Result<Value, Value> {
    let msg = message_ref(input)?;
    let confirm = input
        .get("confirm")
        .and_then(|v| v.as_bool())
        .unwrap_or(false);
    state.session.page_mut().answer_next_confirm(confirm);

    match state.session.delete_mail(&msg).map_err(backend_err)? {
        Dispatch::Declined => Ok(ok_response(json!({"declined": true}))),
        Dispatch::Sent(op_id) => {
            let mut resp = await_or_pending(state, input, op_id)?;
            resp["declined"] = json!(false);
            Ok(ok_response(resp))
        }
    }
}

fn cmd_open_thread(state: &mut CliState, input: &Value) -> Result<Value, Value> {
    let thread_id = str_field(input, "thread_id")?.to_string();
    let msg = message_ref(input)?;
    let unread = input
        .get("unread")
        .and_then(|v| v.as_bool())
        .unwrap_or(false);

    match state
        .session
        .open_thread(&thread_id, &msg, unread)
        .map_err(backend_err)?
    {
        None => Ok(ok_response(json!({
            "thread_id": thread_id,
            "marked": false,
            "tracked": state.session.tracker().is_marked(&msg.uid),
        }))),
        Some(op_id) => {
            let mut resp = await_or_pending(state, input, op_id)?;
            resp["thread_id"] = json!(thread_id);
            resp["marked"] = json!(true);
            resp["tracked"] = json!(state.session.tracker().is_marked(&msg.uid));
            Ok(ok_response(resp))
        }
    }
}

fn cmd_render_body(state: &mut CliState, input: &Value) -> Result<Value, Value> {
    let uid = uid_field(input)?;
    let body = str_field(input, "body")?;
    state.session.page_mut().render_body(&uid, body);
    Ok(ok_response(json!({"uid": uid})))
}

fn cmd_reply(state: &mut CliState, input: &Value) -> Result<Value, Value> {
    let uid = uid_field(input)?;
    let from = str_field(input, "from")?;
    let text = state
        .session
        .reply_raw(&uid, from)
        .map_err(|e| err_response(&e.to_string()))?;
    Ok(ok_response(json!({"text": text})))
}

fn cmd_reply_encoded(state: &mut CliState, input: &Value) -> Result<Value, Value> {
    let body = str_field(input, "body")?;
    let from = str_field(input, "from")?;
    let text = state
        .session
        .reply_encoded(body, from)
        .map_err(|e| err_response(&e.to_string()))?;
    Ok(ok_response(json!({"text": text})))
}

fn cmd_frame_content(state: &mut CliState, input: &Value) -> Result<Value, Value> {
    let name = str_field(input, "frame")?;
    let content = if let Some(reason) = input.get("inaccessible").and_then(|v| v.as_str()) {
        Err(FrameError::Inaccessible(reason.to_string()))
    } else {
        let height = input
            .get("height")
            .and_then(|v| v.as_u64())
            .ok_or_else(|| err_response("missing 'height' or 'inaccessible' field"))?;
        let height =
            u32::try_from(height).map_err(|_| err_response("'height' out of range"))?;
        Ok(height)
    };
    state.session.page_mut().frame_mut(name).content = content;
    Ok(ok_response(json!({"frame": name})))
}

fn cmd_resize_frame(state: &mut CliState, input: &Value) -> Result<Value, Value> {
    let name = str_field(input, "frame")?;
    let mut frame = state.session.page_mut().frame_mut(name).clone();
    let result = state.session.resize_frame(&mut frame);
    let height = frame.height;
    *state.session.page_mut().frame_mut(name) = frame;

    let resp = match result {
        Ok(FrameResize::Resized(px)) => json!({
            "frame": name,
            "height": height,
            "content_height": px,
            "resized": true,
        }),
        Ok(FrameResize::Unchanged(px)) => json!({
            "frame": name,
            "height": height,
            "content_height": px,
            "resized": false,
        }),
        Err(e) => json!({
            "frame": name,
            "height": height,
            "resized": false,
            "skipped": e.to_string(),
        }),
    };
    Ok(ok_response(resp))
}

fn cmd_completions(state: &mut CliState) -> Value {
    state.collect_completions();
    let list: Vec<Value> = state.completed.drain(..).map(|s| settled_json(&s)).collect();
    ok_response(json!({"completions": list}))
}

fn cmd_state(state: &CliState) -> Value {
    let page = state.session.page();
    let mut tracked: Vec<&str> = state.session.tracker().marked().collect();
    tracked.sort_unstable();
    let frames: serde_json::Map<String, Value> = page
        .frames
        .iter()
        .map(|(name, f)| (name.clone(), json!(f.height)))
        .collect();

    ok_response(json!({
        "reply": {
            "text": page.reply.text,
            "hidden": page.reply.hidden,
            "focused": page.reply.focused,
            "scrolled_into_view": page.reply.scrolled_into_view,
        },
        "active_thread": page.active_thread,
        "last_prompt": page.last_prompt,
        "tracked_uids": tracked,
        "reloads": page.reloads,
        "frames": frames,
    }))
}

pub fn run_cli(session: PageSession<HeadlessPage>) {
    let mut state = CliState {
        session,
        completed: Vec::new(),
    };

    let stdin = io::stdin();
    let stdout = io::stdout();
    let mut stdout = stdout.lock();

    for line in stdin.lock().lines() {
        let line = match line {
            Ok(l) => l,
            Err(_) => break,
        };

        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        let input: Value = match serde_json::from_str(trimmed) {
            Ok(v) => v,
            Err(e) => {
                warn!("Rejected malformed command line: {}", e);
                let resp = err_response(&format!("JSON parse error: {}", e));
                let _ = serde_json::to_writer(&mut stdout, &resp);
                let _ = stdout.write_all(b"\n");
                let _ = stdout.flush();
                continue;
            }
        };

        let response = dispatch(&mut state, &input);
        let _ = serde_json::to_writer(&mut stdout, &response);
        let _ = stdout.write_all(b"\n");
        let _ = stdout.flush();
    }
}

pub fn print_help_cli() {
    print!(
        r#"inkorg --cli: JSON-over-stdin/stdout CLI mode
=============================================

Send one JSON object per line on stdin; one JSON response per line is written
to stdout. Every response has "ok": true or "ok": false with an "error" string.
Logs go to stderr (filter with INKORG_LOG, e.g. INKORG_LOG=debug).

Actions (wait for the server, then reload the page even if the call failed)
-------
Add "wait": false to mark_read, mark_unread, delete_mail or open_thread to
return at once with {{"op_id": N, "pending": true}}; poll "completions" for
the outcome.

mark_read:    {{"command": "mark_read", "uid": "42", "folder": "INBOX"}}
mark_unread:  {{"command": "mark_unread", "uid": "42", "folder": "INBOX"}}
delete_mail:  {{"command": "delete_mail", "uid": "42", "folder": "INBOX", "confirm": true}}
              (confirm is the answer to the delete prompt; false sends nothing)

   < {{"ok": true, "op_id": 1, "action": "mark_read", "request_ok": true, "reloaded": true}}

Threads
-------
open_thread:  {{"command": "open_thread", "thread_id": "t42", "uid": "42", "folder": "INBOX", "unread": true}}
              (marks read at most once per uid until the next reload)

Replies
-------
render_body:   {{"command": "render_body", "uid": "42", "body": "raw message text"}}
reply:         {{"command": "reply", "uid": "42", "from": "Anna"}}
reply_encoded: {{"command": "reply_encoded", "body": "<base64 of UTF-8 text>", "from": "Anna"}}

   < {{"ok": true, "text": "\n\n--- Anna skrev ---\n> raw message text"}}

Frames
------
frame_content: {{"command": "frame_content", "frame": "body-42", "height": 300}}
               {{"command": "frame_content", "frame": "body-42", "inaccessible": "cross-origin"}}
resize_frame:  {{"command": "resize_frame", "frame": "body-42"}}

Completions
-----------
completions:   {{"command": "completions"}}
               (settled ops not yet reported, each with op_id, action, request_ok, reloaded)

Page state
----------
state:         {{"command": "state"}}
"#
    );
}
