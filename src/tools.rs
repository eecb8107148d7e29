//! Tool catalogue (§4.4): canonical, curated schemas for the fixed set of
//! client-side tools, substituted for whatever schema the client sent, plus
//! expansion of computer-use tool-type tags into concrete function schemas.
//!
//! Built the way the teacher builds its static model table (§4.1 / A.3): a
//! `LazyLock` map over a literal list, read-only after first access.

use std::collections::HashMap;
use std::sync::LazyLock;

use serde_json::{Value, json};

use crate::types::FunctionToolSpec;

/// The fixed set of recognised client tool names, in catalogue order.
pub const CLIENT_TOOL_NAMES: &[&str] = &[
    "Read",
    "Write",
    "Edit",
    "Glob",
    "Grep",
    "Bash",
    "WebFetch",
    "WebSearch",
    "LSP",
    "NotebookEdit",
    "Task",
    "Skill",
    "TodoWrite",
    "AskUserQuestion",
    "EnterPlanMode",
    "ExitPlanMode",
    "TaskOutput",
    "KillShell",
];

static CATALOGUE: LazyLock<HashMap<&'static str, FunctionToolSpec>> = LazyLock::new(build_catalogue);

/// Looks up the canonical definition for a recognised client tool name.
/// Callers substitute this for the client-supplied schema entirely.
pub fn canonical(name: &str) -> Option<&'static FunctionToolSpec> {
    CATALOGUE.get(name)
}

/// Expands a computer-use tool-type tag (`computer` | `text_editor` | `bash`)
/// into a concrete function tool definition with a curated schema.
pub fn expand_computer_use(kind: &str) -> Option<FunctionToolSpec> {
    let (name, description, schema) = match kind {
        "computer" => (
            "computer",
            "Control the mouse and keyboard of a virtual desktop.",
            json!({
                "type": "object",
                "properties": {
                    "action": {
                        "type": "string",
                        "enum": ["key", "type", "mouse_move", "left_click", "right_click", "middle_click",
                                 "double_click", "screenshot", "cursor_position", "scroll"],
                        "description": "The computer action to perform"
                    },
                    "coordinate": {
                        "type": "array",
                        "items": {"type": "integer"},
                        "description": "(x, y) pixel coordinate, required for mouse actions"
                    },
                    "text": {
                        "type": "string",
                        "description": "Text or key sequence, required for key/type actions"
                    }
                },
                "required": ["action"]
            }),
        ),
        "text_editor" => (
            "str_replace_editor",
            "View, create, and edit files on disk.",
            json!({
                "type": "object",
                "properties": {
                    "command": {
                        "type": "string",
                        "enum": ["view", "create", "str_replace", "insert", "undo_edit"],
                        "description": "The editor command to run"
                    },
                    "path": {"type": "string", "description": "Absolute path to the target file"},
                    "file_text": {"type": "string", "description": "Full file content, used by create"},
                    "old_str": {"type": "string", "description": "Exact text to replace, used by str_replace"},
                    "new_str": {"type": "string", "description": "Replacement text, used by str_replace or insert"},
                    "insert_line": {"type": "integer", "description": "Line number to insert after, used by insert"}
                },
                "required": ["command", "path"]
            }),
        ),
        "bash" => (
            "bash",
            "Run a command in a persistent shell session.",
            json!({
                "type": "object",
                "properties": {
                    "command": {"type": "string", "description": "The shell command to run"},
                    "restart": {"type": "boolean", "description": "Set to true to restart the shell session"}
                },
                "required": ["command"]
            }),
        ),
        _ => return None,
    };

    Some(FunctionToolSpec {
        name: name.to_string(),
        description: Some(description.to_string()),
        input_schema: schema,
    })
}

fn build_catalogue() -> HashMap<&'static str, FunctionToolSpec> {
    let mut map = HashMap::new();

    let entries: &[(&str, &str, Value)] = &[
        (
            "Read",
            "Read a file from the local filesystem.",
            json!({
                "type": "object",
                "properties": {
                    "file_path": {"type": "string", "description": "Absolute path to the file to read"},
                    "offset": {"type": "integer", "description": "Line number to start reading from (optional)"},
                    "limit": {"type": "integer", "description": "Number of lines to read (optional)"}
                },
                "required": ["file_path"]
            }),
        ),
        (
            "Write",
            "Write content to a file, overwriting it if it exists.",
            json!({
                "type": "object",
                "properties": {
                    "file_path": {"type": "string", "description": "Absolute path to the file to write"},
                    "content": {"type": "string", "description": "Content to write to the file"}
                },
                "required": ["file_path", "content"]
            }),
        ),
        (
            "Edit",
            "Replace an exact text match in a file.",
            json!({
                "type": "object",
                "properties": {
                    "file_path": {"type": "string", "description": "Absolute path to the file to modify"},
                    "old_string": {"type": "string", "description": "Exact text to replace"},
                    "new_string": {"type": "string", "description": "Replacement text"},
                    "replace_all": {"type": "boolean", "description": "Optional: replace every occurrence"}
                },
                "required": ["file_path", "old_string", "new_string"]
            }),
        ),
        (
            "Glob",
            "Find files matching a glob pattern.",
            json!({
                "type": "object",
                "properties": {
                    "pattern": {"type": "string", "description": "Glob pattern to match"},
                    "path": {"type": "string", "description": "Optional directory to search in"}
                },
                "required": ["pattern"]
            }),
        ),
        (
            "Grep",
            "Search file contents with a regular expression.",
            json!({
                "type": "object",
                "properties": {
                    "pattern": {"type": "string", "description": "Regular expression to search for"},
                    "path": {"type": "string", "description": "Optional file or directory to search"},
                    "glob": {"type": "string", "description": "Optional glob to filter files"}
                },
                "required": ["pattern"]
            }),
        ),
        (
            "Bash",
            "Run a shell command.",
            json!({
                "type": "object",
                "properties": {
                    "command": {"type": "string", "description": "The shell command to run"},
                    "timeout": {"type": "integer", "description": "Optional timeout in milliseconds"},
                    "run_in_background": {"type": "boolean", "description": "Optional: run the command in the background"}
                },
                "required": ["command"]
            }),
        ),
        (
            "WebFetch",
            "Fetch a URL and return its content.",
            json!({
                "type": "object",
                "properties": {
                    "url": {"type": "string", "description": "The URL to fetch"},
                    "prompt": {"type": "string", "description": "Instructions for what to extract from the page"}
                },
                "required": ["url", "prompt"]
            }),
        ),
        (
            "WebSearch",
            "Search the web.",
            json!({
                "type": "object",
                "properties": {
                    "query": {"type": "string", "description": "The search query"}
                },
                "required": ["query"]
            }),
        ),
        (
            "LSP",
            "Query language-server information for a source location.",
            json!({
                "type": "object",
                "properties": {
                    "file_path": {"type": "string", "description": "Absolute path to the source file"},
                    "line": {"type": "integer", "description": "1-indexed line number"},
                    "column": {"type": "integer", "description": "1-indexed column number"},
                    "command": {"type": "string", "description": "LSP request kind, e.g. definition or references"}
                },
                "required": ["file_path", "line", "column", "command"]
            }),
        ),
        (
            "NotebookEdit",
            "Edit a cell in a Jupyter notebook.",
            json!({
                "type": "object",
                "properties": {
                    "notebook_path": {"type": "string", "description": "Absolute path to the .ipynb file"},
                    "cell_id": {"type": "string", "description": "Optional: id of the cell to edit"},
                    "new_source": {"type": "string", "description": "New cell source"},
                    "cell_type": {"type": "string", "description": "Optional: code or markdown"}
                },
                "required": ["notebook_path", "new_source"]
            }),
        ),
        (
            "Task",
            "Launch a subagent to perform a task autonomously.",
            json!({
                "type": "object",
                "properties": {
                    "description": {"type": "string", "description": "Short task description"},
                    "prompt": {"type": "string", "description": "The task for the subagent to perform"}
                },
                "required": ["description", "prompt"]
            }),
        ),
        (
            "Skill",
            "Invoke a packaged skill by name.",
            json!({
                "type": "object",
                "properties": {
                    "skill": {"type": "string", "description": "Exact name of the skill to invoke"},
                    "args": {"type": "string", "description": "Optional arguments to pass to the skill"}
                },
                "required": ["skill"]
            }),
        ),
        (
            "TodoWrite",
            "Replace the current structured todo list.",
            json!({
                "type": "object",
                "properties": {
                    "todos": {"type": "array", "items": {"type": "object"}, "description": "The full updated todo list"}
                },
                "required": ["todos"]
            }),
        ),
        (
            "AskUserQuestion",
            "Ask the user a clarifying question with fixed options.",
            json!({
                "type": "object",
                "properties": {
                    "question": {"type": "string", "description": "The question to present"},
                    "options": {"type": "array", "items": {"type": "string"}, "description": "Selectable answers"}
                },
                "required": ["question", "options"]
            }),
        ),
        (
            "EnterPlanMode",
            "Switch into a read-only planning mode.",
            json!({
                "type": "object",
                "properties": {
                    "reason": {"type": "string", "description": "Optional: why planning mode is needed"}
                },
                "required": []
            }),
        ),
        (
            "ExitPlanMode",
            "Present a plan for approval and exit planning mode.",
            json!({
                "type": "object",
                "properties": {
                    "plan": {"type": "string", "description": "The plan to present for approval"}
                },
                "required": ["plan"]
            }),
        ),
        (
            "TaskOutput",
            "Fetch output produced by a running or finished background task.",
            json!({
                "type": "object",
                "properties": {
                    "task_id": {"type": "string", "description": "Identifier of the background task"}
                },
                "required": ["task_id"]
            }),
        ),
        (
            "KillShell",
            "Terminate a running background shell.",
            json!({
                "type": "object",
                "properties": {
                    "shell_id": {"type": "string", "description": "Identifier of the background shell"}
                },
                "required": ["shell_id"]
            }),
        ),
    ];

    for (name, description, schema) in entries {
        map.insert(
            *name,
            FunctionToolSpec {
                name: (*name).to_string(),
                description: Some((*description).to_string()),
                input_schema: schema.clone(),
            },
        );
    }

    debug_assert_eq!(map.len(), CLIENT_TOOL_NAMES.len(), "catalogue entry missing for a declared client tool name");
    map
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_declared_name_resolves() {
        for name in CLIENT_TOOL_NAMES {
            assert!(canonical(name).is_some(), "missing catalogue entry for {name}");
        }
    }

    #[test]
    fn unknown_name_returns_none() {
        assert!(canonical("NotARealTool").is_none());
    }

    #[test]
    fn computer_use_kinds_expand() {
        assert_eq!(expand_computer_use("computer").unwrap().name, "computer");
        assert_eq!(expand_computer_use("text_editor").unwrap().name, "str_replace_editor");
        assert_eq!(expand_computer_use("bash").unwrap().name, "bash");
        assert!(expand_computer_use("unknown_kind").is_none());
    }
}
