//! Builtin command handlers
//!
//! One function per verb, grouped by concern. `builtin_registry` registers
//! every handler under its canonical verb and installs the alias table.

use std::str::FromStr;

use crate::config::Config;
use crate::error::CommandError;
use crate::interpreter::{Builtin, CommandRegistry};
use crate::parser::ParamMap;

pub mod api;
pub mod bindings;
pub mod debug;
pub mod display;
pub mod layout;
pub mod popup;

#[cfg(test)]
mod tests;

/* ===================== Verb Tables ===================== */

/// Alternate spellings, as (alias, canonical verb)
pub const COMMAND_ALIASES: &[(&str, &str)] = &[
    ("win", "window"),
    ("ctrl", "control"),
    ("api-set", "api設定"),
    ("api", "api設定"),
    ("api-call", "api呼叫"),
    ("api-test", "api測試"),
    ("display-area", "顯示區域"),
    ("display-content", "顯示內容"),
    ("display-text", "顯示文字"),
    ("set-language", "設定語言"),
    ("generate-code", "生成代碼"),
    ("clear-display", "清除顯示"),
    ("run-command", "執行指令"),
    ("adaptive", "自適應"),
    ("relative", "相對位置"),
    ("grid-setup", "網格佈局"),
    ("grid-layout", "網格佈局"),
    ("grid-pos", "網格位置"),
    ("layout-grid", "layoutgrid"),
];

const BUILTINS: &[(&str, Builtin)] = &[
    (
        "clear",
        Builtin::new("reset every control, style, binding and popup", layout::clear),
    ),
    (
        "window",
        Builtin::new("create the main window: NAME W H TITLE...", layout::window),
    ),
    (
        "style",
        Builtin::new("define a style class: CLASS key=value...", layout::style),
    ),
    (
        "control",
        Builtin::new("create a control: TYPE NAME key=value...", layout::control),
    ),
    (
        "網格佈局",
        Builtin::new(
            "configure the grid: ROWS COLS [ROW_WEIGHTS] [COL_WEIGHTS]",
            layout::grid_setup,
        ),
    ),
    (
        "layoutgrid",
        Builtin::new("configure an evenly weighted grid: ROWS COLS", layout::layout_grid),
    ),
    (
        "網格位置",
        Builtin::new(
            "place a control in the grid: CTRL ROW COL [ROWSPAN COLSPAN STICKY]",
            layout::grid_position,
        ),
    ),
    (
        "相對位置",
        Builtin::new(
            "place a control relatively: CTRL RELX RELY [RELW RELH ANCHOR]",
            layout::relative_position,
        ),
    ),
    (
        "自適應",
        Builtin::new("toggle adaptive layout: [on|off]", layout::adaptive),
    ),
    (
        "binding",
        Builtin::new("bind an event: WIDGET EVENT ACTION...", bindings::binding),
    ),
    (
        "exec",
        Builtin::new("run shell commands on click: BUTTON TEMPLATE...", bindings::exec),
    ),
    (
        "api設定",
        Builtin::new(
            "register an API: NAME URL key= username= password= show-secret=",
            api::api_set,
        ),
    ),
    (
        "api呼叫",
        Builtin::new(
            "call an API on click: BUTTON API METHOD PATH [BODY...] [-> TARGET]",
            api::api_call,
        ),
    ),
    (
        "api測試",
        Builtin::new("test an API connection: API [-> TARGET]", api::api_test),
    ),
    (
        "顯示區域",
        Builtin::new(
            "create a display area: NAME X Y W H key=value...",
            display::display_area,
        ),
    ),
    (
        "顯示內容",
        Builtin::new(
            "write to a display area: AREA CONTENT... [append=true]",
            display::display_content,
        ),
    ),
    (
        "清除顯示",
        Builtin::new("clear a display area: AREA", display::clear_display),
    ),
    (
        "設定語言",
        Builtin::new("switch the interface language: LANG", display::set_language),
    ),
    (
        "顯示文字",
        Builtin::new("show localized text: KEY TARGET", display::display_text),
    ),
    (
        "生成代碼",
        Builtin::new("generate a script for the current UI: [TARGET]", display::generate_code),
    ),
    (
        "執行指令",
        Builtin::new("execute one command line: [LINE...]", display::run_command),
    ),
    (
        popup::POPUP_WINDOW,
        Builtin::new(
            "create a popup window: NAME TITLE... [size=WxH] [offset=X,Y]",
            popup::popup_window,
        ),
    ),
    (
        popup::POPUP_CONTENT,
        Builtin::new(
            "add a control to a popup: POPUP TYPE NAME key=value...",
            popup::popup_content,
        ),
    ),
    (
        popup::POPUP_SEND_DATA,
        Builtin::new(
            "copy popup fields to a target: POPUP FIELDS -> TARGET [button=] [close=]",
            popup::popup_send_data,
        ),
    ),
];

/* ===================== Registry Construction ===================== */

/// Registry with every builtin handler and alias
pub fn builtin_registry(config: &Config) -> CommandRegistry {
    let mut registry = CommandRegistry::new();
    for (verb, builtin) in BUILTINS {
        registry.register(verb, *builtin);
    }
    for (alias, canonical) in COMMAND_ALIASES {
        registry.add_alias(alias, canonical);
    }
    if config.debug {
        debug::register(&mut registry);
    }
    registry
}

/* ===================== Argument Helpers ===================== */

pub(crate) fn require_args(
    verb: &'static str,
    args: &[String],
    expected: usize,
) -> Result<(), CommandError> {
    if args.len() < expected {
        return Err(CommandError::MissingArguments {
            verb,
            expected,
            got: args.len(),
        });
    }
    Ok(())
}

/// Parse a numeric argument, naming it in the error
pub(crate) fn parse_number<T: FromStr>(name: &str, value: &str) -> Result<T, CommandError> {
    value
        .trim()
        .parse()
        .map_err(|_| CommandError::invalid(name, value))
}

/// Optional numeric parameter from a parameter map
pub(crate) fn param_number<T: FromStr>(params: &ParamMap, key: &str) -> Result<Option<T>, CommandError> {
    params
        .get(key)
        .map(|value| parse_number(key, value))
        .transpose()
}
