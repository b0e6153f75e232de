//! Display areas, localized text and utility commands

use tracing::{debug, error, info, warn};

use super::{parse_number, require_args};
use crate::application::AppState;
use crate::codegen;
use crate::error::CommandError;
use crate::parser::{parse_flag, parse_parameters, quote_token, tokenize};
use crate::toolkit::{MessageKind, Placement, Style, WidgetId, WidgetKind, WidgetSpec};

/// Control read by `執行指令` when called without a command line
pub const COMMAND_INPUT: &str = "command_input";
/// Display area that collects `執行指令` outcomes
pub const RESULT_AREA: &str = "result_area";
/// Deepest `執行指令` nesting before a command line is refused
pub const MAX_COMMAND_DEPTH: usize = 8;

fn display_area_id(app: &AppState, name: &str) -> Result<WidgetId, CommandError> {
    app.display_areas
        .get(name)
        .copied()
        .ok_or_else(|| CommandError::UnknownDisplayArea(name.to_string()))
}

/* ===================== Display Areas ===================== */

/// `顯示區域 NAME X Y W H key=value...`
pub fn display_area(app: &mut AppState, args: &[String]) -> Result<(), CommandError> {
    require_args("顯示區域", args, 5)?;
    let name = &args[0];
    let placement = Placement::Absolute {
        x: parse_number("x", &args[1])?,
        y: parse_number("y", &args[2])?,
        width: Some(parse_number("width", &args[3])?),
        height: Some(parse_number("height", &args[4])?),
    };
    let params = parse_parameters(&args[5..]);

    let style: Style = params
        .iter()
        .filter(|(key, _)| matches!(key.as_str(), "bg" | "fg" | "font"))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect();
    let title = params.get("title").cloned().unwrap_or_else(|| name.clone());

    let parent = app.window.as_ref().map(|window| window.id);
    let toolkit = app.toolkit_mut();
    let id = toolkit.create_widget(
        parent,
        &WidgetSpec::new(WidgetKind::DisplayArea).text(title).style(style),
    )?;
    toolkit.place(id, placement)?;
    toolkit.set_property(id, "state", "disabled")?;

    if let Some(previous) = app.display_areas.insert(name.clone(), id) {
        debug!(area = %name, %previous, "display area redefined");
    }
    debug!(area = %name, "display area created");
    Ok(())
}

/// `顯示內容 AREA CONTENT... [append=true]`
pub fn display_content(app: &mut AppState, args: &[String]) -> Result<(), CommandError> {
    require_args("顯示內容", args, 2)?;
    let id = display_area_id(app, &args[0])?;

    let mut content = &args[1..];
    let mut append = false;
    if let Some((last, rest)) = content.split_last() {
        if let Some(flag) = last.strip_prefix("append=") {
            append = parse_flag(flag);
            content = rest;
        }
    }
    let text = content.join(" ");

    if append {
        app.toolkit_mut().append_content(id, &text)?;
    } else {
        app.toolkit_mut().set_content(id, &text)?;
    }
    debug!(area = %args[0], append, "display content updated");
    Ok(())
}

/// `清除顯示 AREA`
pub fn clear_display(app: &mut AppState, args: &[String]) -> Result<(), CommandError> {
    require_args("清除顯示", args, 1)?;
    let id = display_area_id(app, &args[0])?;
    app.toolkit_mut().set_content(id, "")?;
    debug!(area = %args[0], "display area cleared");
    Ok(())
}

/* ===================== Language ===================== */

/// `設定語言 LANG`; an unsupported language keeps the current one
pub fn set_language(app: &mut AppState, args: &[String]) -> Result<(), CommandError> {
    require_args("設定語言", args, 1)?;
    if app.language.set_language(&args[0]) {
        info!(language = %args[0], "language changed");
        let status = app.text("language_changed");
        app.set_status(&status);
    } else {
        warn!(language = %args[0], available = ?app.language.available(), "unsupported language");
    }
    Ok(())
}

/// `顯示文字 KEY TARGET`: localized text into a display area or control
pub fn display_text(app: &mut AppState, args: &[String]) -> Result<(), CommandError> {
    require_args("顯示文字", args, 2)?;
    let (key, target) = (&args[0], &args[1]);
    let text = app.text(key);

    if let Some(id) = app.display_areas.get(target).copied() {
        app.toolkit_mut().set_content(id, &text)?;
    } else {
        let id = app
            .controls
            .get(target)
            .copied()
            .ok_or_else(|| CommandError::UnknownControl(target.clone()))?;
        let toolkit = app.toolkit_mut();
        match toolkit.kind(id) {
            Some(WidgetKind::Entry | WidgetKind::TextArea) => toolkit.set_value(id, &text)?,
            _ => toolkit.set_text(id, &text)?,
        }
    }
    debug!(key = %key, target = %target, "localized text shown");
    Ok(())
}

/* ===================== Utilities ===================== */

/// `生成代碼 [TARGET]`
pub fn generate_code(app: &mut AppState, args: &[String]) -> Result<(), CommandError> {
    codegen::show_code_view(app, args.first().map(String::as_str))
}

/// `執行指令 [LINE...]`: run one command line typed by the user
///
/// The outcome goes to the result area and, on failure, to a message; the
/// command itself never fails because the inner command did.
pub fn run_command(app: &mut AppState, args: &[String]) -> Result<(), CommandError> {
    let tokens = match args {
        [] => {
            let id = app
                .controls
                .get(COMMAND_INPUT)
                .copied()
                .ok_or_else(|| CommandError::UnknownControl(COMMAND_INPUT.to_string()))?;
            tokenize(&app.toolkit().value(id).unwrap_or_default())
        }
        [line] => tokenize(line),
        many => many.to_vec(),
    };

    let Some((verb, rest)) = tokens.split_first() else {
        let title = app.text("error");
        app.show_message(MessageKind::Warning, &title, "no command entered");
        return Ok(());
    };
    let line = tokens
        .iter()
        .map(|token| quote_token(token))
        .collect::<Vec<_>>()
        .join(" ");

    if app.command_depth >= MAX_COMMAND_DEPTH {
        warn!(command = %line, depth = app.command_depth, "command nesting too deep");
        return Err(CommandError::Failed(format!(
            "command nesting deeper than {MAX_COMMAND_DEPTH}: {line}"
        )));
    }

    let commands = app.commands();
    app.command_depth += 1;
    let result = commands.execute(verb, app, rest);
    app.command_depth -= 1;

    let outcome = match result {
        Ok(()) => {
            info!(command = %line, "command executed");
            format!("{}: {}", app.text("command_executed"), line)
        }
        Err(err) => {
            error!(command = %line, error = %err, "command failed");
            let title = app.text("execution_error");
            app.show_message(MessageKind::Error, &title, &err.to_string());
            format!("{}: {}\n{}", app.text("execution_error"), line, err)
        }
    };

    if let Some(area) = app.display_areas.get(RESULT_AREA).copied() {
        app.toolkit_mut()
            .append_content(area, &format!("\n{outcome}"))?;
    }
    Ok(())
}
