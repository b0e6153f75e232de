//! Script generation
//!
//! Renders the current UI back into a canonical script: the main window,
//! styles, grid, controls, display areas, bindings and popups, ending with
//! `show`. Loading the generated script rebuilds the same widget tree.

use std::collections::HashMap;

use tracing::debug;

use crate::application::AppState;
use crate::error::CommandError;
use crate::parser::{quote_token, render_param, DIRECTIVE_PREFIX};
use crate::toolkit::{Placement, WidgetId, WidgetKind, WidgetSnapshot, WidgetSpec};

/// Popup opened by `生成代碼` when no target is given
pub const CODE_VIEW_POPUP: &str = "code-view";

const CODE_VIEW_SIZE: (u32, u32) = (800, 600);

struct ScriptWriter {
    lines: Vec<String>,
}

impl ScriptWriter {
    fn new() -> Self {
        Self { lines: Vec::new() }
    }

    fn directive<I, S>(&mut self, verb: &str, args: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut line = format!("{DIRECTIVE_PREFIX} {verb}");
        for arg in args {
            line.push(' ');
            line.push_str(&arg.into());
        }
        self.lines.push(line);
    }

    fn blank(&mut self) {
        if self.lines.last().is_some_and(|line| !line.is_empty()) {
            self.lines.push(String::new());
        }
    }

    fn finish(self) -> String {
        let mut text = self.lines.join("\n");
        text.push('\n');
        text
    }
}

fn placement_params(placement: &Placement) -> Vec<String> {
    let mut params = Vec::new();
    match placement {
        Placement::Absolute { x, y, width, height } => {
            params.push(format!("x={x}"));
            params.push(format!("y={y}"));
            if let Some(width) = width {
                params.push(format!("w={width}"));
            }
            if let Some(height) = height {
                params.push(format!("h={height}"));
            }
        }
        Placement::Grid {
            row,
            column,
            rowspan,
            columnspan,
            sticky,
            ..
        } => {
            params.push(format!("row={row}"));
            params.push(format!("col={column}"));
            if *rowspan != 1 {
                params.push(format!("rowspan={rowspan}"));
            }
            if *columnspan != 1 {
                params.push(format!("colspan={columnspan}"));
            }
            if !sticky.is_empty() {
                params.push(render_param("sticky", sticky));
            }
        }
        Placement::Relative {
            relx,
            rely,
            relwidth,
            relheight,
            anchor,
        } => {
            params.push(format!("relx={relx}"));
            params.push(format!("rely={rely}"));
            if let Some(relwidth) = relwidth {
                params.push(format!("relwidth={relwidth}"));
            }
            if let Some(relheight) = relheight {
                params.push(format!("relheight={relheight}"));
            }
            params.push(render_param("anchor", anchor));
        }
    }
    params
}

/// Type token and parameters that recreate one control
fn control_params(snapshot: &WidgetSnapshot) -> Option<(&'static str, Vec<String>)> {
    let control_type = snapshot.kind.control_type()?;
    let mut params = Vec::new();
    if !snapshot.text.is_empty() {
        params.push(render_param("text", &snapshot.text));
    }
    for (key, value) in &snapshot.style {
        params.push(render_param(key, value));
    }
    if let Some(placement) = &snapshot.placement {
        params.extend(placement_params(placement));
    }
    Some((control_type, params))
}

pub fn generate_script(app: &AppState) -> String {
    let mut out = ScriptWriter::new();
    out.lines.push("# Generated MENU script".to_string());

    if let Some(window) = &app.window {
        out.directive(
            "window",
            [
                quote_token(&window.name),
                window.width.to_string(),
                window.height.to_string(),
                quote_token(&window.title),
            ],
        );
    }

    let mut styles: Vec<_> = app.styles.iter().collect();
    styles.sort_by(|a, b| a.0.cmp(b.0));
    for (class, params) in styles {
        out.directive(
            "style",
            std::iter::once(quote_token(class))
                .chain(params.iter().map(|(key, value)| render_param(key, value))),
        );
    }

    if let Some(grid) = &app.grid {
        let join = |weights: &[u32]| {
            weights
                .iter()
                .map(u32::to_string)
                .collect::<Vec<_>>()
                .join(",")
        };
        let mut args = vec![grid.rows.to_string(), grid.columns.to_string()];
        if !grid.row_weights.is_empty() || !grid.column_weights.is_empty() {
            args.push(join(&grid.row_weights));
            args.push(join(&grid.column_weights));
        }
        out.directive("網格佈局", args);
    }

    // Widgets in creation order, so the script rebuilds the same tree
    let names: HashMap<WidgetId, &String> = app.controls.iter().map(|(name, id)| (*id, name)).collect();
    let popup_members: HashMap<&String, &String> = app
        .popup_members
        .iter()
        .flat_map(|(popup, members)| members.iter().map(move |member| (member, popup)))
        .collect();
    let widgets = app.toolkit().widgets();

    out.blank();
    for snapshot in &widgets {
        let Some(name) = names.get(&snapshot.id) else {
            continue;
        };
        if popup_members.contains_key(name) {
            continue;
        }
        if let Some((control_type, params)) = control_params(snapshot) {
            out.directive(
                "control",
                [control_type.to_string(), quote_token(name)].into_iter().chain(params),
            );
        }
    }

    let mut areas: Vec<_> = app.display_areas.iter().collect();
    areas.sort_by_key(|(_, id)| **id);
    for (name, id) in areas {
        let Some(snapshot) = app.toolkit().snapshot(*id) else {
            continue;
        };
        let Some(Placement::Absolute { x, y, width, height }) = snapshot.placement else {
            continue;
        };
        let mut args = vec![
            quote_token(name),
            x.to_string(),
            y.to_string(),
            width.unwrap_or(0).to_string(),
            height.unwrap_or(0).to_string(),
        ];
        if snapshot.text != *name {
            args.push(render_param("title", &snapshot.text));
        }
        args.extend(snapshot.style.iter().map(|(key, value)| render_param(key, value)));
        out.directive("顯示區域", args);
    }

    out.blank();
    for (button, templates) in &app.exec_bindings {
        out.directive(
            "exec",
            std::iter::once(quote_token(button)).chain(templates.iter().map(|t| quote_token(t))),
        );
    }
    for binding in &app.event_bindings {
        out.directive(
            "binding",
            [
                quote_token(&binding.widget),
                quote_token(&binding.event),
                quote_token(&binding.action),
            ],
        );
    }

    let mut popups: Vec<_> = app
        .popups
        .iter()
        .filter(|(name, _)| name.as_str() != CODE_VIEW_POPUP)
        .collect();
    popups.sort_by_key(|(_, id)| **id);
    if !popups.is_empty() {
        out.blank();
    }
    for (name, id) in popups {
        let Some(snapshot) = app.toolkit().snapshot(*id) else {
            continue;
        };
        let mut args = vec![quote_token(name), quote_token(&snapshot.text)];
        if let Some(Placement::Absolute { x, y, width, height }) = snapshot.placement {
            if let (Some(width), Some(height)) = (width, height) {
                args.push(format!("size={width}x{height}"));
            }
            args.push(format!("offset={x},{y}"));
        }
        out.directive("popup-window", args);

        for member in app.popup_members.get(name).into_iter().flatten() {
            let Some(member_snapshot) = app
                .controls
                .get(member)
                .and_then(|id| app.toolkit().snapshot(*id))
            else {
                continue;
            };
            if let Some((control_type, params)) = control_params(&member_snapshot) {
                out.directive(
                    "popup-content",
                    [quote_token(name), control_type.to_string(), quote_token(member)]
                        .into_iter()
                        .chain(params),
                );
            }
        }
    }

    out.blank();
    out.directive("show", Vec::<String>::new());
    out.finish()
}

/// Show the generated script in `target`, or in a code-view popup
///
/// A target must be a display area or a text control.
pub fn show_code_view(app: &mut AppState, target: Option<&str>) -> Result<(), CommandError> {
    let script = generate_script(app);

    if let Some(target) = target {
        if let Some(id) = app.display_areas.get(target).copied() {
            app.toolkit_mut().set_content(id, &script)?;
            debug!(target, "generated script shown");
            return Ok(());
        }
        if let Some(id) = app.controls.get(target).copied() {
            let toolkit = app.toolkit_mut();
            match toolkit.kind(id) {
                Some(WidgetKind::TextArea) => toolkit.set_content(id, &script)?,
                Some(WidgetKind::Entry) => toolkit.set_value(id, &script)?,
                _ => toolkit.set_text(id, &script)?,
            }
            debug!(target, "generated script shown");
            return Ok(());
        }
        debug!(target, "code target not found, opening a popup");
    }

    app.close_popup(CODE_VIEW_POPUP);
    let parent = app.window.as_ref().map(|window| window.id);
    let title = app.text("generated_code");
    let (x, y) = app.config().ui.popup_offset();
    let (width, height) = CODE_VIEW_SIZE;

    let toolkit = app.toolkit_mut();
    let popup = toolkit.create_popup(parent, &title, width, height, x, y)?;
    let view = toolkit.create_widget(Some(popup), &WidgetSpec::new(WidgetKind::TextArea))?;
    toolkit.place(
        view,
        Placement::Relative {
            relx: 0.0,
            rely: 0.0,
            relwidth: Some(1.0),
            relheight: Some(1.0),
            anchor: "nw".to_string(),
        },
    )?;
    toolkit.set_content(view, &script)?;
    toolkit.set_property(view, "state", "disabled")?;

    app.popups.insert(CODE_VIEW_POPUP.to_string(), popup);
    debug!(lines = script.lines().count(), "generated script opened in a popup");
    Ok(())
}
