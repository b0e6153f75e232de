//! Window, style, control and layout commands

use std::collections::BTreeMap;

use tracing::{debug, info, warn};

use super::{param_number, parse_number, require_args};
use crate::application::{AdaptiveLayout, AppState, GridConfig, WindowInfo};
use crate::error::CommandError;
use crate::parser::{parse_flag, parse_parameters, ParamMap};
use crate::toolkit::{
    Callback, GridAxis, HeadlessToolkit, Placement, Style, ToolkitError, WidgetId, WidgetKind,
    WidgetSpec,
};

/// Padding applied to grid-placed controls
pub const GRID_PAD: u32 = 5;

/// Most rows or columns a grid may declare
pub const MAX_GRID_TRACKS: u32 = 256;

/// Parameters copied from a control line into the widget style
const STYLE_KEYS: [&str; 3] = ["bg", "fg", "font"];

pub fn clear(app: &mut AppState, _args: &[String]) -> Result<(), CommandError> {
    app.clear();
    Ok(())
}

/* ===================== Window ===================== */

pub fn window(app: &mut AppState, args: &[String]) -> Result<(), CommandError> {
    require_args("window", args, 4)?;
    let name = &args[0];
    let width: u32 = parse_number("width", &args[1])?;
    let height: u32 = parse_number("height", &args[2])?;
    let title = args[3..].join(" ");

    let mut style = Style::new();
    if let Some(bg) = app.styles.get(name).and_then(|class| class.get("bg")) {
        style.insert("bg".to_string(), bg.clone());
    }

    let id = match app.toolkit_mut().create_window(&title, width, height, &style) {
        Ok(id) => id,
        Err(ToolkitError::Unavailable(reason)) => {
            warn!(reason = %reason, "GUI unavailable, continuing headless");
            app.fall_back_to(Box::new(HeadlessToolkit::new()));
            app.toolkit_mut().create_window(&title, width, height, &style)?
        }
        Err(err) => return Err(err.into()),
    };

    if app.window.is_some() {
        debug!(window = %name, "main window redefined");
    }
    app.window = Some(WindowInfo {
        name: name.clone(),
        title: title.clone(),
        width,
        height,
        id,
    });

    if app.config().ui.show_statusbar {
        let ready = app.text("ready");
        let status = app
            .toolkit_mut()
            .create_widget(Some(id), &WidgetSpec::new(WidgetKind::StatusBar).text(ready))?;
        app.status_bar = Some(status);
    }
    if app.config().ui.show_toolbar {
        app.toolbar = Some(create_toolbar(app, id)?);
    }

    info!(window = %name, width, height, title = %title, "main window created");
    Ok(())
}

fn create_toolbar(app: &mut AppState, window: WidgetId) -> Result<WidgetId, CommandError> {
    let buttons = [
        (app.text("clear"), "clear"),
        (app.text("generate_code"), "generate_code_view()"),
    ];

    let toolkit = app.toolkit_mut();
    let toolbar = toolkit.create_widget(Some(window), &WidgetSpec::new(WidgetKind::Toolbar))?;
    for (caption, action) in buttons {
        let button =
            toolkit.create_widget(Some(toolbar), &WidgetSpec::new(WidgetKind::Button).text(caption))?;
        toolkit.set_command(button, Callback::Action(action.to_string()))?;
    }
    Ok(toolbar)
}

pub fn style(app: &mut AppState, args: &[String]) -> Result<(), CommandError> {
    require_args("style", args, 1)?;
    let params = parse_parameters(&args[1..]);
    debug!(class = %args[0], ?params, "style defined");
    app.styles.insert(args[0].clone(), params);
    Ok(())
}

/* ===================== Controls ===================== */

pub fn control(app: &mut AppState, args: &[String]) -> Result<(), CommandError> {
    require_args("control", args, 2)?;
    let (control_type, name) = (&args[0], &args[1]);
    let params = parse_parameters(&args[2..]);

    let parent = app.window.as_ref().map(|window| window.id);
    let id = create_control(app, parent, control_type, &params)?;
    let placement = place_control(app, id, &params)?;

    if let (Some(adaptive), Placement::Absolute { x, y, width, height }) =
        (app.adaptive.as_mut(), &placement)
    {
        adaptive
            .originals
            .insert(name.clone(), (*x, *y, *width, *height));
    }
    if app.controls.insert(name.clone(), id).is_some() {
        debug!(control = %name, "control redefined");
    }
    debug!(control = %name, control_type = %control_type, "control created");
    Ok(())
}

/// Create a control widget from a type token and its parameters
///
/// The style is the `class=` style with `color` read as `fg`, overridden by
/// any `bg`, `fg` or `font` given on the line itself.
pub(crate) fn create_control(
    app: &mut AppState,
    parent: Option<WidgetId>,
    control_type: &str,
    params: &ParamMap,
) -> Result<WidgetId, CommandError> {
    let kind = WidgetKind::from_control_type(control_type).unwrap_or_else(|| {
        warn!(control_type, "unknown control type, using label");
        WidgetKind::Label
    });

    let mut style = Style::new();
    if let Some(class) = params.get("class").and_then(|class| app.styles.get(class)) {
        for (key, value) in class {
            let key = if key == "color" { "fg" } else { key.as_str() };
            style.insert(key.to_string(), value.clone());
        }
    }
    for key in STYLE_KEYS {
        if let Some(value) = params.get(key) {
            style.insert(key.to_string(), value.clone());
        }
    }

    let text = params.get("text").cloned().unwrap_or_default();
    let spec = WidgetSpec::new(kind).text(text).style(style);
    let toolkit = app.toolkit_mut();
    let id = toolkit.create_widget(parent, &spec)?;

    if let Some(placeholder) = params.get("placeholder") {
        if kind == WidgetKind::Entry || kind == WidgetKind::TextArea {
            toolkit.set_value(id, placeholder)?;
        }
    }
    Ok(id)
}

/// Place a control: grid when a grid is configured and `row=` is given,
/// relative when `relx=` is given, absolute otherwise
pub(crate) fn place_control(
    app: &mut AppState,
    id: WidgetId,
    params: &ParamMap,
) -> Result<Placement, CommandError> {
    let placement = match (&app.grid, params.contains_key("row"), params.contains_key("relx")) {
        (Some(grid), true, _) => Placement::Grid {
            row: param_number(params, "row")?.unwrap_or(0),
            column: param_number(params, "col")?.unwrap_or(0),
            rowspan: param_number(params, "rowspan")?.unwrap_or(1),
            columnspan: param_number(params, "colspan")?.unwrap_or(1),
            sticky: params.get("sticky").cloned().unwrap_or_default(),
            pad: grid.pad,
        },
        (_, _, true) => Placement::Relative {
            relx: param_number(params, "relx")?.unwrap_or(0.0),
            rely: param_number(params, "rely")?.unwrap_or(0.0),
            relwidth: param_number(params, "relwidth")?,
            relheight: param_number(params, "relheight")?,
            anchor: params.get("anchor").cloned().unwrap_or_else(|| "nw".to_string()),
        },
        _ => Placement::Absolute {
            x: param_number(params, "x")?.unwrap_or(0),
            y: param_number(params, "y")?.unwrap_or(0),
            width: param_number(params, "w")?,
            height: param_number(params, "h")?,
        },
    };
    app.toolkit_mut().place(id, placement.clone())?;
    Ok(placement)
}

fn control_id(app: &AppState, name: &str) -> Result<WidgetId, CommandError> {
    app.controls
        .get(name)
        .copied()
        .ok_or_else(|| CommandError::UnknownControl(name.to_string()))
}

/* ===================== Grid ===================== */

fn grid_tracks(name: &str, text: &str) -> Result<u32, CommandError> {
    let count: u32 = parse_number(name, text)?;
    if count > MAX_GRID_TRACKS {
        return Err(CommandError::invalid(name, text));
    }
    Ok(count)
}

fn parse_weights(text: Option<&String>, limit: u32) -> Result<Vec<u32>, CommandError> {
    let Some(text) = text else {
        return Ok(Vec::new());
    };
    text.split(',')
        .take(limit as usize)
        .map(|weight| parse_number("weight", weight))
        .collect()
}

fn apply_grid(app: &mut AppState, grid: GridConfig) -> Result<(), CommandError> {
    let parent = app.window.as_ref().map(|window| window.id);
    let toolkit = app.toolkit_mut();
    for (index, weight) in grid.row_weights.iter().enumerate() {
        toolkit.configure_grid(parent, GridAxis::Row, index as u32, *weight)?;
    }
    for (index, weight) in grid.column_weights.iter().enumerate() {
        toolkit.configure_grid(parent, GridAxis::Column, index as u32, *weight)?;
    }
    debug!(rows = grid.rows, columns = grid.columns, "grid configured");
    app.grid = Some(grid);
    Ok(())
}

pub fn grid_setup(app: &mut AppState, args: &[String]) -> Result<(), CommandError> {
    require_args("網格佈局", args, 2)?;
    let rows = grid_tracks("rows", &args[0])?;
    let columns = grid_tracks("columns", &args[1])?;

    let grid = GridConfig {
        rows,
        columns,
        row_weights: parse_weights(args.get(2), rows)?,
        column_weights: parse_weights(args.get(3), columns)?,
        pad: GRID_PAD,
    };
    apply_grid(app, grid)
}

pub fn layout_grid(app: &mut AppState, args: &[String]) -> Result<(), CommandError> {
    require_args("layoutgrid", args, 2)?;
    let rows = grid_tracks("rows", &args[0])?;
    let columns = grid_tracks("columns", &args[1])?;

    let grid = GridConfig {
        rows,
        columns,
        row_weights: vec![1; rows as usize],
        column_weights: vec![1; columns as usize],
        pad: GRID_PAD,
    };
    apply_grid(app, grid)
}

pub fn grid_position(app: &mut AppState, args: &[String]) -> Result<(), CommandError> {
    require_args("網格位置", args, 3)?;
    let id = control_id(app, &args[0])?;

    let placement = Placement::Grid {
        row: parse_number("row", &args[1])?,
        column: parse_number("column", &args[2])?,
        rowspan: args
            .get(3)
            .map(|value| parse_number("rowspan", value))
            .transpose()?
            .unwrap_or(1),
        columnspan: args
            .get(4)
            .map(|value| parse_number("colspan", value))
            .transpose()?
            .unwrap_or(1),
        sticky: args.get(5).cloned().unwrap_or_else(|| "nsew".to_string()),
        pad: app.grid.as_ref().map_or(0, |grid| grid.pad),
    };
    app.toolkit_mut().place(id, placement)?;
    if let Some(adaptive) = app.adaptive.as_mut() {
        adaptive.originals.remove(&args[0]);
    }
    debug!(control = %args[0], row = %args[1], column = %args[2], "control placed in grid");
    Ok(())
}

pub fn relative_position(app: &mut AppState, args: &[String]) -> Result<(), CommandError> {
    require_args("相對位置", args, 3)?;
    let id = control_id(app, &args[0])?;
    let optional = |index: usize, name: &str| -> Result<Option<f64>, CommandError> {
        args.get(index)
            .map(|value| parse_number(name, value))
            .transpose()
    };

    let placement = Placement::Relative {
        relx: parse_number("relx", &args[1])?,
        rely: parse_number("rely", &args[2])?,
        relwidth: optional(3, "relwidth")?,
        relheight: optional(4, "relheight")?,
        anchor: args.get(5).cloned().unwrap_or_else(|| "nw".to_string()),
    };
    app.toolkit_mut().place(id, placement)?;
    if let Some(adaptive) = app.adaptive.as_mut() {
        adaptive.originals.remove(&args[0]);
    }
    debug!(control = %args[0], "control placed relatively");
    Ok(())
}

/* ===================== Adaptive Layout ===================== */

/// `自適應 [on|off]`: capture absolute geometry for proportional rescaling
pub fn adaptive(app: &mut AppState, args: &[String]) -> Result<(), CommandError> {
    let enabled = args.first().map_or(true, |flag| parse_flag(flag));
    if !enabled {
        app.adaptive = None;
        info!("adaptive layout disabled");
        return Ok(());
    }

    let (base_width, base_height) = match &app.window {
        Some(window) => (window.width, window.height),
        None => (
            app.config().window.default_width,
            app.config().window.default_height,
        ),
    };

    let mut originals = BTreeMap::new();
    for (name, id) in &app.controls {
        if let Some(Placement::Absolute { x, y, width, height }) = app
            .toolkit()
            .snapshot(*id)
            .and_then(|snapshot| snapshot.placement)
        {
            originals.insert(name.clone(), (x, y, width, height));
        }
    }

    info!(
        base_width,
        base_height,
        controls = originals.len(),
        "adaptive layout enabled"
    );
    app.adaptive = Some(AdaptiveLayout {
        base_width,
        base_height,
        originals,
    });
    Ok(())
}
