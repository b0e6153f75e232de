use std::sync::Arc;

use super::builtin_registry;
use crate::api::{ApiCallSpec, ApiRegistry};
use crate::application::AppState;
use crate::config::Config;
use crate::error::{CommandError, DispatchError};
use crate::toolkit::{
    Callback, GridAxis, HeadlessToolkit, Placement, Toolkit, WidgetKind, WidgetSnapshot, PRIMARY_PRESS,
};

fn state() -> AppState {
    let config = Config::default();
    AppState::new(
        config.clone(),
        Arc::new(builtin_registry(&config)),
        Arc::new(ApiRegistry::new()),
        Box::new(HeadlessToolkit::new()),
    )
}

/// Run one command line through the registry
fn exec(app: &mut AppState, line: &str) -> Result<(), CommandError> {
    let tokens = crate::parser::tokenize(line);
    let (verb, args) = tokens.split_first().expect("empty command line");
    app.commands()
        .execute(verb, app, args)
        .map_err(|err| match err {
            DispatchError::Handler { source, .. } => source,
            other => panic!("unexpected dispatch error: {other}"),
        })
}

fn ok(app: &mut AppState, line: &str) {
    if let Err(err) = exec(app, line) {
        panic!("{line}: {err}");
    }
}

fn snapshot(app: &AppState, name: &str) -> WidgetSnapshot {
    let id = app.lookup_widget(name).unwrap();
    app.toolkit().snapshot(id).unwrap()
}

/* ===================== Window ===================== */

#[test]
fn test_window_creates_status_bar_and_toolbar() {
    let mut app = state();
    ok(&mut app, "style main bg=#202020");
    ok(&mut app, "window main 640 480 My Application");

    let window = app.window.clone().unwrap();
    assert_eq!(window.title, "My Application");
    assert_eq!((window.width, window.height), (640, 480));
    let root = app.toolkit().snapshot(window.id).unwrap();
    assert_eq!(root.style.get("bg").map(String::as_str), Some("#202020"));

    let status = app.toolkit().snapshot(app.status_bar.unwrap()).unwrap();
    assert_eq!(status.kind, WidgetKind::StatusBar);
    assert_eq!(status.text, app.text("ready"));

    let toolbar = app.toolbar.unwrap();
    let buttons: Vec<WidgetSnapshot> = app
        .toolkit()
        .widgets()
        .into_iter()
        .filter(|w| w.parent == Some(toolbar))
        .collect();
    assert_eq!(buttons.len(), 2);
    let clear = buttons[0].id;
    assert_eq!(
        app.toolkit_mut().fire(clear, PRIMARY_PRESS).unwrap(),
        vec![Callback::Action("clear".to_string())]
    );
}

#[test]
fn test_window_without_bars() {
    let mut config = Config::default();
    config.ui.show_toolbar = false;
    config.ui.show_statusbar = false;
    let mut app = AppState::new(
        config.clone(),
        Arc::new(builtin_registry(&config)),
        Arc::new(ApiRegistry::new()),
        Box::new(HeadlessToolkit::new()),
    );
    ok(&mut app, "window main 640 480 Plain");
    assert!(app.status_bar.is_none());
    assert!(app.toolbar.is_none());
}

#[test]
fn test_window_argument_errors() {
    let mut app = state();
    assert!(matches!(
        exec(&mut app, "window main 640"),
        Err(CommandError::MissingArguments { verb: "window", expected: 4, got: 2 })
    ));
    assert!(matches!(
        exec(&mut app, "window main wide 480 Title"),
        Err(CommandError::InvalidArgument { ref name, .. }) if name == "width"
    ));
}

#[test]
fn test_headless_fallback_drops_widgets_of_the_old_toolkit() {
    let config = Config::default();
    let mut app = AppState::new(
        config.clone(),
        Arc::new(builtin_registry(&config)),
        Arc::new(ApiRegistry::new()),
        Box::new(HeadlessToolkit::without_display()),
    );
    ok(&mut app, "control label early text=Early");
    ok(&mut app, "顯示區域 log 0 0 100 50");
    assert!(app.controls.contains_key("early"));

    ok(&mut app, "window main 400 300 Demo");
    assert!(app.headless);
    assert!(app.controls.is_empty());
    assert!(app.display_areas.is_empty());
    assert!(app.status_bar.is_some());

    ok(&mut app, "control label late text=Late");
    assert_eq!(snapshot(&app, "late").text, "Late");
}

/* ===================== Controls ===================== */

#[test]
fn test_control_style_class_and_overrides() {
    let mut app = state();
    ok(&mut app, "window main 400 300 Demo");
    ok(&mut app, "style primary bg=blue color=white font=Arial");
    ok(&mut app, "control button ok class=primary font=Courier text=\"Click me\"");

    let ok_button = snapshot(&app, "ok");
    assert_eq!(ok_button.kind, WidgetKind::Button);
    assert_eq!(ok_button.text, "Click me");
    assert_eq!(ok_button.style["bg"], "blue");
    assert_eq!(ok_button.style["fg"], "white");
    assert_eq!(ok_button.style["font"], "Courier");
    assert_eq!(ok_button.parent, app.window.as_ref().map(|w| w.id));
}

#[test]
fn test_unknown_control_type_becomes_label() {
    let mut app = state();
    ok(&mut app, "control slider volume text=Volume");
    assert_eq!(snapshot(&app, "volume").kind, WidgetKind::Label);
}

#[test]
fn test_control_placement_modes() {
    let mut app = state();
    ok(&mut app, "window main 400 300 Demo");
    ok(&mut app, "control label a x=5 y=6 w=100 h=20");
    ok(&mut app, "control label b relx=0.5 rely=0.25 relwidth=0.5");
    // row= without a grid falls back to absolute placement
    ok(&mut app, "control label c row=1 col=1");
    ok(&mut app, "網格佈局 2 2 1,3 2,1");
    ok(&mut app, "control label d row=1 col=0 sticky=ew");

    assert_eq!(
        snapshot(&app, "a").placement,
        Some(Placement::Absolute { x: 5, y: 6, width: Some(100), height: Some(20) })
    );
    assert_eq!(
        snapshot(&app, "b").placement,
        Some(Placement::Relative {
            relx: 0.5,
            rely: 0.25,
            relwidth: Some(0.5),
            relheight: None,
            anchor: "nw".to_string(),
        })
    );
    assert_eq!(
        snapshot(&app, "c").placement,
        Some(Placement::Absolute { x: 0, y: 0, width: None, height: None })
    );
    assert_eq!(
        snapshot(&app, "d").placement,
        Some(Placement::Grid {
            row: 1,
            column: 0,
            rowspan: 1,
            columnspan: 1,
            sticky: "ew".to_string(),
            pad: super::layout::GRID_PAD,
        })
    );

    assert!(matches!(
        exec(&mut app, "control label e x=left"),
        Err(CommandError::InvalidArgument { .. })
    ));
}

#[test]
fn test_entry_placeholder_sets_value() {
    let mut app = state();
    ok(&mut app, "control entry name placeholder=\"your name\"");
    assert_eq!(app.read_widget("name").as_deref(), Some("your name"));
}

/* ===================== Grid ===================== */

#[test]
fn test_grid_setup_configures_weights() {
    let mut app = state();
    ok(&mut app, "window main 400 300 Demo");
    ok(&mut app, "網格佈局 2 3 1,2,9 1,1,2");

    let grid = app.grid.clone().unwrap();
    // Extra weights beyond the row count are dropped
    assert_eq!(grid.row_weights, vec![1, 2]);
    assert_eq!(grid.column_weights, vec![1, 1, 2]);
    assert_eq!(grid.pad, super::layout::GRID_PAD);
}

#[test]
fn test_layoutgrid_uses_equal_weights() {
    let mut app = state();
    ok(&mut app, "layout-grid 2 2");
    let grid = app.grid.clone().unwrap();
    assert_eq!(grid.row_weights, vec![1, 1]);
    assert_eq!(grid.column_weights, vec![1, 1]);
}

#[test]
fn test_oversized_grids_are_rejected() {
    let mut app = state();
    assert!(matches!(
        exec(&mut app, "layoutgrid 4000000000 1"),
        Err(CommandError::InvalidArgument { .. })
    ));
    assert!(matches!(
        exec(&mut app, "網格佈局 2 257"),
        Err(CommandError::InvalidArgument { .. })
    ));
    assert!(app.grid.is_none());

    ok(&mut app, "layoutgrid 256 1");
    assert_eq!(app.grid.clone().unwrap().row_weights.len(), 256);
}

#[test]
fn test_grid_weights_reach_the_toolkit() {
    let mut toolkit = HeadlessToolkit::new();
    let window = toolkit
        .create_window("Demo", 400, 300, &Default::default())
        .unwrap();
    toolkit.configure_grid(Some(window), GridAxis::Row, 0, 2).unwrap();
    toolkit.configure_grid(Some(window), GridAxis::Row, 0, 3).unwrap();
    assert_eq!(toolkit.grid_weights(), &[(Some(window), GridAxis::Row, 0, 3)]);
}

#[test]
fn test_grid_and_relative_position_commands() {
    let mut app = state();
    ok(&mut app, "window main 400 300 Demo");
    ok(&mut app, "control button ok x=10 y=10");
    ok(&mut app, "網格位置 ok 2 1");
    assert_eq!(
        snapshot(&app, "ok").placement,
        Some(Placement::Grid {
            row: 2,
            column: 1,
            rowspan: 1,
            columnspan: 1,
            sticky: "nsew".to_string(),
            pad: 0,
        })
    );

    ok(&mut app, "相對位置 ok 0.1 0.2 0.3 0.4 center");
    assert_eq!(
        snapshot(&app, "ok").placement,
        Some(Placement::Relative {
            relx: 0.1,
            rely: 0.2,
            relwidth: Some(0.3),
            relheight: Some(0.4),
            anchor: "center".to_string(),
        })
    );

    assert!(matches!(
        exec(&mut app, "網格位置 ghost 0 0"),
        Err(CommandError::UnknownControl(name)) if name == "ghost"
    ));
}

/* ===================== Bindings ===================== */

#[test]
fn test_binding_and_exec_record_only() {
    let mut app = state();
    ok(&mut app, "binding ok click \"result.text = 'hi'\"");
    ok(&mut app, "exec ok \"echo one\" \"echo two\"");
    ok(&mut app, "exec ok \"echo three\"");

    assert_eq!(app.event_bindings.len(), 1);
    assert_eq!(app.event_bindings[0].action, "result.text = 'hi'");
    assert_eq!(app.exec_bindings["ok"], vec!["echo one", "echo two", "echo three"]);
    assert!(exec(&mut app, "binding ok click").is_err());
}

/* ===================== Display ===================== */

#[test]
fn test_display_area_content_and_clear() {
    let mut app = state();
    ok(&mut app, "window main 400 300 Demo");
    ok(&mut app, "顯示區域 log 10 10 200 100 title=Output bg=black");

    let area = snapshot(&app, "log");
    assert_eq!(area.kind, WidgetKind::DisplayArea);
    assert_eq!(area.text, "Output");
    assert_eq!(area.style["bg"], "black");
    assert_eq!(area.properties["state"], "disabled");

    ok(&mut app, "顯示內容 log first line");
    ok(&mut app, "display-content log \", second\" append=true");
    assert_eq!(app.read_widget("log").as_deref(), Some("first line, second"));

    ok(&mut app, "清除顯示 log");
    assert_eq!(app.read_widget("log").as_deref(), Some(""));

    assert!(matches!(
        exec(&mut app, "顯示內容 missing hello"),
        Err(CommandError::UnknownDisplayArea(name)) if name == "missing"
    ));
}

#[test]
fn test_set_language_and_display_text() {
    let mut app = state();
    ok(&mut app, "window main 400 300 Demo");
    ok(&mut app, "control label greeting");
    ok(&mut app, "control entry field");
    ok(&mut app, "顯示區域 log 10 10 200 100");

    ok(&mut app, "設定語言 en");
    assert_eq!(app.language.current(), "en");
    let status = app.toolkit().snapshot(app.status_bar.unwrap()).unwrap();
    assert_eq!(status.text, "Language Changed");

    // Unsupported languages keep the current one
    ok(&mut app, "set-language xx");
    assert_eq!(app.language.current(), "en");

    ok(&mut app, "顯示文字 welcome greeting");
    ok(&mut app, "顯示文字 submit field");
    ok(&mut app, "顯示文字 ready log");
    assert_eq!(snapshot(&app, "greeting").text, "Welcome to MENU");
    assert_eq!(app.read_widget("field").as_deref(), Some("Submit"));
    assert_eq!(app.read_widget("log").as_deref(), Some("Ready"));

    assert!(exec(&mut app, "顯示文字 welcome nowhere").is_err());
}

#[test]
fn test_clear_resets_state() {
    let mut app = state();
    ok(&mut app, "window main 400 300 Demo");
    ok(&mut app, "style s bg=red");
    ok(&mut app, "control label a text=A");
    ok(&mut app, "顯示區域 log 10 10 200 100");
    let label = app.controls["a"];

    ok(&mut app, "clear");
    assert!(app.controls.is_empty());
    assert!(app.styles.is_empty());
    assert!(app.display_areas.is_empty());
    assert!(app.toolkit().snapshot(label).is_none());
    // The window itself survives
    assert!(app.window.is_some());
}

/* ===================== APIs ===================== */

#[test]
fn test_api_set_registers_config() {
    let mut app = state();
    ok(&mut app, "api設定 svc example.com/v1 key=abc show-secret=yes");
    ok(&mut app, "api local localhost:8080 username=ann password=pw");

    let svc = app.apis().get_api("svc").unwrap();
    assert_eq!(svc.url, "https://example.com/v1");
    assert_eq!(svc.key.as_deref(), Some("abc"));
    assert!(svc.show_secret);

    let local = app.apis().get_api("local").unwrap();
    assert_eq!(local.url, "http://localhost:8080");
    assert_eq!(local.username.as_deref(), Some("ann"));
    assert!(!local.show_secret);
}

#[test]
fn test_api_call_binds_button_command() {
    let mut app = state();
    ok(&mut app, "control button send text=Send");
    ok(&mut app, "api呼叫 send svc post /users '{\"name\":\"{name}\"}' -> result.text");

    let id = app.controls["send"];
    let callbacks = app.toolkit_mut().fire(id, PRIMARY_PRESS).unwrap();
    assert_eq!(
        callbacks,
        vec![Callback::ApiCall(ApiCallSpec {
            api: "svc".to_string(),
            method: "POST".to_string(),
            path: "/users".to_string(),
            body_template: Some("{\"name\":\"{name}\"}".to_string()),
            target: Some("result.text".to_string()),
        })]
    );

    assert!(matches!(
        exec(&mut app, "api-call ghost svc GET /"),
        Err(CommandError::UnknownControl(_))
    ));
}

#[test]
fn test_api_test_requires_remote_runtime() {
    let mut app = state();
    ok(&mut app, "api設定 svc example.com");
    assert!(matches!(exec(&mut app, "api測試 svc"), Err(CommandError::Failed(_))));
    assert!(matches!(
        exec(&mut app, "api-test -> result.text"),
        Err(CommandError::MissingArguments { .. })
    ));
}

/* ===================== Popups ===================== */

#[test]
fn test_popup_window_defaults_and_replacement() {
    let mut app = state();
    ok(&mut app, "window main 400 300 Demo");
    ok(&mut app, "popup-window settings");
    let first = app.popups["settings"];
    let popup = snapshot(&app, "settings");
    assert_eq!(popup.text, "settings");
    assert_eq!(
        popup.placement,
        Some(Placement::Absolute { x: 50, y: 50, width: Some(400), height: Some(300) })
    );

    ok(&mut app, "popup-content settings entry theme");
    ok(&mut app, "popup-window settings Preferences size=320x240 offset=10,20");
    let popup = snapshot(&app, "settings");
    assert_eq!(popup.text, "Preferences");
    assert_eq!(
        popup.placement,
        Some(Placement::Absolute { x: 10, y: 20, width: Some(320), height: Some(240) })
    );
    // The old popup and its controls are gone
    assert!(app.toolkit().snapshot(first).is_none());
    assert!(!app.controls.contains_key("theme"));

    assert!(matches!(
        exec(&mut app, "popup-window bad size=huge"),
        Err(CommandError::InvalidArgument { .. })
    ));
}

#[test]
fn test_popup_content_and_send_data_errors() {
    let mut app = state();
    assert!(matches!(
        exec(&mut app, "popup-content nowhere entry x"),
        Err(CommandError::UnknownPopup(_))
    ));

    ok(&mut app, "popup-window p");
    assert!(matches!(
        exec(&mut app, "popup-send-data p field"),
        Err(CommandError::MissingTarget(_))
    ));
    assert!(matches!(
        exec(&mut app, "popup-send-data p field -> out button=ghost"),
        Err(CommandError::UnknownControl(_))
    ));
}

/* ===================== Registry ===================== */

#[test]
fn test_every_builtin_has_a_description() {
    let registry = builtin_registry(&Config::default());
    for verb in registry.list_all() {
        let description = registry.description(&verb).unwrap();
        assert!(!description.is_empty(), "{verb} has no description");
    }
}
