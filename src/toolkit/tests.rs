use std::time::{Duration, Instant};

use super::*;

fn toolkit_with_window() -> (HeadlessToolkit, WidgetId) {
    let mut toolkit = HeadlessToolkit::new();
    let window = toolkit
        .create_window("Main", 800, 600, &Style::new())
        .unwrap();
    (toolkit, window)
}

#[test]
fn test_event_names() {
    assert_eq!(toolkit_event("click"), "<Button-1>");
    assert_eq!(toolkit_event("DoubleClick"), "<Double-Button-1>");
    assert_eq!(toolkit_event("keyrelease"), "<KeyRelease>");
    assert_eq!(toolkit_event("Return"), "<Return>");
    assert_eq!(toolkit_event("<FocusIn>"), "<FocusIn>");
}

#[test]
fn test_control_types() {
    assert_eq!(WidgetKind::from_control_type("edit"), Some(WidgetKind::Entry));
    assert_eq!(WidgetKind::from_control_type("TEXT"), Some(WidgetKind::Label));
    assert_eq!(WidgetKind::from_control_type("slider"), None);
    assert_eq!(WidgetKind::TextArea.control_type(), Some("textarea"));
}

#[test]
fn test_values_follow_widget_kind() {
    let (mut toolkit, window) = toolkit_with_window();
    let entry = toolkit
        .create_widget(Some(window), &WidgetSpec::new(WidgetKind::Entry))
        .unwrap();
    let label = toolkit
        .create_widget(Some(window), &WidgetSpec::new(WidgetKind::Label).text("hi"))
        .unwrap();

    toolkit.set_value(entry, "42").unwrap();
    assert_eq!(toolkit.value(entry).as_deref(), Some("42"));
    assert_eq!(toolkit.value(label), None);

    assert!(matches!(
        toolkit.set_value(label, "x"),
        Err(ToolkitError::Unsupported { .. })
    ));
    assert!(matches!(
        toolkit.set_text(entry, "x"),
        Err(ToolkitError::Unsupported { .. })
    ));

    toolkit.set_property(label, "fg", "red").unwrap();
    assert!(toolkit.set_property(label, "sparkle", "yes").is_err());
    assert_eq!(toolkit.snapshot(label).unwrap().properties["fg"], "red");
}

#[test]
fn test_destroy_removes_descendants() {
    let (mut toolkit, window) = toolkit_with_window();
    let popup = toolkit
        .create_popup(Some(window), "Popup", 300, 200, 50, 50)
        .unwrap();
    let inner = toolkit
        .create_widget(Some(popup), &WidgetSpec::new(WidgetKind::Button))
        .unwrap();

    toolkit.destroy(popup).unwrap();
    assert!(toolkit.kind(popup).is_none());
    assert!(toolkit.kind(inner).is_none());
    assert!(toolkit.kind(window).is_some());
    assert_eq!(toolkit.destroy(popup), Err(ToolkitError::UnknownWidget(popup)));
}

#[test]
fn test_fire_runs_command_then_bindings() {
    let (mut toolkit, window) = toolkit_with_window();
    let button = toolkit
        .create_widget(Some(window), &WidgetSpec::new(WidgetKind::Button))
        .unwrap();

    toolkit
        .bind(button, PRIMARY_PRESS, Callback::Action("second".into()))
        .unwrap();
    bind_click(&mut toolkit, button, Callback::Action("first".into())).unwrap();

    let fired = toolkit.fire(button, PRIMARY_PRESS).unwrap();
    assert_eq!(
        fired,
        vec![
            Callback::Action("first".into()),
            Callback::Action("second".into())
        ]
    );
    assert!(toolkit.fire(button, "<KeyRelease>").unwrap().is_empty());
}

#[test]
fn test_bind_click_on_label_uses_binding() {
    let (mut toolkit, window) = toolkit_with_window();
    let label = toolkit
        .create_widget(Some(window), &WidgetSpec::new(WidgetKind::Label))
        .unwrap();
    bind_click(&mut toolkit, label, Callback::Action("go".into())).unwrap();
    assert_eq!(toolkit.fire(label, PRIMARY_PRESS).unwrap().len(), 1);
}

#[test]
fn test_without_display() {
    let mut toolkit = HeadlessToolkit::without_display();
    assert!(matches!(
        toolkit.create_window("x", 1, 1, &Style::new()),
        Err(ToolkitError::Unavailable(_))
    ));
}

#[test]
fn test_messages_are_drained() {
    let mut toolkit = HeadlessToolkit::new();
    toolkit.show_message(MessageKind::Info, "Title", "Body");
    let messages = toolkit.take_messages();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].title, "Title");
    assert!(toolkit.take_messages().is_empty());
}

#[test]
fn test_resize_throttle() {
    let start = Instant::now();
    let mut throttle = ResizeThrottle::new(Duration::from_millis(100));
    assert!(throttle.ready_at(start));
    assert!(!throttle.ready_at(start + Duration::from_millis(40)));
    assert!(!throttle.ready_at(start + Duration::from_millis(99)));
    assert!(throttle.ready_at(start + Duration::from_millis(100)));
    assert!(!throttle.ready_at(start + Duration::from_millis(150)));
}
