//! In-memory toolkit
//!
//! Keeps a widget tree with text, values, placements, properties and
//! bindings so scripts can run without a display. Messages are logged and
//! recorded instead of opening dialogs.

use std::collections::BTreeMap;

use tracing::{debug, info};

use super::*;

/// Attributes accepted by the generic `set_property` fallback
const PROPERTIES: &[&str] = &[
    "anchor",
    "bg",
    "borderwidth",
    "cursor",
    "fg",
    "font",
    "height",
    "justify",
    "padx",
    "pady",
    "relief",
    "state",
    "width",
    "wrap",
];

#[derive(Debug, Clone)]
struct Node {
    kind: WidgetKind,
    parent: Option<WidgetId>,
    text: String,
    value: String,
    style: Style,
    placement: Option<Placement>,
    properties: BTreeMap<String, String>,
    bindings: Vec<(String, Callback)>,
    command: Option<Callback>,
}

impl Node {
    fn new(kind: WidgetKind, parent: Option<WidgetId>, text: &str, style: &Style) -> Self {
        Self {
            kind,
            parent,
            text: text.to_string(),
            value: String::new(),
            style: style.clone(),
            placement: None,
            properties: BTreeMap::new(),
            bindings: Vec::new(),
            command: None,
        }
    }
}

#[derive(Debug)]
pub struct HeadlessToolkit {
    next_id: u64,
    nodes: BTreeMap<WidgetId, Node>,
    grid: Vec<(Option<WidgetId>, GridAxis, u32, u32)>,
    messages: Vec<Message>,
    display_available: bool,
}

impl HeadlessToolkit {
    pub fn new() -> Self {
        Self {
            next_id: 1,
            nodes: BTreeMap::new(),
            grid: Vec::new(),
            messages: Vec::new(),
            display_available: true,
        }
    }

    /// A toolkit whose window creation fails, as on a machine without a display
    pub fn without_display() -> Self {
        Self {
            display_available: false,
            ..Self::new()
        }
    }

    /// Grid weights configured so far as (parent, axis, index, weight)
    pub fn grid_weights(&self) -> &[(Option<WidgetId>, GridAxis, u32, u32)] {
        &self.grid
    }

    fn insert(&mut self, node: Node) -> WidgetId {
        let id = WidgetId(self.next_id);
        self.next_id += 1;
        debug!(%id, kind = ?node.kind, "widget created");
        self.nodes.insert(id, node);
        id
    }

    fn node(&self, id: WidgetId) -> Result<&Node, ToolkitError> {
        self.nodes.get(&id).ok_or(ToolkitError::UnknownWidget(id))
    }

    fn node_mut(&mut self, id: WidgetId) -> Result<&mut Node, ToolkitError> {
        self.nodes.get_mut(&id).ok_or(ToolkitError::UnknownWidget(id))
    }

    fn check_parent(&self, parent: Option<WidgetId>) -> Result<(), ToolkitError> {
        match parent {
            Some(parent) if !self.nodes.contains_key(&parent) => {
                Err(ToolkitError::UnknownWidget(parent))
            }
            _ => Ok(()),
        }
    }
}

impl Default for HeadlessToolkit {
    fn default() -> Self {
        Self::new()
    }
}

fn unsupported(kind: WidgetKind, operation: &str) -> ToolkitError {
    ToolkitError::Unsupported {
        kind,
        operation: operation.to_string(),
    }
}

impl Toolkit for HeadlessToolkit {
    fn create_window(
        &mut self,
        title: &str,
        width: u32,
        height: u32,
        style: &Style,
    ) -> Result<WidgetId, ToolkitError> {
        if !self.display_available {
            return Err(ToolkitError::Unavailable("no display attached".to_string()));
        }
        let mut node = Node::new(WidgetKind::Window, None, title, style);
        node.placement = Some(Placement::Absolute {
            x: 0,
            y: 0,
            width: Some(width),
            height: Some(height),
        });
        Ok(self.insert(node))
    }

    fn create_popup(
        &mut self,
        parent: Option<WidgetId>,
        title: &str,
        width: u32,
        height: u32,
        x: i32,
        y: i32,
    ) -> Result<WidgetId, ToolkitError> {
        self.check_parent(parent)?;
        let mut node = Node::new(WidgetKind::Popup, parent, title, &Style::new());
        node.placement = Some(Placement::Absolute {
            x,
            y,
            width: Some(width),
            height: Some(height),
        });
        Ok(self.insert(node))
    }

    fn create_widget(
        &mut self,
        parent: Option<WidgetId>,
        spec: &WidgetSpec,
    ) -> Result<WidgetId, ToolkitError> {
        self.check_parent(parent)?;
        Ok(self.insert(Node::new(spec.kind, parent, &spec.text, &spec.style)))
    }

    fn place(&mut self, id: WidgetId, placement: Placement) -> Result<(), ToolkitError> {
        self.node_mut(id)?.placement = Some(placement);
        Ok(())
    }

    fn configure_grid(
        &mut self,
        parent: Option<WidgetId>,
        axis: GridAxis,
        index: u32,
        weight: u32,
    ) -> Result<(), ToolkitError> {
        self.check_parent(parent)?;
        self.grid
            .retain(|(p, a, i, _)| !(*p == parent && *a == axis && *i == index));
        self.grid.push((parent, axis, index, weight));
        Ok(())
    }

    fn destroy(&mut self, id: WidgetId) -> Result<(), ToolkitError> {
        self.node(id)?;
        let mut doomed = vec![id];
        let mut index = 0;
        while index < doomed.len() {
            let current = doomed[index];
            doomed.extend(
                self.nodes
                    .iter()
                    .filter(|(_, node)| node.parent == Some(current))
                    .map(|(child, _)| *child),
            );
            index += 1;
        }
        for id in doomed {
            self.nodes.remove(&id);
        }
        Ok(())
    }

    fn kind(&self, id: WidgetId) -> Option<WidgetKind> {
        self.nodes.get(&id).map(|node| node.kind)
    }

    fn value(&self, id: WidgetId) -> Option<String> {
        self.nodes
            .get(&id)
            .filter(|node| node.kind.is_readable())
            .map(|node| node.value.clone())
    }

    fn set_text(&mut self, id: WidgetId, text: &str) -> Result<(), ToolkitError> {
        let node = self.node_mut(id)?;
        match node.kind {
            WidgetKind::Entry | WidgetKind::TextArea => Err(unsupported(node.kind, "text")),
            _ => {
                node.text = text.to_string();
                Ok(())
            }
        }
    }

    fn set_value(&mut self, id: WidgetId, value: &str) -> Result<(), ToolkitError> {
        let node = self.node_mut(id)?;
        match node.kind {
            WidgetKind::Entry | WidgetKind::TextArea => {
                node.value = value.to_string();
                Ok(())
            }
            kind => Err(unsupported(kind, "value")),
        }
    }

    fn set_content(&mut self, id: WidgetId, content: &str) -> Result<(), ToolkitError> {
        let node = self.node_mut(id)?;
        match node.kind {
            WidgetKind::TextArea | WidgetKind::DisplayArea => {
                node.value = content.to_string();
                Ok(())
            }
            kind => Err(unsupported(kind, "content")),
        }
    }

    fn append_content(&mut self, id: WidgetId, content: &str) -> Result<(), ToolkitError> {
        let node = self.node_mut(id)?;
        match node.kind {
            WidgetKind::TextArea | WidgetKind::DisplayArea => {
                node.value.push_str(content);
                Ok(())
            }
            kind => Err(unsupported(kind, "content")),
        }
    }

    fn set_property(&mut self, id: WidgetId, key: &str, value: &str) -> Result<(), ToolkitError> {
        let node = self.node_mut(id)?;
        if !PROPERTIES.contains(&key) {
            return Err(unsupported(node.kind, key));
        }
        node.properties.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn bind(&mut self, id: WidgetId, event: &str, callback: Callback) -> Result<(), ToolkitError> {
        self.node_mut(id)?
            .bindings
            .push((event.to_string(), callback));
        Ok(())
    }

    fn set_command(&mut self, id: WidgetId, callback: Callback) -> Result<(), ToolkitError> {
        let node = self.node_mut(id)?;
        match node.kind {
            WidgetKind::Button => {
                node.command = Some(callback);
                Ok(())
            }
            kind => Err(unsupported(kind, "command")),
        }
    }

    fn fire(&mut self, id: WidgetId, event: &str) -> Result<Vec<Callback>, ToolkitError> {
        let node = self.node(id)?;
        let mut callbacks = Vec::new();
        if event == PRIMARY_PRESS {
            callbacks.extend(node.command.iter().cloned());
        }
        callbacks.extend(
            node.bindings
                .iter()
                .filter(|(bound, _)| bound == event)
                .map(|(_, callback)| callback.clone()),
        );
        debug!(%id, event, callbacks = callbacks.len(), "event fired");
        Ok(callbacks)
    }

    fn show_message(&mut self, kind: MessageKind, title: &str, body: &str) {
        info!(?kind, title, body, "message");
        self.messages.push(Message {
            kind,
            title: title.to_string(),
            body: body.to_string(),
        });
    }

    fn take_messages(&mut self) -> Vec<Message> {
        std::mem::take(&mut self.messages)
    }

    fn snapshot(&self, id: WidgetId) -> Option<WidgetSnapshot> {
        self.nodes.get(&id).map(|node| WidgetSnapshot {
            id,
            kind: node.kind,
            parent: node.parent,
            text: node.text.clone(),
            value: node.kind.is_readable().then(|| node.value.clone()),
            placement: node.placement.clone(),
            style: node.style.clone(),
            properties: node.properties.clone(),
        })
    }

    fn widgets(&self) -> Vec<WidgetSnapshot> {
        self.nodes
            .keys()
            .filter_map(|id| self.snapshot(*id))
            .collect()
    }
}
