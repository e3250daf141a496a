//! Component binding: the boundary between the compiler and the presentation
//! layer.
//!
//! The compiler never knows what a component looks like. It only asks the
//! binding whether a name (an HTML tag such as `pre`, or a custom node such as
//! an admonition kind) has a component, and if so hands it the node's
//! attributes and already-rendered children.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Prop carrying a label's rendered inline markup, next to its plain-text
/// `label` prop.
pub const LABEL_HTML: &str = "label-html";

/// What a component receives when it renders a node.
#[derive(Debug, Clone, Copy)]
pub struct Props<'a> {
    /// The bound element or node name
    pub name: &'a str,

    /// Attributes of the element, or props of a custom node
    pub attrs: &'a [(String, String)],

    /// Plain text content of the node
    pub text: &'a str,
}

impl Props<'_> {
    pub fn get(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }
}

/// A presentation component.
pub trait Component: Send + Sync {
    /// Render the node. `children` is the node's rendered inner HTML.
    fn render(&self, props: &Props<'_>, children: &str) -> String;
}

impl<F> Component for F
where
    F: Fn(&Props<'_>, &str) -> String + Send + Sync,
{
    fn render(&self, props: &Props<'_>, children: &str) -> String {
        self(props, children)
    }
}

/// Immutable mapping from element or node names to components.
#[derive(Clone, Default)]
pub struct ComponentBinding {
    components: HashMap<String, Arc<dyn Component>>,
}

impl ComponentBinding {
    /// An empty binding: everything renders as plain HTML.
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `name` to `component`, replacing any previous binding.
    pub fn with(mut self, name: impl Into<String>, component: impl Component + 'static) -> Self {
        self.components.insert(name.into(), Arc::new(component));
        self
    }

    pub fn get(&self, name: &str) -> Option<&dyn Component> {
        self.components.get(name).map(|c| c.as_ref())
    }

    /// Bound names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.components.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl fmt::Debug for ComponentBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentBinding")
            .field("names", &self.names())
            .finish()
    }
}
