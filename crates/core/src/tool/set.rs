use std::fmt::{self, Debug};
use std::sync::Arc;

use agent_relay_model::ModelTool;

use super::Tool;
use super::object::{ToolObject, ToolObjectImpl};

/// An ordered collection of tools available to an agent.
///
/// Cloning is cheap, the tools themselves are shared.
#[derive(Clone, Default)]
pub struct ToolSet {
    tools: Vec<Arc<dyn ToolObject>>,
}

impl ToolSet {
    /// Creates an empty set.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a tool and returns the set.
    #[inline]
    pub fn with_tool<T: Tool>(mut self, tool: T) -> Self {
        self.add_tool(tool);
        self
    }

    /// Adds a tool to the end of the set.
    ///
    /// Names are expected to be unique but this isn't checked. Lookups
    /// return the first tool with a matching name.
    #[inline]
    pub fn add_tool<T: Tool>(&mut self, tool: T) {
        self.tools.push(Arc::new(ToolObjectImpl(tool)));
    }

    /// Returns the number of tools.
    #[inline]
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Returns `true` if the set has no tools.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Returns the tool names, in insertion order.
    #[inline]
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.tools.iter().map(|tool| tool.name())
    }

    /// Returns `true` if a tool with the given name exists.
    #[inline]
    pub fn contains(&self, name: &str) -> bool {
        self.find(name).is_some()
    }

    #[inline]
    pub(crate) fn find(&self, name: &str) -> Option<&Arc<dyn ToolObject>> {
        self.tools.iter().find(|tool| tool.name() == name)
    }

    /// Derives the calling signature of every tool.
    pub(crate) fn signatures(&self) -> crate::Result<Vec<ModelTool>> {
        self.tools
            .iter()
            .map(|tool| signature_of(tool.as_ref()))
            .collect()
    }
}

impl Debug for ToolSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}

fn signature_of(tool: &dyn ToolObject) -> crate::Result<ModelTool> {
    ModelTool::from_schema(
        tool.name(),
        tool.description(),
        tool.parameter_schema(),
    )
    .ok_or_else(|| crate::Error::InvalidTool {
        name: tool.name().to_owned(),
        reason: "the parameter schema must describe an object".to_owned(),
    })
}
