//! Node browsing functionality
//!
//! Browse service wrapper used to list the Objects folder and the methods
//! hanging off the gateway object.

use anyhow::{Context, Result};

use opcua::client::Session;
use opcua::types::{
    BrowseDescription, BrowseDirection, BrowseResultMask, NodeId, ObjectId, ReferenceTypeId,
};

/// Information about a browsed node
#[derive(Debug, Clone, PartialEq)]
pub struct BrowsedNode {
    /// The NodeId of this node
    pub node_id: NodeId,
    /// Namespace index of the browse name
    pub browse_namespace: u16,
    /// Name part of the browse name
    pub browse_name: String,
    /// The display name (human-readable)
    pub display_name: String,
    /// The node class (Object, Variable, Method, etc.)
    pub node_class: NodeClass,
}

impl BrowsedNode {
    pub fn new(
        node_id: NodeId,
        browse_namespace: u16,
        browse_name: impl Into<String>,
        display_name: impl Into<String>,
        node_class: NodeClass,
    ) -> Self {
        Self {
            node_id,
            browse_namespace,
            browse_name: browse_name.into(),
            display_name: display_name.into(),
            node_class,
        }
    }

    /// Browse name in `ns:name` form
    pub fn qualified_name(&self) -> String {
        format!("{}:{}", self.browse_namespace, self.browse_name)
    }
}

/// OPC-UA Node Classes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeClass {
    Object,
    Variable,
    Method,
    ObjectType,
    VariableType,
    ReferenceType,
    DataType,
    View,
    Unknown,
}

impl NodeClass {
    /// Convert from OPC-UA node class enum
    pub fn from_opcua(node_class: opcua::types::NodeClass) -> Self {
        match node_class {
            opcua::types::NodeClass::Object => NodeClass::Object,
            opcua::types::NodeClass::Variable => NodeClass::Variable,
            opcua::types::NodeClass::Method => NodeClass::Method,
            opcua::types::NodeClass::ObjectType => NodeClass::ObjectType,
            opcua::types::NodeClass::VariableType => NodeClass::VariableType,
            opcua::types::NodeClass::ReferenceType => NodeClass::ReferenceType,
            opcua::types::NodeClass::DataType => NodeClass::DataType,
            opcua::types::NodeClass::View => NodeClass::View,
            _ => NodeClass::Unknown,
        }
    }
}

impl std::fmt::Display for NodeClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            NodeClass::Object => "Object",
            NodeClass::Variable => "Variable",
            NodeClass::Method => "Method",
            NodeClass::ObjectType => "ObjectType",
            NodeClass::VariableType => "VariableType",
            NodeClass::ReferenceType => "ReferenceType",
            NodeClass::DataType => "DataType",
            NodeClass::View => "View",
            NodeClass::Unknown => "Unknown",
        };
        f.write_str(name)
    }
}

/// NodeId of the standard Objects folder
pub fn objects_folder_id() -> NodeId {
    ObjectId::ObjectsFolder.into()
}

/// Browse a specific node and return its children
pub async fn browse_node(session: &Session, parent_node_id: &NodeId) -> Result<Vec<BrowsedNode>> {
    tracing::debug!("Browsing node: {}", parent_node_id);

    let browse_description = BrowseDescription {
        node_id: parent_node_id.clone(),
        browse_direction: BrowseDirection::Forward,
        reference_type_id: ReferenceTypeId::HierarchicalReferences.into(),
        include_subtypes: true,
        node_class_mask: 0xFF, // All node classes
        result_mask: BrowseResultMask::All as u32,
    };

    let browse_result = session
        .browse(&[browse_description], 0, None)
        .await
        .context("Browse request failed")?;

    let Some(result) = browse_result.first() else {
        return Ok(Vec::new());
    };

    if !result.status_code.is_good() {
        anyhow::bail!("Browse failed with status: {:?}", result.status_code);
    }

    let nodes: Vec<BrowsedNode> = result
        .references
        .as_ref()
        .map(|refs| {
            refs.iter()
                .map(|reference| BrowsedNode {
                    node_id: reference.node_id.node_id.clone(),
                    browse_namespace: reference.browse_name.namespace_index,
                    browse_name: reference.browse_name.name.to_string(),
                    display_name: reference.display_name.text.to_string(),
                    node_class: NodeClass::from_opcua(reference.node_class),
                })
                .collect()
        })
        .unwrap_or_default();

    tracing::debug!("Found {} children for {}", nodes.len(), parent_node_id);

    Ok(nodes)
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_qualified_name() {
        let node = BrowsedNode::new(NodeId::new(2, 7001u32), 2, "read_coils", "read_coils", NodeClass::Method);
        assert_eq!(node.qualified_name(), "2:read_coils");
    }

    #[test]
    fn test_node_class_display() {
        assert_eq!(NodeClass::Method.to_string(), "Method");
        assert_eq!(NodeClass::from_opcua(opcua::types::NodeClass::Object), NodeClass::Object);
    }
}
