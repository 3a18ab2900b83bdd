//! Locating the gateway object and its methods in the address space

use std::collections::HashMap;

use opcua::types::NodeId;

use crate::error::ResolutionError;
use crate::opcua::browser::{BrowsedNode, NodeClass};

/// Pick the single child whose display name contains `marker`.
///
/// Zero matches means the plugin is offline. More than one match is
/// rejected as well: silently choosing one could aim writes at the wrong
/// bus.
pub fn resolve_gateway<'a>(children: &'a [BrowsedNode], marker: &str) -> Result<&'a BrowsedNode, ResolutionError> {
    let matches: Vec<&BrowsedNode> = children
        .iter()
        .filter(|child| child.display_name.contains(marker))
        .collect();

    match matches.as_slice() {
        [] => Err(ResolutionError::NoGateway {
            marker: marker.to_string(),
        }),
        [single] => Ok(*single),
        many => Err(ResolutionError::AmbiguousGateway {
            marker: marker.to_string(),
            count: many.len(),
            candidates: many
                .iter()
                .map(|n| format!("{} ({})", n.display_name, n.node_id))
                .collect::<Vec<_>>()
                .join(", "),
        }),
    }
}

/// Method nodes of the gateway object keyed by `(namespace, browse name)`
#[derive(Debug, Default, Clone)]
pub struct MethodDirectory {
    methods: HashMap<(u16, String), NodeId>,
}

impl MethodDirectory {
    pub fn from_children(children: &[BrowsedNode]) -> Self {
        let methods = children
            .iter()
            .filter(|child| child.node_class == NodeClass::Method)
            .map(|child| ((child.browse_namespace, child.browse_name.clone()), child.node_id.clone()))
            .collect();
        Self { methods }
    }

    pub fn lookup(&self, namespace: u16, name: &str) -> Option<&NodeId> {
        self.methods.get(&(namespace, name.to_string()))
    }

    pub fn len(&self) -> usize {
        self.methods.len()
    }

    pub fn is_empty(&self) -> bool {
        self.methods.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn object(id: u32, name: &str) -> BrowsedNode {
        BrowsedNode::new(NodeId::new(2, id), 2, name, name, NodeClass::Object)
    }

    #[test]
    fn test_single_match_resolves() {
        let children = vec![
            object(1, "Server"),
            object(2, "Objects/ModbusPlugin-TCP-1"),
            object(3, "OpcuaPlugin"),
        ];
        let found = resolve_gateway(&children, "ModbusPlugin-TCP").unwrap();
        assert_eq!(found.node_id, NodeId::new(2, 2u32));
    }

    #[test]
    fn test_no_match_is_an_error() {
        let children = vec![object(1, "Server")];
        assert!(matches!(
            resolve_gateway(&children, "ModbusPlugin-TCP"),
            Err(ResolutionError::NoGateway { .. })
        ));
        assert!(resolve_gateway(&[], "ModbusPlugin-TCP").is_err());
    }

    #[test]
    fn test_multiple_matches_are_rejected() {
        let children = vec![
            object(1, "ModbusPlugin-TCP-1"),
            object(2, "ModbusPlugin-TCP-2"),
        ];
        match resolve_gateway(&children, "ModbusPlugin-TCP") {
            Err(ResolutionError::AmbiguousGateway { count, candidates, .. }) => {
                assert_eq!(count, 2);
                assert!(candidates.contains("ModbusPlugin-TCP-1"));
                assert!(candidates.contains("ModbusPlugin-TCP-2"));
            }
            other => panic!("expected ambiguity, got {:?}", other),
        }
    }

    #[test]
    fn test_method_directory_filters_and_keys_by_namespace() {
        let children = vec![
            BrowsedNode::new(NodeId::new(2, 10u32), 2, "read_coils", "read_coils", NodeClass::Method),
            BrowsedNode::new(NodeId::new(3, 11u32), 3, "read_coils", "read_coils", NodeClass::Method),
            BrowsedNode::new(NodeId::new(2, 12u32), 2, "status", "status", NodeClass::Variable),
        ];
        let dir = MethodDirectory::from_children(&children);
        assert_eq!(dir.len(), 2);
        assert_eq!(dir.lookup(2, "read_coils"), Some(&NodeId::new(2, 10u32)));
        assert_eq!(dir.lookup(3, "read_coils"), Some(&NodeId::new(3, 11u32)));
        assert!(dir.lookup(2, "status").is_none());
    }
}
