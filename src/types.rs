//! Type definitions and aliases

use serde::{Deserialize, Serialize};
use std::fmt;

// Re-export commonly used types
pub use crate::error::{AppError, Result};

/// Wire protocols the unified client speaks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, clap::ValueEnum)]
pub enum Protocol {
    /// JSON over plain HTTP GET
    #[value(name = "rest")]
    Rest,
    /// Single-endpoint GraphQL over HTTP POST
    #[value(name = "graphql")]
    GraphQl,
    /// WSDL-described SOAP 1.1 service
    #[value(name = "soap")]
    Soap,
    /// Unary gRPC calls over HTTP/2
    #[value(name = "grpc")]
    Grpc,
}

impl Protocol {
    /// All protocols in report order
    pub const ALL: [Protocol; 4] = [Protocol::Rest, Protocol::GraphQl, Protocol::Soap, Protocol::Grpc];

    /// Display label used in every report
    pub fn label(&self) -> &'static str {
        match self {
            Protocol::Rest => "REST",
            Protocol::GraphQl => "GraphQL",
            Protocol::Soap => "SOAP",
            Protocol::Grpc => "gRPC",
        }
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Shape of the records an operation returns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RecordKind {
    User,
    Track,
    Collection,
}

/// The five logical queries, without their arguments
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
pub enum OperationKind {
    ListUsers,
    ListTracks,
    ListUserCollections,
    ListCollectionItems,
    ListCollectionsByItem,
}

impl OperationKind {
    /// All operations in suite order
    pub const ALL: [OperationKind; 5] = [
        OperationKind::ListUsers,
        OperationKind::ListTracks,
        OperationKind::ListUserCollections,
        OperationKind::ListCollectionItems,
        OperationKind::ListCollectionsByItem,
    ];

    /// Bind this kind to an identifier (ignored by the argument-free kinds)
    pub fn with_id(self, id: i64) -> Operation {
        match self {
            OperationKind::ListUsers => Operation::ListUsers,
            OperationKind::ListTracks => Operation::ListTracks,
            OperationKind::ListUserCollections => Operation::ListUserCollections { user_id: id },
            OperationKind::ListCollectionItems => Operation::ListCollectionItems { collection_id: id },
            OperationKind::ListCollectionsByItem => Operation::ListCollectionsByItem { item_id: id },
        }
    }
}

/// A logical query with its argument
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Operation {
    ListUsers,
    ListTracks,
    ListUserCollections { user_id: i64 },
    ListCollectionItems { collection_id: i64 },
    ListCollectionsByItem { item_id: i64 },
}

impl Operation {
    /// The full default suite, parameterised operations bound to `id`
    pub fn suite(id: i64) -> Vec<Operation> {
        OperationKind::ALL.iter().map(|kind| kind.with_id(id)).collect()
    }

    pub fn kind(&self) -> OperationKind {
        match self {
            Operation::ListUsers => OperationKind::ListUsers,
            Operation::ListTracks => OperationKind::ListTracks,
            Operation::ListUserCollections { .. } => OperationKind::ListUserCollections,
            Operation::ListCollectionItems { .. } => OperationKind::ListCollectionItems,
            Operation::ListCollectionsByItem { .. } => OperationKind::ListCollectionsByItem,
        }
    }

    /// Stable identifier used in logs and errors
    pub fn name(&self) -> &'static str {
        match self {
            Operation::ListUsers => "list_users",
            Operation::ListTracks => "list_tracks",
            Operation::ListUserCollections { .. } => "list_user_collections",
            Operation::ListCollectionItems { .. } => "list_collection_items",
            Operation::ListCollectionsByItem { .. } => "list_collections_by_item",
        }
    }

    /// Human-readable label for reports
    pub fn label(&self) -> String {
        match self {
            Operation::ListUsers => "List users".to_string(),
            Operation::ListTracks => "List tracks".to_string(),
            Operation::ListUserCollections { user_id } => format!("Collections of user (ID={})", user_id),
            Operation::ListCollectionItems { collection_id } => {
                format!("Tracks in collection (ID={})", collection_id)
            }
            Operation::ListCollectionsByItem { item_id } => {
                format!("Collections with track (ID={})", item_id)
            }
        }
    }

    /// The numeric argument, if this operation takes one
    pub fn argument(&self) -> Option<i64> {
        match *self {
            Operation::ListUsers | Operation::ListTracks => None,
            Operation::ListUserCollections { user_id } => Some(user_id),
            Operation::ListCollectionItems { collection_id } => Some(collection_id),
            Operation::ListCollectionsByItem { item_id } => Some(item_id),
        }
    }

    pub fn record_kind(&self) -> RecordKind {
        match self {
            Operation::ListUsers => RecordKind::User,
            Operation::ListTracks | Operation::ListCollectionItems { .. } => RecordKind::Track,
            Operation::ListUserCollections { .. } | Operation::ListCollectionsByItem { .. } => {
                RecordKind::Collection
            }
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_protocol_labels() {
        let labels: Vec<&str> = Protocol::ALL.iter().map(|p| p.label()).collect();
        assert_eq!(labels, vec!["REST", "GraphQL", "SOAP", "gRPC"]);
        assert_eq!(Protocol::Grpc.to_string(), "gRPC");
    }

    #[test]
    fn test_suite_binds_identifier() {
        let suite = Operation::suite(7);
        assert_eq!(suite.len(), 5);
        assert_eq!(suite[0].argument(), None);
        assert_eq!(suite[1].argument(), None);
        assert!(suite[2..].iter().all(|op| op.argument() == Some(7)));
    }

    #[test]
    fn test_record_kinds() {
        assert_eq!(Operation::ListUsers.record_kind(), RecordKind::User);
        assert_eq!(Operation::ListCollectionItems { collection_id: 1 }.record_kind(), RecordKind::Track);
        assert_eq!(Operation::ListCollectionsByItem { item_id: 1 }.record_kind(), RecordKind::Collection);
    }

    #[test]
    fn test_kind_round_trip() {
        for kind in OperationKind::ALL {
            assert_eq!(kind.with_id(3).kind(), kind);
        }
    }
}
