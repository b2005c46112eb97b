//! Run-all-examples walkthrough
//!
//! Calls the five operations once per protocol, feeding identifiers found by
//! earlier steps into the parameterised ones.

use crate::{
    client::RemoteCaller,
    models::Record,
    types::{Operation, Protocol},
};
use serde::Serialize;

/// Records shown per step
pub const PREVIEW_LEN: usize = 2;

/// How one step of the walkthrough ended
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum StepOutcome {
    Records { count: usize, preview: Vec<Record> },
    Failed { error: String },
}

/// One operation of the walkthrough
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WalkthroughStep {
    pub operation: Operation,
    pub outcome: StepOutcome,
}

/// The steps run against one protocol; a failure ends the protocol's steps
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProtocolWalkthrough {
    pub protocol: Protocol,
    pub steps: Vec<WalkthroughStep>,
}

impl ProtocolWalkthrough {
    pub fn completed(&self) -> bool {
        self.steps.len() == 5 && self.steps.iter().all(|step| matches!(step.outcome, StepOutcome::Records { .. }))
    }
}

/// Walkthrough results for every protocol, in the order they ran
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Walkthrough {
    pub protocols: Vec<ProtocolWalkthrough>,
}

/// Run the five operations against each protocol in turn
pub async fn run_walkthrough(caller: &dyn RemoteCaller, protocols: &[Protocol], fallback_id: i64) -> Walkthrough {
    let mut results = Vec::with_capacity(protocols.len());
    for &protocol in protocols {
        results.push(walk_protocol(caller, protocol, fallback_id).await);
    }
    Walkthrough { protocols: results }
}

async fn walk_protocol(caller: &dyn RemoteCaller, protocol: Protocol, fallback_id: i64) -> ProtocolWalkthrough {
    let mut steps = Vec::with_capacity(5);
    let mut user_id = fallback_id;
    let mut track_id = fallback_id;
    let mut collection_id = fallback_id;

    let plan: [fn(i64, i64, i64) -> Operation; 5] = [
        |_, _, _| Operation::ListUsers,
        |_, _, _| Operation::ListTracks,
        |user, _, _| Operation::ListUserCollections { user_id: user },
        |_, _, collection| Operation::ListCollectionItems { collection_id: collection },
        |_, track, _| Operation::ListCollectionsByItem { item_id: track },
    ];

    for build in plan {
        let operation = build(user_id, track_id, collection_id);
        tracing::debug!(%protocol, operation = operation.name(), "walkthrough step");

        match caller.call(protocol, operation).await {
            Ok(records) => {
                if let Some(first) = records.first() {
                    match operation {
                        Operation::ListUsers => user_id = first.id(),
                        Operation::ListTracks => track_id = first.id(),
                        Operation::ListUserCollections { .. } => collection_id = first.id(),
                        _ => {}
                    }
                }
                steps.push(WalkthroughStep {
                    operation,
                    outcome: StepOutcome::Records {
                        count: records.len(),
                        preview: records.into_iter().take(PREVIEW_LEN).collect(),
                    },
                });
            }
            Err(error) => {
                tracing::warn!(%protocol, %error, "walkthrough step failed");
                steps.push(WalkthroughStep {
                    operation,
                    outcome: StepOutcome::Failed { error: error.to_string() },
                });
                break;
            }
        }
    }

    ProtocolWalkthrough { protocol, steps }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ClientError, RemoteCallError};
    use crate::models::{Collection, Track, User};
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct ScriptedCaller {
        calls: Mutex<Vec<(Protocol, Operation)>>,
    }

    #[async_trait]
    impl RemoteCaller for ScriptedCaller {
        async fn call(&self, protocol: Protocol, operation: Operation) -> Result<Vec<Record>, ClientError> {
            self.calls.lock().unwrap().push((protocol, operation));
            if protocol == Protocol::Soap && operation == Operation::ListTracks {
                return Err(RemoteCallError::new(protocol, operation.name(), "HTTP 500").into());
            }
            Ok(match operation {
                Operation::ListUsers => vec![
                    Record::User(User { id: 7, name: "Ana".into(), age: Some(30) }),
                    Record::User(User { id: 8, name: "Bruno".into(), age: None }),
                    Record::User(User { id: 9, name: "Caio".into(), age: None }),
                ],
                Operation::ListTracks | Operation::ListCollectionItems { .. } => {
                    vec![Record::Track(Track { id: 42, name: "Song".into(), artist: "Band".into() })]
                }
                Operation::ListUserCollections { .. } => Vec::new(),
                Operation::ListCollectionsByItem { .. } => {
                    vec![Record::Collection(Collection { id: 3, name: "Mix".into() })]
                }
            })
        }
    }

    #[tokio::test]
    async fn test_identifiers_flow_between_steps() {
        let caller = ScriptedCaller { calls: Mutex::new(Vec::new()) };
        let walkthrough = run_walkthrough(&caller, &[Protocol::Rest], 1).await;

        let rest = &walkthrough.protocols[0];
        assert!(rest.completed());
        assert_eq!(
            rest.steps.iter().map(|s| s.operation).collect::<Vec<_>>(),
            vec![
                Operation::ListUsers,
                Operation::ListTracks,
                Operation::ListUserCollections { user_id: 7 },
                // no collections came back, so the fallback id is used
                Operation::ListCollectionItems { collection_id: 1 },
                Operation::ListCollectionsByItem { item_id: 42 },
            ]
        );
        match &rest.steps[0].outcome {
            StepOutcome::Records { count, preview } => {
                assert_eq!(*count, 3);
                assert_eq!(preview.len(), PREVIEW_LEN);
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_failure_moves_on_to_next_protocol() {
        let caller = ScriptedCaller { calls: Mutex::new(Vec::new()) };
        let walkthrough = run_walkthrough(&caller, &[Protocol::Soap, Protocol::Grpc], 1).await;

        let soap = &walkthrough.protocols[0];
        assert_eq!(soap.steps.len(), 2);
        assert!(!soap.completed());
        assert!(matches!(&soap.steps[1].outcome, StepOutcome::Failed { error } if error.contains("HTTP 500")));

        assert!(walkthrough.protocols[1].completed());
        assert_eq!(caller.calls.lock().unwrap().len(), 2 + 5);
    }
}
