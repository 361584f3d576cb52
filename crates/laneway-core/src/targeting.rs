//! Notification targeting policy.
//!
//! Decides who receives a durable notification when a mutation commits.
//! Keyed by the MUTATION, not the resulting record kind: label edits also
//! produce `Updated` records but must stay silent, so the record kind alone
//! cannot drive targeting.
//!
//! | Mutation                      | Recipients                        |
//! |-------------------------------|-----------------------------------|
//! | CreateItem                    | the item's initial assignees      |
//! | UpdateItem, MoveItem,         | the item's current assignees      |
//! | AddComment                    |                                   |
//! | AddAssignee                   | current assignees + the new one   |
//! | DeleteItem, RemoveAssignee,   | nobody                            |
//! | AddLabel, RemoveLabel,        |                                   |
//! | MoveQueue                     |                                   |
//!
//! The actor never notifies themselves; duplicates collapse to one,
//! preserving first-seen order.

use std::collections::HashSet;

use uuid::Uuid;

use crate::models::Mutation;

/// Users who should receive a durable notification for `mutation`.
///
/// `assignees` is the addressed item's assignee set as read under the
/// engine's serialization (for `CreateItem` the caller passes the request's
/// initial assignees, since the item does not exist yet).
pub fn recipients(mutation: &Mutation, assignees: &[Uuid], actor_id: Uuid) -> Vec<Uuid> {
    let candidates: Vec<Uuid> = match mutation {
        Mutation::CreateItem { .. }
        | Mutation::UpdateItem { .. }
        | Mutation::MoveItem { .. }
        | Mutation::AddComment { .. } => assignees.to_vec(),
        Mutation::AddAssignee { user_id, .. } => {
            let mut all = assignees.to_vec();
            all.push(*user_id);
            all
        }
        Mutation::DeleteItem { .. }
        | Mutation::RemoveAssignee { .. }
        | Mutation::AddLabel { .. }
        | Mutation::RemoveLabel { .. }
        | Mutation::MoveQueue { .. } => Vec::new(),
    };

    let mut seen = HashSet::new();
    candidates
        .into_iter()
        .filter(|id| *id != actor_id && seen.insert(*id))
        .collect()
}
