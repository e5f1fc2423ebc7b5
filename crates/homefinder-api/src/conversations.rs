//! Conversation aggregation: the derived view over flat message rows.
//!
//! A conversation is identified by (counterparty, property) from the
//! viewer's perspective. Nothing is persisted: the grouping is computed
//! from an already-fetched, already-authorized message list and discarded
//! after the response.

use std::collections::HashMap;
use std::collections::hash_map::Entry;

use homefinder_types::models::{Conversation, Message};

/// A user may only read a thread they are one side of. This is the
/// authorization contract made explicit, not just a side effect of the
/// symmetric WHERE clause.
pub fn is_participant(user_id: i64, sender_id: i64, receiver_id: i64) -> bool {
    user_id == sender_id || user_id == receiver_id
}

/// Drop any message the viewer is not a party to. Thread queries already
/// scope rows to the symmetric (viewer, counterparty) pair, so this is the
/// same contract enforced at the row level instead of trusted to the query
/// text.
pub fn participant_messages(viewer_id: i64, messages: Vec<Message>) -> Vec<Message> {
    messages
        .into_iter()
        .filter(|m| is_participant(viewer_id, m.sender_id, m.receiver_id))
        .collect()
}

/// Group a viewer's messages into conversations.
///
/// The input must be sorted newest-first (the raw `GET /messages` order):
/// the first message seen per (counterparty, property) key is that
/// conversation's last message, and ties on created_at resolve to whichever
/// the fetch ordered first. Unread counts accumulate over messages addressed
/// to the viewer with read=false. The result is sorted by last-message time,
/// newest conversation first.
pub fn aggregate(viewer_id: i64, messages: &[Message]) -> Vec<Conversation> {
    let mut order: Vec<(i64, i64)> = Vec::new();
    let mut groups: HashMap<(i64, i64), Conversation> = HashMap::new();

    for message in messages {
        let other = if message.sender_id == viewer_id {
            &message.receiver
        } else {
            &message.sender
        };
        let key = (other.id, message.property.id);
        let unread_here = usize::from(message.receiver_id == viewer_id && !message.read);

        match groups.entry(key) {
            Entry::Vacant(slot) => {
                order.push(key);
                slot.insert(Conversation {
                    user: other.clone(),
                    property: message.property.clone(),
                    last_message: message.clone(),
                    unread_count: unread_here,
                });
            }
            Entry::Occupied(mut existing) => {
                existing.get_mut().unread_count += unread_here;
            }
        }
    }

    let mut conversations: Vec<Conversation> = order
        .into_iter()
        .filter_map(|key| groups.remove(&key))
        .collect();

    // Stable sort: equal timestamps keep first-seen order.
    conversations.sort_by(|a, b| b.last_message.created_at.cmp(&a.last_message.created_at));
    conversations
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, TimeZone, Utc};
    use homefinder_types::models::{Property, PropertyType, Role, User};

    fn user(id: i64, role: Role) -> User {
        User {
            id,
            username: format!("user{}", id),
            full_name: format!("User {}", id),
            email: format!("user{}@example.com", id),
            role,
        }
    }

    fn property(id: i64, owner_id: i64) -> Property {
        Property {
            id,
            owner_id,
            name: format!("Property {}", id),
            description: "A lovely place to stay".into(),
            price: 800_000,
            location: "Jakarta".into(),
            property_type: PropertyType::Kost,
            image_url: None,
            created_at: Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap(),
            updated_at: Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap(),
        }
    }

    fn message(
        id: i64,
        sender: &User,
        receiver: &User,
        prop: &Property,
        read: bool,
        at: DateTime<Utc>,
    ) -> Message {
        Message {
            id,
            sender_id: sender.id,
            receiver_id: receiver.id,
            property_id: prop.id,
            content: format!("message {}", id),
            read,
            created_at: at,
            sender: sender.clone(),
            receiver: receiver.clone(),
            property: prop.clone(),
        }
    }

    fn at(secs: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 6, 1, 12, 0, secs).unwrap()
    }

    #[test]
    fn empty_input_yields_no_conversations() {
        assert!(aggregate(1, &[]).is_empty());
    }

    #[test]
    fn groups_by_counterparty_and_property() {
        let tenant = user(1, Role::Tenant);
        let owner = user(2, Role::Owner);
        let p1 = property(10, owner.id);
        let p2 = property(11, owner.id);

        // Newest-first input, two properties with the same counterparty.
        let messages = vec![
            message(4, &owner, &tenant, &p2, false, at(4)),
            message(3, &tenant, &owner, &p2, true, at(3)),
            message(2, &owner, &tenant, &p1, false, at(2)),
            message(1, &tenant, &owner, &p1, true, at(1)),
        ];

        let conversations = aggregate(tenant.id, &messages);
        assert_eq!(conversations.len(), 2);
        assert_eq!(conversations[0].property.id, p2.id);
        assert_eq!(conversations[0].last_message.id, 4);
        assert_eq!(conversations[1].property.id, p1.id);
        assert_eq!(conversations[1].last_message.id, 2);
    }

    #[test]
    fn unread_counts_only_messages_addressed_to_viewer() {
        let tenant = user(1, Role::Tenant);
        let owner = user(2, Role::Owner);
        let p = property(10, owner.id);

        let messages = vec![
            message(3, &owner, &tenant, &p, false, at(3)),
            message(2, &owner, &tenant, &p, false, at(2)),
            // Viewer's own unread outgoing message must not count.
            message(1, &tenant, &owner, &p, false, at(1)),
        ];

        let conversations = aggregate(tenant.id, &messages);
        assert_eq!(conversations.len(), 1);
        assert_eq!(conversations[0].unread_count, 2);

        let owner_side = aggregate(owner.id, &messages);
        assert_eq!(owner_side[0].unread_count, 1);
    }

    #[test]
    fn first_seen_wins_on_created_at_ties() {
        let tenant = user(1, Role::Tenant);
        let owner = user(2, Role::Owner);
        let p = property(10, owner.id);

        // Same timestamp; the fetch order (id DESC) puts id=2 first.
        let messages = vec![
            message(2, &owner, &tenant, &p, false, at(1)),
            message(1, &tenant, &owner, &p, true, at(1)),
        ];

        let conversations = aggregate(tenant.id, &messages);
        assert_eq!(conversations[0].last_message.id, 2);
    }

    #[test]
    fn conversations_sorted_by_last_message_newest_first() {
        let tenant = user(1, Role::Tenant);
        let owner_a = user(2, Role::Owner);
        let owner_b = user(3, Role::Owner);
        let pa = property(10, owner_a.id);
        let pb = property(11, owner_b.id);

        let messages = vec![
            message(3, &owner_b, &tenant, &pb, false, at(30)),
            message(2, &owner_a, &tenant, &pa, false, at(20)),
            message(1, &tenant, &owner_b, &pb, true, at(10)),
        ];

        let conversations = aggregate(tenant.id, &messages);
        assert_eq!(conversations.len(), 2);
        assert_eq!(conversations[0].user.id, owner_b.id);
        assert_eq!(conversations[1].user.id, owner_a.id);
    }

    #[test]
    fn every_message_lands_in_exactly_one_conversation() {
        let tenant = user(1, Role::Tenant);
        let owner_a = user(2, Role::Owner);
        let owner_b = user(3, Role::Owner);
        let pa = property(10, owner_a.id);
        let pb = property(11, owner_b.id);

        let messages = vec![
            message(5, &owner_a, &tenant, &pb, false, at(5)),
            message(4, &owner_b, &tenant, &pb, false, at(4)),
            message(3, &tenant, &owner_a, &pa, true, at(3)),
            message(2, &owner_a, &tenant, &pa, false, at(2)),
            message(1, &tenant, &owner_b, &pb, true, at(1)),
        ];

        let conversations = aggregate(tenant.id, &messages);

        // Keys are distinct (counterparty, property) pairs.
        let mut keys: Vec<(i64, i64)> = conversations
            .iter()
            .map(|c| (c.user.id, c.property.id))
            .collect();
        keys.sort_unstable();
        keys.dedup();
        assert_eq!(keys.len(), conversations.len());

        // Each message maps to a key present in the result.
        for m in &messages {
            let other = if m.sender_id == tenant.id { m.receiver.id } else { m.sender.id };
            assert!(keys.binary_search(&(other, m.property.id)).is_ok());
        }
    }

    #[test]
    fn participant_predicate() {
        assert!(is_participant(1, 1, 2));
        assert!(is_participant(1, 2, 1));
        assert!(!is_participant(3, 1, 2));
    }

    #[test]
    fn participant_filter_drops_foreign_messages() {
        let tenant = user(1, Role::Tenant);
        let owner = user(2, Role::Owner);
        let stranger = user(3, Role::Tenant);
        let p = property(10, owner.id);

        let messages = vec![
            message(3, &owner, &tenant, &p, false, at(3)),
            // A row between two other users must never reach the viewer.
            message(2, &stranger, &owner, &p, false, at(2)),
            message(1, &tenant, &owner, &p, true, at(1)),
        ];

        let kept = participant_messages(tenant.id, messages);
        assert_eq!(kept.len(), 2);
        assert!(kept.iter().all(|m| is_participant(tenant.id, m.sender_id, m.receiver_id)));

        assert!(participant_messages(stranger.id, vec![]).is_empty());
    }
}
