// Access policy: one decision function over closed resource/action enums.
//
// Two independent gates protect events: a coarse list-level gate (may this
// actor issue this query at all) and a per-object gate. Non-admin event
// listings are additionally scoped to the caller's own events by the filter
// pipeline, so cross-user queries deny by yielding an empty result rather
// than a 403.

use uuid::Uuid;

/// The authenticated caller, as established by the auth middleware.
#[derive(Debug, Clone, PartialEq)]
pub struct Actor {
    pub id: Uuid,
    pub username: String,
    pub is_admin: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Read,
    Create,
    Update,
    Delete,
}

/// A closed set of protected resource kinds with just the ownership facts
/// the policy needs.
#[derive(Debug, Clone, PartialEq)]
pub enum Resource {
    Link { creator_id: Uuid },
    Event { link_creator_id: Option<Uuid> },
    Preference { user_id: Uuid },
    User { id: Uuid },
}

/// Per-object decision. Stateless; evaluated per request and, for item
/// operations, per object.
pub fn allow(actor: Option<&Actor>, action: Action, resource: &Resource) -> bool {
    // Administrators are always allowed
    if actor.map(|a| a.is_admin).unwrap_or(false) {
        return true;
    }

    match resource {
        Resource::Link { creator_id } => match action {
            Action::Read => true,
            Action::Create => actor.is_some(),
            Action::Update | Action::Delete => is_actor(actor, *creator_id),
        },
        Resource::Event { link_creator_id } => match action {
            // Anyone, including anonymous visitors, may record an event
            Action::Create => true,
            Action::Read => match link_creator_id {
                Some(creator_id) => is_actor(actor, *creator_id),
                None => false,
            },
            // Events are immutable and undeletable for ordinary users;
            // the HTTP layer answers 405 before this is ever consulted
            Action::Update | Action::Delete => false,
        },
        Resource::Preference { user_id } => is_actor(actor, *user_id),
        Resource::User { id } => is_actor(actor, *id),
    }
}

/// Coarse list-level gate for event queries: admins always pass, anonymous
/// callers never do, and authenticated callers pass because the filter
/// pipeline scopes their results to events they are allowed to see (own
/// events, an owned link, or a self-service username lookup).
pub fn allow_event_list(actor: Option<&Actor>) -> bool {
    actor.is_some()
}

fn is_actor(actor: Option<&Actor>, owner_id: Uuid) -> bool {
    actor.map(|a| a.id == owner_id).unwrap_or(false)
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn actor(is_admin: bool) -> Actor {
        Actor {
            id: Uuid::new_v4(),
            username: "alice".to_string(),
            is_admin,
        }
    }

    #[test]
    fn test_admin_always_allowed() {
        let admin = actor(true);
        let other = Uuid::new_v4();
        for action in [Action::Read, Action::Create, Action::Update, Action::Delete] {
            assert!(allow(
                Some(&admin),
                action,
                &Resource::Link { creator_id: other }
            ));
            assert!(allow(
                Some(&admin),
                action,
                &Resource::User { id: other }
            ));
        }
        assert!(allow(
            Some(&admin),
            Action::Delete,
            &Resource::Event {
                link_creator_id: Some(other)
            }
        ));
    }

    #[test]
    fn test_link_read_is_public() {
        let creator_id = Uuid::new_v4();
        assert!(allow(None, Action::Read, &Resource::Link { creator_id }));
    }

    #[test]
    fn test_link_writes_require_creator() {
        let owner = actor(false);
        let stranger = actor(false);
        let resource = Resource::Link {
            creator_id: owner.id,
        };

        assert!(allow(Some(&owner), Action::Update, &resource));
        assert!(allow(Some(&owner), Action::Delete, &resource));
        assert!(!allow(Some(&stranger), Action::Update, &resource));
        assert!(!allow(None, Action::Delete, &resource));
    }

    #[test]
    fn test_event_create_is_public() {
        assert!(allow(
            None,
            Action::Create,
            &Resource::Event {
                link_creator_id: Some(Uuid::new_v4())
            }
        ));
    }

    #[test]
    fn test_event_read_requires_link_owner() {
        let owner = actor(false);
        let stranger = actor(false);
        let resource = Resource::Event {
            link_creator_id: Some(owner.id),
        };

        assert!(allow(Some(&owner), Action::Read, &resource));
        assert!(!allow(Some(&stranger), Action::Read, &resource));
        assert!(!allow(None, Action::Read, &resource));
    }

    #[test]
    fn test_orphaned_event_readable_only_by_admin() {
        let resource = Resource::Event {
            link_creator_id: None,
        };
        assert!(!allow(Some(&actor(false)), Action::Read, &resource));
        assert!(allow(Some(&actor(true)), Action::Read, &resource));
    }

    #[test]
    fn test_events_immutable_for_non_admins() {
        let owner = actor(false);
        let resource = Resource::Event {
            link_creator_id: Some(owner.id),
        };
        // Even the link owner may not touch recorded events
        assert!(!allow(Some(&owner), Action::Update, &resource));
        assert!(!allow(Some(&owner), Action::Delete, &resource));
    }

    #[test]
    fn test_preference_and_user_are_self_service() {
        let me = actor(false);
        let them = actor(false);

        let my_pref = Resource::Preference { user_id: me.id };
        assert!(allow(Some(&me), Action::Read, &my_pref));
        assert!(allow(Some(&me), Action::Update, &my_pref));
        assert!(!allow(Some(&them), Action::Read, &my_pref));

        let my_profile = Resource::User { id: me.id };
        assert!(allow(Some(&me), Action::Update, &my_profile));
        assert!(!allow(Some(&them), Action::Update, &my_profile));
        assert!(!allow(None, Action::Read, &my_profile));
    }

    #[test]
    fn test_event_list_gate() {
        assert!(allow_event_list(Some(&actor(false))));
        assert!(allow_event_list(Some(&actor(true))));
        assert!(!allow_event_list(None));
    }
}
