//! Toggle semantics for article relations (likes, favorites).
//!
//! # Responsibility
//! - Name the relation sets an actor can toggle membership in.
//! - Translate a membership flip into the reported direction.
//!
//! # Invariants
//! - A toggle always flips membership: present -> removed, absent -> added.
//! - Two toggles in sequence report opposite directions.
//!
//! The atomic check-then-mutate step lives in the article repository; this
//! module only carries the vocabulary.

use crate::authz::Action;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Relation {
    Like,
    Favorite,
}

impl Relation {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Like => "like",
            Self::Favorite => "favorite",
        }
    }

    /// Authorization action gating this toggle.
    pub fn action(self) -> Action {
        match self {
            Self::Like => Action::Like,
            Self::Favorite => Action::Favorite,
        }
    }

    pub(crate) fn table(self) -> &'static str {
        match self {
            Self::Like => "article_likes",
            Self::Favorite => "article_favorites",
        }
    }

    /// State reported after one toggle, given whether the actor was a member
    /// before it.
    pub fn toggled_from(self, was_member: bool) -> ToggleState {
        match (self, was_member) {
            (Self::Like, false) => ToggleState::Liked,
            (Self::Like, true) => ToggleState::Unliked,
            (Self::Favorite, false) => ToggleState::Favorited,
            (Self::Favorite, true) => ToggleState::Unfavorited,
        }
    }
}

/// Resulting membership after a toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToggleState {
    Liked,
    Unliked,
    Favorited,
    Unfavorited,
}

impl ToggleState {
    pub fn relation(self) -> Relation {
        match self {
            Self::Liked | Self::Unliked => Relation::Like,
            Self::Favorited | Self::Unfavorited => Relation::Favorite,
        }
    }

    /// `true` when the actor is a member after the toggle.
    pub fn is_added(self) -> bool {
        matches!(self, Self::Liked | Self::Favorited)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Liked => "liked",
            Self::Unliked => "unliked",
            Self::Favorited => "favorited",
            Self::Unfavorited => "unfavorited",
        }
    }

    /// Human-readable confirmation returned to API callers.
    pub fn message(self) -> &'static str {
        match self {
            Self::Liked => "Article liked",
            Self::Unliked => "Like removed",
            Self::Favorited => "Article added to favorites",
            Self::Unfavorited => "Article removed from favorites",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Relation, ToggleState};

    #[test]
    fn toggled_from_flips_membership_per_relation() {
        assert_eq!(Relation::Like.toggled_from(false), ToggleState::Liked);
        assert_eq!(Relation::Like.toggled_from(true), ToggleState::Unliked);
        assert_eq!(Relation::Favorite.toggled_from(false), ToggleState::Favorited);
        assert_eq!(
            Relation::Favorite.toggled_from(true),
            ToggleState::Unfavorited
        );
    }

    #[test]
    fn states_round_back_to_their_relation() {
        for relation in [Relation::Like, Relation::Favorite] {
            let added = relation.toggled_from(false);
            let removed = relation.toggled_from(true);
            assert!(added.is_added());
            assert!(!removed.is_added());
            assert_eq!(added.relation(), relation);
            assert_eq!(removed.relation(), relation);
        }
    }

    #[test]
    fn serialized_state_matches_as_str() {
        for state in [
            ToggleState::Liked,
            ToggleState::Unliked,
            ToggleState::Favorited,
            ToggleState::Unfavorited,
        ] {
            let json = serde_json::to_value(state).unwrap();
            assert_eq!(json, serde_json::Value::from(state.as_str()));
        }
    }
}
