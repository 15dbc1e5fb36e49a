//! Reaction aggregation
//!
//! At most one reaction per identity per message. Adding replaces.
//! Edits are values so a store can apply them to the current record
//! inside its own write.

use crate::error::AppError;
use crate::model::Reaction;
use crate::types::Identity;

/// One identity's change to a message's reactions
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReactionEdit {
    Add { identity: Identity, emoji: String },
    Remove { identity: Identity },
}

impl ReactionEdit {
    /// Set `identity`'s reaction, rejecting a blank emoji
    pub fn add(identity: Identity, emoji: &str) -> Result<Self, AppError> {
        let emoji = emoji.trim();
        if emoji.is_empty() {
            return Err(AppError::EmptyEmoji);
        }
        Ok(Self::Add {
            identity,
            emoji: emoji.to_string(),
        })
    }

    pub fn remove(identity: Identity) -> Self {
        Self::Remove { identity }
    }

    /// Apply to a reaction list. Returns true if the list changed.
    pub fn apply(&self, reactions: &mut Vec<Reaction>) -> bool {
        match self {
            ReactionEdit::Add { identity, emoji } => {
                add_reaction(reactions, identity, emoji);
                true
            }
            ReactionEdit::Remove { identity } => remove_reaction(reactions, identity),
        }
    }
}

/// Set `identity`'s reaction to `emoji`, dropping any earlier one
pub fn add_reaction(reactions: &mut Vec<Reaction>, identity: &Identity, emoji: &str) {
    reactions.retain(|r| &r.user_id != identity);
    reactions.push(Reaction {
        emoji: emoji.to_string(),
        user_id: identity.clone(),
    });
}

/// Drop `identity`'s reaction. Returns true if one was present.
pub fn remove_reaction(reactions: &mut Vec<Reaction>, identity: &Identity) -> bool {
    let before = reactions.len();
    reactions.retain(|r| &r.user_id != identity);
    reactions.len() != before
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(raw: &str) -> Identity {
        Identity::parse(raw).unwrap()
    }

    #[test]
    fn test_add_replaces_previous() {
        let mut reactions = Vec::new();
        let alice = id("alice");

        ReactionEdit::add(alice.clone(), "😀").unwrap().apply(&mut reactions);
        ReactionEdit::add(alice.clone(), "😂").unwrap().apply(&mut reactions);

        assert_eq!(reactions.len(), 1);
        assert_eq!(reactions[0].emoji, "😂");
        assert_eq!(reactions[0].user_id, alice);
    }

    #[test]
    fn test_reactions_per_identity() {
        let mut reactions = Vec::new();
        add_reaction(&mut reactions, &id("alice"), "👍");
        add_reaction(&mut reactions, &id("bob"), "👍");
        assert_eq!(reactions.len(), 2);

        assert!(ReactionEdit::remove(id("alice")).apply(&mut reactions));
        assert_eq!(reactions.len(), 1);
        assert_eq!(reactions[0].user_id, id("bob"));
    }

    #[test]
    fn test_remove_absent_is_noop() {
        let mut reactions = Vec::new();
        add_reaction(&mut reactions, &id("bob"), "🔥");
        assert!(!remove_reaction(&mut reactions, &id("alice")));
        assert_eq!(reactions.len(), 1);
    }

    #[test]
    fn test_blank_emoji_rejected() {
        assert!(matches!(
            ReactionEdit::add(id("alice"), "  "),
            Err(AppError::EmptyEmoji)
        ));
        assert_eq!(
            ReactionEdit::add(id("alice"), " 🎉 ").unwrap(),
            ReactionEdit::Add {
                identity: id("alice"),
                emoji: "🎉".to_string()
            }
        );
    }
}
