//! The event queue: pending future tags, each carrying the set of reactions
//! to enqueue once that tag becomes current.

use reactor_core::{ReactionKey, Tag};

#[derive(Debug, Clone)]
pub struct ScheduledEvent {
    pub tag: Tag,
    pub reactions: Vec<ReactionKey>,
    /// Set once by a `request_stop`; the scheduler treats this tag as the
    /// last one to process.
    pub terminal: bool,
}

/// A sorted-`Vec` queue of `ScheduledEvent`s, kept ordered by ascending tag
/// and deduplicated: pushing a second event for an already-pending tag
/// merges the reaction sets instead of creating a second entry.
#[derive(Debug, Clone, Default)]
pub struct EventQueue {
    events: Vec<ScheduledEvent>,
}

impl EventQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn push(&mut self, tag: Tag, reactions: impl IntoIterator<Item = ReactionKey>, terminal: bool) {
        if let Some(existing) = self.events.iter_mut().find(|e| e.tag == tag) {
            for r in reactions {
                if !existing.reactions.contains(&r) {
                    existing.reactions.push(r);
                }
            }
            existing.terminal |= terminal;
            return;
        }
        let insert_at = self.events.partition_point(|e| e.tag <= tag);
        self.events.insert(
            insert_at,
            ScheduledEvent {
                tag,
                reactions: reactions.into_iter().collect(),
                terminal,
            },
        );
    }

    /// Removes and returns the earliest-tagged event.
    pub fn pop(&mut self) -> Option<ScheduledEvent> {
        if self.events.is_empty() {
            None
        } else {
            Some(self.events.remove(0))
        }
    }

    pub fn peek_tag(&self) -> Option<Tag> {
        self.events.first().map(|e| e.tag)
    }
}
