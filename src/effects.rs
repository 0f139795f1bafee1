//! Pending-queues container: every cascading decision a player owes before
//! their turn can end. See spec.md §4.7.
//!
//! Kept as plain, serializable data rather than callbacks or closures, per
//! spec.md §9: "Pending follow-ups... must be plain data so the state is
//! clone- and serialize-friendly."

use std::collections::{HashMap, VecDeque};

use serde::{Deserialize, Serialize};

use crate::hex::Hex;
use crate::player::PlayerId;

/// A single power-leech offer awaiting accept/decline. See spec.md §4.5
/// power-leech protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeechOffer {
    pub from: PlayerId,
    pub amount: u32,
}

/// A pending town formation awaiting a tile choice. See spec.md §4.5 town
/// formation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingTown {
    pub hexes: Vec<Hex>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingHalflingsSpades {
    pub player: PlayerId,
    pub spades_remaining: u32,
    pub transformed_hexes: Vec<Hex>,
}

/// The bundle of per-player pending state the dispatcher consults before
/// admitting a "main" action. See spec.md §4.7.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EffectQueues {
    pub pending_leech_offers: HashMap<PlayerId, VecDeque<LeechOffer>>,
    pub pending_spades: HashMap<PlayerId, u32>,
    pub pending_cult_reward_spades: HashMap<PlayerId, u32>,
    pub pending_town_formations: HashMap<PlayerId, VecDeque<PendingTown>>,
    pub pending_cultists_cult_selection: Option<PlayerId>,
    pub pending_halflings_spades: Option<PendingHalflingsSpades>,
    pub pending_darklings_priest_ordination: Option<PlayerId>,
    pub pending_favor_tile_selection: HashMap<PlayerId, u32>,
    /// Bridges granted by `PowerActionSpace::Bridge` but not yet spent on a
    /// `BuildBridge` call. Informational, not a blocking follow-up: a player
    /// may freely decline to spend it this round.
    pub pending_bridge_grants: HashMap<PlayerId, u32>,
    /// Set for one `apply` call by Chaos Magicians' stronghold bonus to tell
    /// the embedder to let this player act again before advancing the turn
    /// cursor. Cleared automatically once read. Never a blocking follow-up.
    pub pending_extra_main_action: Option<PlayerId>,
    /// Tracks, per builder whose action triggered a batch of leech offers,
    /// whether any offer in that batch was accepted. Consulted once the
    /// batch drains to distinguish the Cultists "someone accepted" bonus
    /// from the "everyone declined" bonus. See spec.md §4.3, §8 scenario 1.
    pub leech_batch_any_accepted: HashMap<PlayerId, bool>,
}

impl EffectQueues {
    /// True when `player` owes any follow-up that blocks their next main
    /// action. See spec.md §4.5 dispatcher invariants.
    pub fn owes_follow_up(&self, player: PlayerId) -> bool {
        self.pending_leech_offers
            .get(&player)
            .is_some_and(|q| !q.is_empty())
            || self.pending_spades.get(&player).is_some_and(|&n| n > 0)
            || self
                .pending_cult_reward_spades
                .get(&player)
                .is_some_and(|&n| n > 0)
            || self
                .pending_town_formations
                .get(&player)
                .is_some_and(|q| !q.is_empty())
            || self.pending_cultists_cult_selection == Some(player)
            || self
                .pending_halflings_spades
                .as_ref()
                .is_some_and(|p| p.player == player)
            || self.pending_darklings_priest_ordination == Some(player)
            || self
                .pending_favor_tile_selection
                .get(&player)
                .is_some_and(|&n| n > 0)
    }

    /// True when any player in the game owes a follow-up. Used by the
    /// dispatcher to hold a "main" action until every offer created by the
    /// prior action has drained. See spec.md §4.5.
    pub fn any_follow_up_outstanding(&self) -> bool {
        self.pending_leech_offers.values().any(|q| !q.is_empty())
            || self.pending_spades.values().any(|&n| n > 0)
            || self.pending_cult_reward_spades.values().any(|&n| n > 0)
            || self.pending_town_formations.values().any(|q| !q.is_empty())
            || self.pending_cultists_cult_selection.is_some()
            || self.pending_halflings_spades.is_some()
            || self.pending_darklings_priest_ordination.is_some()
            || self.pending_favor_tile_selection.values().any(|&n| n > 0)
    }

    pub fn queue_leech_offer(&mut self, recipient: PlayerId, offer: LeechOffer) {
        self.pending_leech_offers
            .entry(recipient)
            .or_default()
            .push_back(offer);
        self.leech_batch_any_accepted.entry(offer.from).or_insert(false);
    }

    pub fn queue_town(&mut self, player: PlayerId, hexes: Vec<Hex>) {
        self.pending_town_formations
            .entry(player)
            .or_default()
            .push_back(PendingTown { hexes });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn owes_follow_up_is_false_for_an_empty_queue_set() {
        let effects = EffectQueues::default();
        assert!(!effects.owes_follow_up(PlayerId::new(0)));
    }

    #[test]
    fn queued_leech_offer_blocks_recipient() {
        let mut effects = EffectQueues::default();
        let recipient = PlayerId::new(1);
        effects.queue_leech_offer(
            recipient,
            LeechOffer {
                from: PlayerId::new(0),
                amount: 2,
            },
        );
        assert!(effects.owes_follow_up(recipient));
        assert!(effects.any_follow_up_outstanding());
    }

    #[test]
    fn queued_town_blocks_only_that_player() {
        let mut effects = EffectQueues::default();
        let player = PlayerId::new(0);
        effects.queue_town(player, vec![Hex::new(0, 0)]);
        assert!(effects.owes_follow_up(player));
        assert!(!effects.owes_follow_up(PlayerId::new(1)));
    }
}
