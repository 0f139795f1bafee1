//! The three-bowl power track and the power-leech protocol. See spec.md §3
//! (PowerSystem, ResourcePool), §4.2.

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};

#[cfg(test)]
mod tests;

/// Total power tokens a player ever holds, across all three bowls.
pub const TOTAL_TOKENS: u32 = 12;

/// The three-bowl power track. Tokens move bowl1 -> bowl2 -> bowl3 on gain,
/// and spent tokens return to bowl1. See spec.md §3, §4.2.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PowerSystem {
    pub bowl1: u32,
    pub bowl2: u32,
    pub bowl3: u32,
}

impl PowerSystem {
    /// A fresh track with `bowl1`/`bowl2` tokens placed by faction setup and
    /// the remainder in bowl3, per spec.md §4.3 per-faction starting power.
    pub fn starting(bowl1: u32, bowl2: u32) -> Self {
        debug_assert!(bowl1 + bowl2 <= TOTAL_TOKENS);
        Self {
            bowl1,
            bowl2,
            bowl3: TOTAL_TOKENS - bowl1 - bowl2,
        }
    }

    pub fn total(&self) -> u32 {
        self.bowl1 + self.bowl2 + self.bowl3
    }

    /// Available power to spend, i.e. tokens currently in bowl3.
    pub fn available(&self) -> u32 {
        self.bowl3
    }

    /// Gain `amount` tokens: each moves bowl1->bowl2 or bowl2->bowl3, one
    /// step per token, never looping a single token twice in one gain. A
    /// token with nowhere to move (bowl1 and bowl2 both empty) is lost.
    /// Returns the number of tokens actually advanced, which may be less
    /// than `amount` — callers that care about the short-gain (spec.md §7)
    /// should compare the return value against `amount`.
    pub fn gain(&mut self, amount: u32) -> u32 {
        let mut advanced = 0;
        for _ in 0..amount {
            if self.bowl2 > 0 {
                self.bowl2 -= 1;
                self.bowl3 += 1;
                advanced += 1;
            } else if self.bowl1 > 0 {
                self.bowl1 -= 1;
                self.bowl2 += 1;
                advanced += 1;
            }
        }
        advanced
    }

    /// Spend `amount` power from bowl3, returning the tokens to bowl1.
    pub fn spend(&mut self, amount: u32) -> EngineResult<()> {
        if self.bowl3 < amount {
            return Err(EngineError::InsufficientResources {
                resource: "power",
                required: amount,
                available: self.bowl3,
            });
        }
        self.bowl3 -= amount;
        self.bowl1 += amount;
        Ok(())
    }

    /// Burn `amount` pairs of bowl2 tokens into `amount` bowl3 tokens
    /// (2 burned for 1 usable, spec.md §4.2).
    pub fn burn(&mut self, amount: u32) -> EngineResult<()> {
        let required = amount * 2;
        if self.bowl2 < required {
            return Err(EngineError::InsufficientResources {
                resource: "power (bowl2, for burning)",
                required,
                available: self.bowl2,
            });
        }
        self.bowl2 -= required;
        self.bowl3 += amount;
        Ok(())
    }

    /// The maximum power this player could still gain from a leech offer of
    /// `offered`, capped by tokens sitting in bowl1/bowl2 (spec.md §4.7
    /// power-leech protocol: gains are silently capped, never blocked).
    pub fn max_leechable(&self, offered: u32) -> u32 {
        offered.min(self.bowl1 + self.bowl2)
    }
}
