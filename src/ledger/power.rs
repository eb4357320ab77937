//! The power-token system.
//!
//! Regular tokens cycle through three bowls. Charging moves them
//! 1 -> 2 -> 3, spending returns them from 3 to 1, discarding moves them
//! into the gaia area, and burning sacrifices one token from bowl 2 to move
//! another to bowl 3. The optional wildcard token follows the same cycle but
//! is worth [`WILDCARD_VALUE`] when spent.
//!
//! Every operation clamps to what is actually present, so bowls never go
//! negative and tokens are only created by [`Power::gain_tokens`].

use serde::{Deserialize, Serialize};

use crate::faction::WildcardArea;

/// Spendable value of the wildcard token in bowl 3.
pub const WILDCARD_VALUE: u32 = 2;

/// Token counts per area plus the wildcard position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Power {
    /// Bowl 1.
    pub area1: u32,
    /// Bowl 2.
    pub area2: u32,
    /// Bowl 3.
    pub area3: u32,
    /// Gaia area.
    pub gaia: u32,
    /// Wildcard token position.
    pub wildcard: WildcardArea,
    /// Tokens taken out of the game (burned, used as satellites).
    pub removed: u32,
}

impl Power {
    /// Power with the given bowl contents and no wildcard.
    #[must_use]
    pub const fn new(area1: u32, area2: u32, area3: u32) -> Self {
        Self {
            area1,
            area2,
            area3,
            gaia: 0,
            wildcard: WildcardArea::Out,
            removed: 0,
        }
    }

    /// Builder: place the wildcard.
    #[must_use]
    pub const fn with_wildcard(mut self, wildcard: WildcardArea) -> Self {
        self.wildcard = wildcard;
        self
    }

    /// Whether the wildcard takes part in the game.
    #[must_use]
    pub fn wildcard_in_play(&self) -> bool {
        self.wildcard != WildcardArea::Out
    }

    fn wildcard_in_bowl(&self) -> bool {
        matches!(
            self.wildcard,
            WildcardArea::Area1 | WildcardArea::Area2 | WildcardArea::Area3
        )
    }

    /// Every token accounted for, including removed ones.
    ///
    /// Only [`Power::gain_tokens`] and [`Power::gain_gaia_tokens`] change this.
    #[must_use]
    pub fn total(&self) -> u32 {
        self.area1
            + self.area2
            + self.area3
            + self.gaia
            + self.removed
            + u32::from(self.wildcard_in_play())
    }

    /// Charge up to `amount` power and return how much was actually charged.
    ///
    /// Bowl 1 empties into bowl 2 first, then bowl 2 (including what just
    /// arrived) into bowl 3. The wildcard moves ahead of regular tokens from
    /// bowl 1, and from bowl 2 once bowl 1 is exhausted.
    pub fn charge(&mut self, amount: u32) -> u32 {
        if amount == 0 {
            return 0;
        }
        let mut amount = amount;
        let mut wildcard_usage = 0;

        if self.wildcard == WildcardArea::Area1 {
            wildcard_usage += 1;
            amount -= 1;
            self.wildcard = WildcardArea::Area2;
        }

        let area1_to_up = amount.min(self.area1);

        if self.wildcard == WildcardArea::Area2 && amount - area1_to_up > 0 {
            wildcard_usage += 1;
            amount -= 1;
            self.wildcard = WildcardArea::Area3;
        }

        let area2_to_up = (amount - area1_to_up).min(self.area2 + area1_to_up);

        self.area1 -= area1_to_up;
        self.area2 = self.area2 + area1_to_up - area2_to_up;
        self.area3 += area2_to_up;

        area1_to_up + area2_to_up + wildcard_usage
    }

    /// How much [`Power::charge`] would charge, without changing anything.
    #[must_use]
    pub fn chargeable(&self, amount: u32) -> u32 {
        let mut trial = *self;
        trial.charge(amount)
    }

    /// Power available to spend from bowl 3.
    #[must_use]
    pub fn spendable(&self) -> u32 {
        self.area3
            + if self.wildcard == WildcardArea::Area3 {
                WILDCARD_VALUE
            } else {
                0
            }
    }

    /// Spend `amount` power, returning the tokens to bowl 1.
    ///
    /// The wildcard is used first when it alone covers the spend or when
    /// regular tokens fall short.
    pub fn spend(&mut self, amount: u32) {
        debug_assert!(
            amount <= self.spendable(),
            "spending {amount} power with {} spendable",
            self.spendable()
        );
        let mut amount = amount.min(self.spendable());
        if self.wildcard == WildcardArea::Area3
            && (amount >= WILDCARD_VALUE || self.area3 < amount)
        {
            self.wildcard = WildcardArea::Area1;
            amount = amount.saturating_sub(WILDCARD_VALUE);
        }
        self.area3 -= amount;
        self.area1 += amount;
    }

    /// Tokens that can be discarded or used as satellites.
    #[must_use]
    pub fn discardable(&self) -> u32 {
        self.area1 + self.area2 + self.area3 + u32::from(self.wildcard_in_bowl())
    }

    /// Move `amount` tokens into the gaia area, draining bowl 1, then 2, then 3.
    ///
    /// The wildcard is only taken when every discardable token is needed; it
    /// then waits in [`WildcardArea::Transit`] until [`Power::settle_transit`].
    pub fn discard(&mut self, amount: u32) {
        let moved = self.drain(amount);
        self.gaia += moved;
    }

    /// Take `amount` tokens out of the game, draining bowl 1, then 2, then 3.
    /// A wildcard taken this way leaves the game.
    pub fn remove(&mut self, amount: u32) {
        let moved = self.drain(amount);
        self.removed += moved;
        if self.wildcard == WildcardArea::Transit {
            self.wildcard = WildcardArea::Out;
            self.removed += 1;
        }
    }

    fn drain(&mut self, amount: u32) -> u32 {
        let amount = amount.min(self.discardable());
        let wildcard_needed = self.wildcard_in_bowl() && self.discardable() == amount;
        let regular = amount - u32::from(wildcard_needed);

        let from1 = regular.min(self.area1);
        let from2 = (regular - from1).min(self.area2);
        let from3 = (regular - from1 - from2).min(self.area3);
        self.area1 -= from1;
        self.area2 -= from2;
        self.area3 -= from3;

        if wildcard_needed {
            self.wildcard = WildcardArea::Transit;
        }
        from1 + from2 + from3
    }

    /// Finish a discard: a wildcard in transit lands in the gaia area.
    pub fn settle_transit(&mut self) {
        if self.wildcard == WildcardArea::Transit {
            self.wildcard = WildcardArea::Gaia;
        }
    }

    /// Add new tokens to bowl 1.
    pub fn gain_tokens(&mut self, amount: u32) {
        self.area1 += amount;
    }

    /// Add new tokens to the gaia area. A wildcard in transit counts as one.
    pub fn gain_gaia_tokens(&mut self, amount: u32) {
        let mut amount = amount;
        if amount > 0 && self.wildcard == WildcardArea::Transit {
            self.wildcard = WildcardArea::Gaia;
            amount -= 1;
        }
        self.gaia += amount;
    }

    /// Tokens in the gaia area, counting the wildcard.
    #[must_use]
    pub fn gaia_tokens(&self) -> u32 {
        self.gaia + u32::from(self.wildcard == WildcardArea::Gaia)
    }

    /// Take `amount` tokens out of the gaia area and out of the game.
    pub fn remove_gaia_tokens(&mut self, amount: u32) {
        let amount = amount.min(self.gaia);
        self.gaia -= amount;
        self.removed += amount;
    }

    /// Return gaia-area tokens to bowl 1 (or bowl 2).
    pub fn return_from_gaia(&mut self, to_bowl2: bool) {
        if to_bowl2 {
            self.area2 += self.gaia;
        } else {
            self.area1 += self.gaia;
        }
        self.gaia = 0;
        if self.wildcard == WildcardArea::Gaia {
            self.wildcard = WildcardArea::Area1;
        }
    }

    /// How many tokens can be burned.
    #[must_use]
    pub fn burnable(&self) -> u32 {
        (self.area2 + u32::from(self.wildcard == WildcardArea::Area2)) / 2
    }

    /// Burn `amount` times: each burn removes one bowl 2 token from the game
    /// and moves another one (or the wildcard) to bowl 3.
    pub fn burn(&mut self, amount: u32) {
        let mut amount = amount.min(self.burnable());
        if amount == 0 {
            return;
        }
        if self.wildcard == WildcardArea::Area2 {
            self.wildcard = WildcardArea::Area3;
            self.area2 -= 1;
            self.removed += 1;
            amount -= 1;
        }
        self.area2 -= 2 * amount;
        self.area3 += amount;
        self.removed += amount;
    }
}
