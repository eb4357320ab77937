//! Automatic leech decisions.
//!
//! A leech offer is run through an ordered list of rules. The first rule
//! with an opinion decides; if none has one, the offer is accepted.

use serde::{Deserialize, Serialize};

use crate::faction::Faction;
use crate::reward::Rewards;

/// Outcome of a rule or of the whole chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChargeDecision {
    /// Accept the offer.
    Yes,
    /// Decline the offer.
    No,
    /// Let the player decide.
    Ask,
    /// This rule has no opinion.
    Undecided,
}

/// One way of taking a leech.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChargeOffer {
    /// What is gained, e.g. `3pw`.
    pub offer: Rewards,
    /// What it costs, `~` when free.
    pub cost: Rewards,
}

impl ChargeOffer {
    /// Whether the offer costs nothing.
    #[must_use]
    pub fn is_free(&self) -> bool {
        self.cost.is_empty()
    }
}

/// Everything the rules look at. Built per offer and dropped right after.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChargeRequest {
    /// Faction of the player being offered power.
    pub faction: Option<Faction>,
    /// Competing offers.
    pub offers: Vec<ChargeOffer>,
    /// Power that would be charged.
    pub power: u32,
    /// Whether this is the final round.
    pub is_last_round: bool,
    /// Whether the player already passed this round.
    pub player_has_passed: bool,
    /// Spare charge capacity after next income (negative: tokens wasted).
    pub remaining_charges_after_income: i32,
    /// Tokens in the player's bowl 1.
    pub area1: u32,
    /// The player's automatic-accept threshold.
    pub threshold: u32,
}

type ChargeRule = fn(&ChargeRequest) -> ChargeDecision;

const RULES: [ChargeRule; 4] = [
    ask_or_decline_for_passed_player,
    ask_for_multiple_offers,
    ask_based_on_cost,
    ask_for_itars,
];

/// Run the rule chain.
#[must_use]
pub fn decide(request: &ChargeRequest) -> ChargeDecision {
    RULES
        .iter()
        .map(|rule| rule(request))
        .find(|&d| d != ChargeDecision::Undecided)
        .unwrap_or(ChargeDecision::Yes)
}

/// A passed player gains nothing from power that next income would have
/// filled anyway, so paying points for it is pointless.
fn ask_or_decline_for_passed_player(r: &ChargeRequest) -> ChargeDecision {
    if !r.player_has_passed || r.offers.iter().any(ChargeOffer::is_free) {
        return ChargeDecision::Undecided;
    }
    let remaining = r.remaining_charges_after_income;
    if r.is_last_round || remaining <= 0 {
        ChargeDecision::No
    } else if i64::from(remaining) < i64::from(r.power) {
        ChargeDecision::Ask
    } else {
        ChargeDecision::Undecided
    }
}

fn ask_for_multiple_offers(r: &ChargeRequest) -> ChargeDecision {
    if r.offers.len() > 1 {
        ChargeDecision::Ask
    } else {
        ChargeDecision::Undecided
    }
}

/// Threshold 0 takes only free power (a single token); anything else is
/// accepted up to the threshold.
fn ask_based_on_cost(r: &ChargeRequest) -> ChargeDecision {
    match r.threshold {
        0 if r.power > 1 => ChargeDecision::No,
        0 => ChargeDecision::Undecided,
        t if r.power > t => ChargeDecision::Ask,
        _ => ChargeDecision::Undecided,
    }
}

fn ask_for_itars(r: &ChargeRequest) -> ChargeDecision {
    if r.faction == Some(Faction::Itars)
        && !auto_charge_itars(r.area1, r.power)
        && !r.is_last_round
    {
        ChargeDecision::Ask
    } else {
        ChargeDecision::Undecided
    }
}

/// Whether the whole charge stays in bowl 1 to bowl 2 moves, so nothing
/// reaches bowl 3 that could have been burned instead.
#[must_use]
pub const fn auto_charge_itars(area1: u32, power: u32) -> bool {
    area1 >= power
}

#[cfg(test)]
mod tests {
    use super::*;

    fn offer(power: &str, cost: &str) -> ChargeOffer {
        ChargeOffer {
            offer: power.parse().unwrap(),
            cost: cost.parse().unwrap(),
        }
    }

    fn request(power: u32, threshold: u32) -> ChargeRequest {
        ChargeRequest {
            faction: Some(Faction::Terrans),
            offers: vec![offer(&format!("{power}pw"), &format!("{}vp", power - 1))],
            power,
            is_last_round: false,
            player_has_passed: false,
            remaining_charges_after_income: 10,
            area1: 4,
            threshold,
        }
    }

    #[test]
    fn test_cost_threshold_zero() {
        assert_eq!(ask_based_on_cost(&request(1, 0)), ChargeDecision::Undecided);
        assert_eq!(decide(&request(1, 0)), ChargeDecision::Yes);
        assert_eq!(decide(&request(2, 0)), ChargeDecision::No);
    }

    #[test]
    fn test_cost_threshold() {
        assert_eq!(ask_based_on_cost(&request(3, 3)), ChargeDecision::Undecided);
        assert_eq!(decide(&request(3, 3)), ChargeDecision::Yes);
        assert_eq!(decide(&request(4, 3)), ChargeDecision::Ask);
    }

    #[test]
    fn test_passed_player() {
        let mut r = request(3, 5);
        r.player_has_passed = true;

        r.remaining_charges_after_income = 0;
        assert_eq!(decide(&r), ChargeDecision::No);

        r.remaining_charges_after_income = 2;
        assert_eq!(decide(&r), ChargeDecision::Ask);

        r.remaining_charges_after_income = 3;
        assert_eq!(decide(&r), ChargeDecision::Yes);

        r.is_last_round = true;
        assert_eq!(decide(&r), ChargeDecision::No);
    }

    #[test]
    fn test_passed_player_free_offer() {
        let mut r = request(1, 5);
        r.offers = vec![offer("pw", "~")];
        r.player_has_passed = true;
        r.remaining_charges_after_income = -1;
        assert_eq!(decide(&r), ChargeDecision::Yes);
    }

    #[test]
    fn test_multiple_offers() {
        let mut r = request(2, 5);
        r.offers.push(offer("t", "~"));
        assert_eq!(decide(&r), ChargeDecision::Ask);
    }

    #[test]
    fn test_itars() {
        assert!(auto_charge_itars(2, 2));
        assert!(!auto_charge_itars(1, 2));
        assert!(!auto_charge_itars(0, 1));

        let mut r = request(3, 5);
        r.faction = Some(Faction::Itars);
        r.area1 = 2;
        assert_eq!(decide(&r), ChargeDecision::Ask);
        r.area1 = 3;
        assert_eq!(decide(&r), ChargeDecision::Yes);
        r.area1 = 0;
        r.is_last_round = true;
        assert_eq!(decide(&r), ChargeDecision::Yes);
    }
}
