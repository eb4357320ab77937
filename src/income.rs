//! Income ordering.
//!
//! Gaining tokens and charging power interact: a charge moves tokens that
//! are already in the bowls, so gaining tokens before or after a charge
//! changes how much of it is wasted. When a player's income has both kinds,
//! either the player chooses the order one effect at a time, or (with
//! automatic income) every split of the token gains around the block of
//! charges is simulated and the least wasteful one is played.

use tracing::debug;

use crate::event::Event;
use crate::ledger::ResourceLedger;
use crate::player::PlayerSettings;
use crate::reward::{Resource, Reward, Rewards};

/// Saturating trial charge for the remaining-capacity estimate.
const SATURATING_CHARGE: u32 = 100;

/// Classification of a player's pending income.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncomeSelection {
    /// Whether the player must pick the order.
    pub needs_manual_selection: bool,
    /// The conflicting effects, token gains first, for the prompt.
    pub descriptions: Vec<Reward>,
    /// Spare charge capacity after this income, or minus the waste when the
    /// income already overflows.
    pub remaining_charges_after_income: i32,
    auto_income: bool,
    all: Vec<Event>,
    gain_tokens: Vec<Event>,
    charge_powers: Vec<Event>,
    others: Vec<Event>,
}

fn has_resource(event: &Event, resource: Resource) -> bool {
    event.rewards.iter().any(|r| r.resource == resource)
}

/// Split an event that both gains tokens and charges into a part without
/// the charges and a part with only them, so each half is ordered and paid
/// once.
fn split_charges(event: &Event) -> (Event, Event) {
    let (charges, rest): (Vec<Reward>, Vec<Reward>) = event
        .rewards
        .iter()
        .copied()
        .partition(|r| r.resource == Resource::ChargePower);
    let part = |rewards: Vec<Reward>| {
        let rewards = Rewards(rewards);
        Event {
            spec: format!("+{rewards}"),
            rewards,
            ..event.clone()
        }
    };
    (part(rest), part(charges))
}

impl IncomeSelection {
    /// Classify `events` for a player whose ledger is `data`.
    #[must_use]
    pub fn create(data: &ResourceLedger, settings: &PlayerSettings, events: &[Event]) -> Self {
        let mut gain_tokens = Vec::new();
        let mut charge_powers = Vec::new();
        let mut others = Vec::new();
        for event in events {
            match (
                has_resource(event, Resource::GainToken),
                has_resource(event, Resource::ChargePower),
            ) {
                (true, true) => {
                    let (gain, charge) = split_charges(event);
                    gain_tokens.push(gain);
                    charge_powers.push(charge);
                }
                (true, false) => gain_tokens.push(event.clone()),
                (false, true) => charge_powers.push(event.clone()),
                (false, false) => others.push(event.clone()),
            }
        }

        let auto = gain_tokens.is_empty() || charge_powers.is_empty() || settings.auto_income;
        let descriptions = descriptions(&gain_tokens, &charge_powers);
        let remaining = remaining_charges_after_income(data, &gain_tokens, &charge_powers);

        Self {
            needs_manual_selection: !auto,
            descriptions,
            remaining_charges_after_income: remaining,
            auto_income: settings.auto_income,
            all: events.to_vec(),
            gain_tokens,
            charge_powers,
            others,
        }
    }

    /// Events to play without asking, in order. Empty when a manual choice
    /// is needed.
    #[must_use]
    pub fn autoplay_events(&self, data: &ResourceLedger) -> Vec<Event> {
        if self.auto_income {
            let mut events = self.others.clone();
            events.extend(calculate_auto_income(
                data,
                &self.gain_tokens,
                &self.charge_powers,
            ));
            events
        } else if !self.needs_manual_selection {
            self.all.clone()
        } else {
            Vec::new()
        }
    }

    /// Income that does not take part in the ordering choice.
    #[must_use]
    pub fn others(&self) -> &[Event] {
        &self.others
    }

    /// Token gains and charges still to be ordered.
    #[must_use]
    pub fn conflicting(&self) -> Vec<Event> {
        self.gain_tokens
            .iter()
            .chain(&self.charge_powers)
            .cloned()
            .collect()
    }
}

fn descriptions(gain_tokens: &[Event], charge_powers: &[Event]) -> Vec<Reward> {
    let pick = |events: &[Event], resource: Resource| -> Vec<Reward> {
        events
            .iter()
            .filter_map(|e| e.rewards.iter().find(|r| r.resource == resource).copied())
            .collect()
    };
    let mut out = pick(gain_tokens, Resource::GainToken);
    out.extend(pick(charge_powers, Resource::ChargePower));
    out
}

/// Every subset of `items`, built by inserting each head before or after
/// the subsets of the tail: `[1, 2]` gives `[], [1], [2], [2, 1]`.
#[must_use]
pub fn combinations<T: Clone>(items: &[T]) -> Vec<Vec<T>> {
    let Some((head, tail)) = items.split_first() else {
        return vec![Vec::new()];
    };
    combinations(tail)
        .into_iter()
        .flat_map(|value| {
            let mut with_head = value.clone();
            with_head.push(head.clone());
            [value, with_head]
        })
        .collect()
}

/// Spare charge capacity after applying the income on a copy of `data`.
///
/// Token gains go first, then charges. If any charge is wasted the result
/// is minus the waste; otherwise it is how much a large trial charge would
/// still move.
#[must_use]
pub fn remaining_charges_after_income(
    data: &ResourceLedger,
    gain_tokens: &[Event],
    charge_powers: &[Event],
) -> i32 {
    let mut data = data.clone();
    apply_gain_tokens(&mut data, gain_tokens);
    let waste = apply_charge_powers(&mut data, charge_powers);
    if waste > 0 {
        return -to_i32(waste);
    }
    let charged = data.power.charge(SATURATING_CHARGE);
    to_i32(charged)
}

fn to_i32(v: u32) -> i32 {
    i32::try_from(v).unwrap_or(i32::MAX)
}

/// Pick the order of token gains around the charges that wastes the least
/// power, preferring the most tokens in bowl 3 on ties.
#[must_use]
pub fn calculate_auto_income(
    data: &ResourceLedger,
    gain_tokens: &[Event],
    charge_powers: &[Event],
) -> Vec<Event> {
    let indices: Vec<usize> = (0..gain_tokens.len()).collect();
    let mut best: Option<(u32, u32, Vec<Event>)> = None;

    for before in combinations(&indices) {
        let mut sim = data.clone();
        let before_events: Vec<Event> = before.iter().map(|&i| gain_tokens[i].clone()).collect();
        let after_events: Vec<Event> = indices
            .iter()
            .filter(|i| !before.contains(i))
            .map(|&i| gain_tokens[i].clone())
            .collect();

        apply_gain_tokens(&mut sim, &before_events);
        let waste = apply_charge_powers(&mut sim, charge_powers);
        apply_gain_tokens(&mut sim, &after_events);
        let area3 = sim.power.area3;

        let better = match &best {
            None => true,
            Some((best_waste, best_area3, _)) => {
                waste < *best_waste || (waste == *best_waste && area3 > *best_area3)
            }
        };
        if better {
            let mut events = before_events;
            events.extend(charge_powers.iter().cloned());
            events.extend(after_events);
            best = Some((waste, area3, events));
        }
    }

    let (waste, area3, events) = best.unwrap_or_default();
    debug!(waste, area3, order = ?events.iter().map(|e| e.spec.as_str()).collect::<Vec<_>>(), "auto income order");
    events
}

fn apply_gain_tokens(data: &mut ResourceLedger, gain_tokens: &[Event]) {
    for event in gain_tokens {
        data.gain_rewards(&event.rewards);
    }
}

fn apply_charge_powers(data: &mut ResourceLedger, charge_powers: &[Event]) -> u32 {
    let mut waste = 0;
    for event in charge_powers {
        for reward in event.rewards.iter() {
            if reward.resource == Resource::ChargePower {
                let power = reward.count.unsigned_abs();
                waste += power - data.power.charge(power);
            } else {
                data.gain_reward(*reward, false);
            }
        }
    }
    waste
}
