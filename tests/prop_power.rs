//! Property-based tests for the power-token system.
//!
//! Run with: cargo test --release prop_power

#![allow(missing_docs)]
#![allow(clippy::unwrap_used)]

use proptest::prelude::*;

use gaia_engine::faction::WildcardArea;
use gaia_engine::invariants::check_power_conservation;
use gaia_engine::ledger::power::{Power, WILDCARD_VALUE};

#[derive(Debug, Clone, Copy)]
enum Op {
    Charge(u32),
    Spend(u32),
    Discard(u32),
    Remove(u32),
    Burn(u32),
    Settle,
    GaiaPhase(bool),
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0u32..12).prop_map(Op::Charge),
        (0u32..12).prop_map(Op::Spend),
        (0u32..6).prop_map(Op::Discard),
        (0u32..4).prop_map(Op::Remove),
        (0u32..5).prop_map(Op::Burn),
        Just(Op::Settle),
        any::<bool>().prop_map(Op::GaiaPhase),
    ]
}

fn wildcard() -> impl Strategy<Value = WildcardArea> {
    prop_oneof![
        Just(WildcardArea::Out),
        Just(WildcardArea::Area1),
        Just(WildcardArea::Area2),
        Just(WildcardArea::Area3),
    ]
}

fn apply(power: &mut Power, op: Op) {
    match op {
        Op::Charge(n) => {
            power.charge(n);
        }
        Op::Spend(n) => power.spend(n.min(power.spendable())),
        Op::Discard(n) => power.discard(n),
        Op::Remove(n) => power.remove(n),
        Op::Burn(n) => power.burn(n),
        Op::Settle => power.settle_transit(),
        Op::GaiaPhase(to_bowl2) => {
            power.settle_transit();
            power.return_from_gaia(to_bowl2);
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(2000))]

    /// No sequence of moves between areas creates or destroys tokens.
    #[test]
    fn prop_tokens_conserved(
        a1 in 0u32..8,
        a2 in 0u32..8,
        a3 in 0u32..8,
        wild in wildcard(),
        ops in prop::collection::vec(op(), 1..40)
    ) {
        let start = Power::new(a1, a2, a3).with_wildcard(wild);
        let mut power = start;
        for op in ops {
            let before = power;
            apply(&mut power, op);
            prop_assert!(check_power_conservation(&before, &power).is_none(), "{op:?} broke conservation");
        }
        prop_assert_eq!(power.total(), start.total());
    }

    /// Charging moves exactly what `chargeable` predicts, and never more
    /// than asked.
    #[test]
    fn prop_charge_matches_prediction(
        a1 in 0u32..8,
        a2 in 0u32..8,
        a3 in 0u32..8,
        wild in wildcard(),
        amount in 0u32..16
    ) {
        let mut power = Power::new(a1, a2, a3).with_wildcard(wild);
        let predicted = power.chargeable(amount);
        let charged = power.charge(amount);
        prop_assert_eq!(predicted, charged);
        prop_assert!(charged <= amount);
    }

    /// Spending lowers the spendable value by at least the amount spent.
    #[test]
    fn prop_spend_lowers_spendable(
        a3 in 0u32..8,
        with_wild in any::<bool>(),
        amount in 0u32..10
    ) {
        let wild = if with_wild { WildcardArea::Area3 } else { WildcardArea::Out };
        let mut power = Power::new(0, 0, a3).with_wildcard(wild);
        let available = power.spendable();
        let amount = amount.min(available);
        power.spend(amount);
        prop_assert!(power.spendable() <= available - amount);
        // Only a wildcard covering a single point wastes value.
        prop_assert!(available - amount - power.spendable() < WILDCARD_VALUE);
    }

    /// Burning never needs more than the bowl 2 count allows.
    #[test]
    fn prop_burn_bounded(
        a2 in 0u32..12,
        with_wild in any::<bool>(),
        amount in 0u32..8
    ) {
        let wild = if with_wild { WildcardArea::Area2 } else { WildcardArea::Out };
        let mut power = Power::new(0, a2, 0).with_wildcard(wild);
        let burnable = power.burnable();
        let spendable_before = power.spendable();
        power.burn(amount);
        prop_assert!(power.spendable() >= spendable_before + amount.min(burnable));
    }
}
