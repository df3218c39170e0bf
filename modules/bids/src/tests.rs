// This file is part of Gift Auction.

// Copyright (C) 2024-2026 Gift Auction Developers.
// SPDX-License-Identifier: GPL-3.0-or-later WITH Classpath-exception-2.0

// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.

// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU General Public License for more details.

// You should have received a copy of the GNU General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

//! Unit tests for the bids module.

#![cfg(test)]

use super::*;
use frame_support::{assert_noop, assert_ok};
use mock::*;
use primitives::LedgerReference;
use support::mocks::MockBidActivitySink;

#[test]
fn place_bid_works() {
	ExtBuilder::default().build().execute_with(|| {
		start_default_auction();

		assert_ok!(BidsModule::place_bid(RuntimeOrigin::signed(ALICE), AUCTION, 500));

		assert_eq!(Funds::free_balance(&ALICE), 9_500);
		assert_eq!(Funds::locked_balance(&ALICE), 500);

		let bid = BidsModule::bids(0).unwrap();
		assert_eq!(bid.who, ALICE);
		assert_eq!(bid.auction_id, AUCTION);
		assert_eq!(bid.amount, 500);
		assert_eq!(bid.round_index, 0);
		assert_eq!(bid.status, BidStatus::Active);
		assert_eq!(BidsModule::active_bids(AUCTION, ALICE), Some(0));

		// Exactly one lock entry against the bid.
		assert_eq!(
			Funds::ledger_keys((ALICE, primitives::LedgerEntryType::Lock, LedgerReference::Bid(0), 500)),
			Some(3)
		);

		System::assert_has_event(RuntimeEvent::BidsModule(crate::Event::BidPlaced {
			auction_id: AUCTION,
			bid_id: 0,
			who: ALICE,
			amount: 500,
			round_index: 0,
		}));

		let activities = MockBidActivitySink::take();
		assert_eq!(activities.len(), 1);
		assert_eq!(activities[0].bid_id, 0);
		assert_eq!(activities[0].amount, 500);
	});
}

#[test]
fn raise_locks_only_the_delta() {
	ExtBuilder::default().build().execute_with(|| {
		start_default_auction();

		assert_ok!(BidsModule::place_bid(RuntimeOrigin::signed(ALICE), AUCTION, 500));
		assert_ok!(BidsModule::place_bid(RuntimeOrigin::signed(ALICE), AUCTION, 700));

		assert_eq!(Funds::free_balance(&ALICE), 9_300);
		assert_eq!(Funds::locked_balance(&ALICE), 700);

		let bid = BidsModule::bids(0).unwrap();
		assert_eq!(bid.amount, 700);

		// Two lock entries, 500 then 200, on the same bid reference.
		assert!(Funds::ledger_keys((ALICE, primitives::LedgerEntryType::Lock, LedgerReference::Bid(0), 500)).is_some());
		assert!(Funds::ledger_keys((ALICE, primitives::LedgerEntryType::Lock, LedgerReference::Bid(0), 200)).is_some());
		assert_ok!(Funds::do_ensure_consistent(&ALICE));

		System::assert_has_event(RuntimeEvent::BidsModule(crate::Event::BidIncreased {
			auction_id: AUCTION,
			bid_id: 0,
			who: ALICE,
			amount: 700,
			delta: 200,
			round_index: 0,
		}));
	});
}

#[test]
fn non_monotonic_raise_is_rejected() {
	ExtBuilder::default().build().execute_with(|| {
		start_default_auction();

		assert_ok!(BidsModule::place_bid(RuntimeOrigin::signed(ALICE), AUCTION, 500));
		assert_noop!(
			BidsModule::place_bid(RuntimeOrigin::signed(ALICE), AUCTION, 400),
			Error::<Runtime>::BidNotIncreased
		);
		assert_noop!(
			BidsModule::place_bid(RuntimeOrigin::signed(ALICE), AUCTION, 500),
			Error::<Runtime>::BidNotIncreased
		);

		// No state change.
		assert_eq!(Funds::locked_balance(&ALICE), 500);
		assert_eq!(BidsModule::bids(0).unwrap().amount, 500);
	});
}

#[test]
fn below_minimum_bid_is_rejected() {
	ExtBuilder::default().build().execute_with(|| {
		start_default_auction();

		assert_noop!(
			BidsModule::place_bid(RuntimeOrigin::signed(ALICE), AUCTION, 99),
			Error::<Runtime>::BelowMinimumBid
		);
	});
}

#[test]
fn bidding_requires_running_auction() {
	ExtBuilder::default().build().execute_with(|| {
		// No auction at all.
		assert_noop!(
			BidsModule::place_bid(RuntimeOrigin::signed(ALICE), AUCTION, 500),
			Error::<Runtime>::AuctionNotBiddable
		);

		// Created but not started.
		assert_ok!(Auctions::register_gift(
			RuntimeOrigin::signed(OPERATOR),
			b"music box".to_vec(),
			100,
			100,
		));
		assert_ok!(Auctions::create_auction(
			RuntimeOrigin::signed(OPERATOR),
			GIFT,
			4,
			2,
			10,
			100,
		));
		assert_noop!(
			BidsModule::place_bid(RuntimeOrigin::signed(ALICE), AUCTION, 500),
			Error::<Runtime>::AuctionNotBiddable
		);
	});
}

#[test]
fn insufficient_funds_leaves_no_trace() {
	ExtBuilder::default()
		.endowments(vec![(ALICE, 300)])
		.build()
		.execute_with(|| {
			start_default_auction();

			assert_noop!(
				BidsModule::place_bid(RuntimeOrigin::signed(ALICE), AUCTION, 500),
				module_funds::Error::<Runtime>::InsufficientFunds
			);
			assert_eq!(Funds::free_balance(&ALICE), 300);
			assert_eq!(BidsModule::active_bids(AUCTION, ALICE), None);
			assert!(BidsModule::bids(0).is_none());
			assert!(MockBidActivitySink::take().is_empty());
		});
}

#[test]
fn duplicate_raise_amount_is_rejected() {
	ExtBuilder::default().build().execute_with(|| {
		start_default_auction();

		assert_ok!(BidsModule::place_bid(RuntimeOrigin::signed(ALICE), AUCTION, 500));
		assert_ok!(BidsModule::place_bid(RuntimeOrigin::signed(ALICE), AUCTION, 700));
		// 700 -> 900 repeats the 200 delta; the ledger key collides, so
		// the raise is refused rather than breaking the lock-sum
		// invariant.
		assert_noop!(
			BidsModule::place_bid(RuntimeOrigin::signed(ALICE), AUCTION, 900),
			Error::<Runtime>::DuplicateIncreaseAmount
		);

		// A different amount goes through.
		assert_ok!(BidsModule::place_bid(RuntimeOrigin::signed(ALICE), AUCTION, 901));
		assert_eq!(Funds::locked_balance(&ALICE), 901);
		assert_ok!(Funds::do_ensure_consistent(&ALICE));
	});
}

#[test]
fn one_active_bid_per_account_and_auction() {
	ExtBuilder::default().build().execute_with(|| {
		start_default_auction();

		assert_ok!(BidsModule::place_bid(RuntimeOrigin::signed(ALICE), AUCTION, 500));
		assert_ok!(BidsModule::place_bid(RuntimeOrigin::signed(ALICE), AUCTION, 800));
		assert_ok!(BidsModule::place_bid(RuntimeOrigin::signed(BOB), AUCTION, 600));

		assert_eq!(BidsModule::active_bid_count(AUCTION), 2);
		assert_eq!(ActiveBids::<Runtime>::iter_prefix(AUCTION).count(), 2);
		// Alice's raises reuse bid 0; Bob got bid 1.
		assert_eq!(BidsModule::active_bids(AUCTION, ALICE), Some(0));
		assert_eq!(BidsModule::active_bids(AUCTION, BOB), Some(1));
	});
}

#[test]
fn ranking_orders_by_amount_then_age_then_id() {
	ExtBuilder::default().build().execute_with(|| {
		start_default_auction();

		assert_ok!(BidsModule::place_bid(RuntimeOrigin::signed(BOB), AUCTION, 900));
		System::set_block_number(2);
		// Equal amounts in the same block: the older bid id breaks the tie.
		assert_ok!(BidsModule::place_bid(RuntimeOrigin::signed(ALICE), AUCTION, 500));
		assert_ok!(BidsModule::place_bid(RuntimeOrigin::signed(CAROL), AUCTION, 500));

		let ranked = BidsModule::active_bids_ranked(AUCTION);
		assert_eq!(
			ranked.iter().map(|b| (b.who, b.amount)).collect::<Vec<_>>(),
			vec![(BOB, 900), (ALICE, 500), (CAROL, 500)]
		);

		// An earlier block beats a lower id.
		System::set_block_number(3);
		assert_ok!(BidsModule::place_bid(RuntimeOrigin::signed(CAROL), AUCTION, 900));
		let ranked = BidsModule::active_bids_ranked(AUCTION);
		assert_eq!(ranked[0].who, BOB);
		assert_eq!(ranked[1].who, CAROL);
	});
}

#[test]
fn raise_in_later_round_carries_bid_forward() {
	ExtBuilder::default().build().execute_with(|| {
		start_default_auction();

		assert_ok!(BidsModule::place_bid(RuntimeOrigin::signed(ALICE), AUCTION, 500));
		assert_ok!(BidsModule::place_bid(RuntimeOrigin::signed(BOB), AUCTION, 1_000));
		assert_ok!(BidsModule::place_bid(RuntimeOrigin::signed(CAROL), AUCTION, 900));

		// Close round 0 (Bob and Carol win) and advance.
		System::set_block_number(11);
		assert_ok!(Auctions::do_close_current_round(AUCTION));
		assert_ok!(Auctions::do_advance_round(AUCTION));

		// Alice lost, stayed active with her funds locked, and her bid
		// still carries the round it was placed in.
		let bid = BidsModule::bids(0).unwrap();
		assert_eq!(bid.status, BidStatus::Active);
		assert_eq!(bid.round_index, 0);
		assert_eq!(Funds::locked_balance(&ALICE), 500);

		// Raising in round 1 re-tags the bid to the current round.
		assert_ok!(BidsModule::place_bid(RuntimeOrigin::signed(ALICE), AUCTION, 600));
		let bid = BidsModule::bids(0).unwrap();
		assert_eq!(bid.round_index, 1);
		assert_eq!(bid.amount, 600);
		assert_eq!(Funds::locked_balance(&ALICE), 600);
	});
}

#[test]
fn settle_won_transitions_and_clears_active_slot() {
	ExtBuilder::default().build().execute_with(|| {
		start_default_auction();

		assert_ok!(BidsModule::place_bid(RuntimeOrigin::signed(ALICE), AUCTION, 500));
		let settled = <BidsModule as BidRepository<AccountId, u64>>::settle_won(0).unwrap();
		assert_eq!(settled.who, ALICE);
		assert_eq!(settled.amount, 500);

		assert_eq!(BidsModule::bids(0).unwrap().status, BidStatus::Won);
		assert_eq!(BidsModule::active_bids(AUCTION, ALICE), None);
		System::assert_has_event(RuntimeEvent::BidsModule(crate::Event::BidWon {
			auction_id: AUCTION,
			bid_id: 0,
			who: ALICE,
			amount: 500,
		}));

		// A settled bid cannot be settled again.
		assert_noop!(
			<BidsModule as BidRepository<AccountId, u64>>::settle_refunded(0),
			Error::<Runtime>::BidNotActive
		);

		// The slot is free: Alice may bid anew.
		assert_ok!(BidsModule::place_bid(RuntimeOrigin::signed(ALICE), AUCTION, 200));
		assert_eq!(BidsModule::active_bids(AUCTION, ALICE), Some(1));
	});
}

#[test]
fn settle_refunded_transitions() {
	ExtBuilder::default().build().execute_with(|| {
		start_default_auction();

		assert_ok!(BidsModule::place_bid(RuntimeOrigin::signed(ALICE), AUCTION, 500));
		assert_ok!(<BidsModule as BidRepository<AccountId, u64>>::settle_refunded(0));
		assert_eq!(BidsModule::bids(0).unwrap().status, BidStatus::Refunded);
		assert_eq!(BidsModule::active_bids(AUCTION, ALICE), None);

		assert_noop!(
			<BidsModule as BidRepository<AccountId, u64>>::settle_won(0),
			Error::<Runtime>::BidNotActive
		);
		assert_noop!(
			<BidsModule as BidRepository<AccountId, u64>>::settle_won(99),
			Error::<Runtime>::BidNotFound
		);
	});
}

#[test]
fn bids_are_indexed_per_user() {
	ExtBuilder::default().build().execute_with(|| {
		start_default_auction();

		assert_ok!(BidsModule::place_bid(RuntimeOrigin::signed(ALICE), AUCTION, 500));
		assert_ok!(BidsModule::place_bid(RuntimeOrigin::signed(BOB), AUCTION, 600));

		assert_eq!(UserBids::<Runtime>::iter_prefix(ALICE).count(), 1);
		assert_eq!(UserBids::<Runtime>::iter_prefix(BOB).count(), 1);
	});
}
