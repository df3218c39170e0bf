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

//! Unit tests for the round scheduler module.

#![cfg(test)]

use super::*;
use codec::Decode;
use frame_support::{assert_noop, assert_ok, unsigned::TransactionValidityError};
use mock::*;
use primitives::AuctionStatus;
use sp_core::offchain::{testing, OffchainDbExt, OffchainWorkerExt, TransactionPoolExt};

#[test]
fn scan_settles_overdue_rounds() {
	ExtBuilder::default().build().execute_with(|| {
		start_default_auction();
		assert_ok!(Bids::place_bid(RuntimeOrigin::signed(ALICE), AUCTION, 500));

		// Round 0 ends at block 11; the next scan lands on block 15.
		run_to_block(14);
		assert!(!Auctions::rounds(AUCTION, 0).unwrap().closed);

		run_to_block(15);
		assert!(Auctions::rounds(AUCTION, 0).unwrap().closed);
		assert_eq!(Auctions::auctions(AUCTION).unwrap().current_round, 1);
	});
}

#[test]
fn scan_handles_rounds_missed_while_offline() {
	ExtBuilder::default().build().execute_with(|| {
		start_default_auction();
		assert_ok!(Bids::place_bid(RuntimeOrigin::signed(ALICE), AUCTION, 500));

		// Jump far past the deadline without any scans in between, as
		// after a restart. The next scan still finds the round overdue.
		System::set_block_number(39);
		run_to_block(40);
		assert!(Auctions::rounds(AUCTION, 0).unwrap().closed);
	});
}

#[test]
fn trigger_round_closing_works() {
	ExtBuilder::default().build().execute_with(|| {
		start_default_auction();
		assert_ok!(Bids::place_bid(RuntimeOrigin::signed(ALICE), AUCTION, 500));

		// Off the scan grid, but anyone can trigger manually.
		System::set_block_number(12);
		assert_ok!(Scheduler::trigger_round_closing(RuntimeOrigin::signed(BOB)));
		assert!(Auctions::rounds(AUCTION, 0).unwrap().closed);
		System::assert_last_event(RuntimeEvent::Scheduler(crate::Event::RoundClosingTriggered {
			settled: 1,
		}));

		// Nothing left to settle: the trigger reports zero.
		assert_ok!(Scheduler::trigger_round_closing(RuntimeOrigin::signed(BOB)));
		System::assert_last_event(RuntimeEvent::Scheduler(crate::Event::RoundClosingTriggered {
			settled: 0,
		}));
	});
}

#[test]
fn close_due_round_is_unsigned_only() {
	ExtBuilder::default().build().execute_with(|| {
		start_default_auction();
		System::set_block_number(12);

		assert_noop!(
			Scheduler::close_due_round(RuntimeOrigin::signed(ALICE), AUCTION),
			sp_runtime::DispatchError::BadOrigin
		);
		assert_ok!(Scheduler::close_due_round(RuntimeOrigin::none(), AUCTION));
		assert!(Auctions::rounds(AUCTION, 0).unwrap().closed);
	});
}

#[test]
fn validate_unsigned_gates_on_due_ness() {
	ExtBuilder::default().build().execute_with(|| {
		start_default_auction();

		let call = crate::Call::<Runtime>::close_due_round { auction_id: AUCTION };

		// Not due yet.
		assert_eq!(
			Scheduler::validate_unsigned(TransactionSource::Local, &call),
			Err(TransactionValidityError::Invalid(InvalidTransaction::Stale))
		);

		System::set_block_number(12);
		assert!(Scheduler::validate_unsigned(TransactionSource::Local, &call).is_ok());

		// Unknown auctions are stale too.
		let call = crate::Call::<Runtime>::close_due_round { auction_id: 9 };
		assert_eq!(
			Scheduler::validate_unsigned(TransactionSource::Local, &call),
			Err(TransactionValidityError::Invalid(InvalidTransaction::Stale))
		);
	});
}

#[test]
fn settling_runs_through_all_rounds_to_completion() {
	ExtBuilder::default().build().execute_with(|| {
		start_default_auction();
		assert_ok!(Bids::place_bid(RuntimeOrigin::signed(ALICE), AUCTION, 500));
		assert_ok!(Bids::place_bid(RuntimeOrigin::signed(BOB), AUCTION, 700));

		// Both winners settle in round 0; round 1 has no bids, so the
		// auction completes at its second deadline.
		run_to_block(15);
		assert_eq!(Auctions::auctions(AUCTION).unwrap().current_round, 1);
		run_to_block(30);
		assert_eq!(Auctions::auctions(AUCTION).unwrap().status, AuctionStatus::Completed);
		assert_eq!(Funds::locked_balance(&ALICE), 0);
		assert_eq!(Funds::locked_balance(&BOB), 0);
	});
}

#[test]
fn scheduler_status_reports_overdue_and_next_due() {
	ExtBuilder::default().build().execute_with(|| {
		let status = Scheduler::scheduler_status();
		assert_eq!(status.overdue_rounds, 0);
		assert_eq!(status.running_auctions, 0);
		assert_eq!(status.next_due_at, None);

		start_default_auction();
		let status = Scheduler::scheduler_status();
		assert_eq!(status.overdue_rounds, 0);
		assert_eq!(status.running_auctions, 1);
		assert_eq!(status.next_due_at, Some(11));

		System::set_block_number(12);
		let status = Scheduler::scheduler_status();
		assert_eq!(status.overdue_rounds, 1);
	});
}

#[test]
fn offchain_worker_submits_unsigned_closes() {
	let (offchain, _offchain_state) = testing::TestOffchainExt::new();
	let (pool, pool_state) = testing::TestTransactionPoolExt::new();
	let mut ext = ExtBuilder::default().build();
	ext.register_extension(OffchainWorkerExt::new(offchain.clone()));
	ext.register_extension(TransactionPoolExt::new(pool));
	ext.register_extension(OffchainDbExt::new(offchain));

	ext.execute_with(|| {
		start_default_auction();
		assert_ok!(Bids::place_bid(RuntimeOrigin::signed(ALICE), AUCTION, 500));

		// Nothing overdue: no transaction submitted.
		Scheduler::offchain_worker(System::block_number());
		assert!(pool_state.write().transactions.pop().is_none());

		System::set_block_number(12);
		Scheduler::offchain_worker(System::block_number());

		let tx = pool_state.write().transactions.pop().unwrap();
		let tx = Extrinsic::decode(&mut &*tx).unwrap();
		if let RuntimeCall::Scheduler(crate::Call::close_due_round { auction_id }) = tx.call {
			assert_ok!(Scheduler::close_due_round(RuntimeOrigin::none(), auction_id));
		} else {
			panic!("unexpected extrinsic: {:?}", tx.call);
		}
		assert!(Auctions::rounds(AUCTION, 0).unwrap().closed);
	});
}
