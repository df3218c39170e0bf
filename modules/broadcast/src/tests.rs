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

//! Unit tests for the broadcast module.

#![cfg(test)]

use super::*;
use mock::*;
use orml_traits::Happened;

fn note(update: BidActivity<AccountId, BlockNumber>) {
	<Broadcast as Happened<_>>::happened(&update);
}

#[test]
fn first_flush_sets_the_baseline() {
	ExtBuilder::default().build().execute_with(|| {
		ScriptedBids::set(AUCTION, vec![ranked(0, ALICE, 500)]);
		note(activity(0, ALICE, 500));

		Broadcast::do_flush(AUCTION, false);

		assert_eq!(emitted_batches(), vec![(AUCTION, 1, vec![500])]);
		assert_eq!(Broadcast::last_top(AUCTION).unwrap().amounts, vec![500]);
		assert!(Broadcast::pending(AUCTION).is_empty());
	});
}

#[test]
fn unchanged_ranking_with_low_updates_is_suppressed() {
	ExtBuilder::default().build().execute_with(|| {
		ScriptedBids::set(
			AUCTION,
			vec![ranked(0, ALICE, 900), ranked(1, BOB, 800), ranked(2, 30, 700)],
		);
		note(activity(0, ALICE, 900));
		Broadcast::do_flush(AUCTION, false);
		emitted_batches();

		// A straggler far below the cutoff queues up; the top is
		// untouched.
		note(activity(9, 40, 100));
		Broadcast::do_flush(AUCTION, false);

		assert_eq!(emitted_batches(), vec![]);
		// Suppressed or not, the queue drains.
		assert!(Broadcast::pending(AUCTION).is_empty());
	});
}

#[test]
fn amount_change_at_any_position_emits() {
	ExtBuilder::default().build().execute_with(|| {
		ScriptedBids::set(AUCTION, vec![ranked(0, ALICE, 900), ranked(1, BOB, 800)]);
		note(activity(0, ALICE, 900));
		Broadcast::do_flush(AUCTION, false);
		emitted_batches();

		ScriptedBids::set(AUCTION, vec![ranked(0, ALICE, 900), ranked(1, BOB, 850)]);
		note(activity(1, BOB, 850));
		Broadcast::do_flush(AUCTION, false);

		assert_eq!(emitted_batches(), vec![(AUCTION, 1, vec![900, 850])]);
	});
}

#[test]
fn ranking_length_change_emits() {
	ExtBuilder::default().build().execute_with(|| {
		ScriptedBids::set(AUCTION, vec![ranked(0, ALICE, 900)]);
		note(activity(0, ALICE, 900));
		Broadcast::do_flush(AUCTION, false);
		emitted_batches();

		// A bid left the ranking (settled): length changed, emit even
		// though the queued update is below the cutoff.
		ScriptedBids::set(AUCTION, vec![]);
		note(activity(5, BOB, 100));
		Broadcast::do_flush(AUCTION, false);

		assert_eq!(emitted_batches(), vec![(AUCTION, 1, vec![])]);
	});
}

#[test]
fn update_reaching_the_cutoff_emits() {
	ExtBuilder::default().build().execute_with(|| {
		// Full top-3; cutoff is 700.
		ScriptedBids::set(
			AUCTION,
			vec![ranked(0, ALICE, 900), ranked(1, BOB, 800), ranked(2, 30, 700)],
		);
		note(activity(0, ALICE, 900));
		Broadcast::do_flush(AUCTION, false);
		emitted_batches();

		// Same top amounts, but a challenger matched the cutoff.
		note(activity(9, 40, 700));
		Broadcast::do_flush(AUCTION, false);

		assert_eq!(emitted_batches(), vec![(AUCTION, 1, vec![900, 800, 700])]);
	});
}

#[test]
fn updates_deduplicate_by_bid() {
	ExtBuilder::default().build().execute_with(|| {
		ScriptedBids::set(AUCTION, vec![ranked(0, ALICE, 700)]);
		note(activity(0, ALICE, 500));
		note(activity(0, ALICE, 600));
		note(activity(0, ALICE, 700));

		assert_eq!(Broadcast::pending(AUCTION).len(), 1);
		assert_eq!(Broadcast::pending(AUCTION)[0].amount, 700);

		Broadcast::do_flush(AUCTION, false);
		assert_eq!(emitted_batches(), vec![(AUCTION, 1, vec![700])]);
	});
}

#[test]
fn flush_runs_on_the_interval() {
	ExtBuilder::default().build().execute_with(|| {
		ScriptedBids::set(AUCTION, vec![ranked(0, ALICE, 500)]);
		note(activity(0, ALICE, 500));

		// Block 1 is off the 2-block grid.
		Broadcast::on_finalize(1);
		assert_eq!(emitted_batches(), vec![]);
		assert_eq!(Broadcast::pending(AUCTION).len(), 1);

		Broadcast::on_finalize(2);
		assert_eq!(emitted_batches(), vec![(AUCTION, 1, vec![500])]);
	});
}

#[test]
fn force_flush_bypasses_significance_and_empty_queues() {
	ExtBuilder::default().build().execute_with(|| {
		ScriptedBids::set(AUCTION, vec![ranked(0, ALICE, 500)]);
		note(activity(0, ALICE, 500));
		Broadcast::do_flush(AUCTION, false);
		emitted_batches();

		// Nothing queued, nothing changed; a forced flush still reports
		// the ranking.
		<Broadcast as support::BroadcastFlush>::force_flush(AUCTION);
		assert_eq!(emitted_batches(), vec![(AUCTION, 0, vec![500])]);
	});
}

#[test]
fn overflowing_queue_drains_early() {
	ExtBuilder::default().build().execute_with(|| {
		ScriptedBids::set(AUCTION, vec![ranked(0, ALICE, 500)]);

		// Capacity is 4; the fifth distinct bid forces a drain.
		for id in 0..5u64 {
			note(activity(id, ALICE, 500 + id as u128));
		}

		assert_eq!(emitted_batches(), vec![(AUCTION, 4, vec![500])]);
		assert_eq!(Broadcast::pending(AUCTION).len(), 1);
		assert_eq!(Broadcast::pending(AUCTION)[0].bid_id, 4);
	});
}
