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

//! Recording mocks for module unit tests. Account ids are `u128` to match
//! the mock runtimes.

#![cfg(feature = "std")]

use crate::{BidActivity, BroadcastFlush};
use orml_traits::Happened;
use primitives::AuctionId;
use std::cell::RefCell;

thread_local! {
	static BID_ACTIVITIES: RefCell<Vec<BidActivity<u128, u64>>> = RefCell::new(Vec::new());
	static FORCED_FLUSHES: RefCell<Vec<AuctionId>> = RefCell::new(Vec::new());
}

/// Records every accepted bid passed to the sink.
pub struct MockBidActivitySink;

impl MockBidActivitySink {
	pub fn take() -> Vec<BidActivity<u128, u64>> {
		BID_ACTIVITIES.with(|v| v.borrow_mut().drain(..).collect())
	}

	pub fn reset() {
		BID_ACTIVITIES.with(|v| v.borrow_mut().clear());
	}
}

impl Happened<BidActivity<u128, u64>> for MockBidActivitySink {
	fn happened(activity: &BidActivity<u128, u64>) {
		BID_ACTIVITIES.with(|v| v.borrow_mut().push(activity.clone()));
	}
}

/// Records every forced flush.
pub struct MockBroadcastFlush;

impl MockBroadcastFlush {
	pub fn take() -> Vec<AuctionId> {
		FORCED_FLUSHES.with(|v| v.borrow_mut().drain(..).collect())
	}

	pub fn reset() {
		FORCED_FLUSHES.with(|v| v.borrow_mut().clear());
	}
}

impl BroadcastFlush for MockBroadcastFlush {
	fn force_flush(auction_id: AuctionId) {
		FORCED_FLUSHES.with(|v| v.borrow_mut().push(auction_id));
	}
}
