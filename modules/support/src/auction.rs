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

use codec::{Decode, Encode, MaxEncodedLen};
use primitives::{AuctionId, AuctionStatus, Balance, BidId, RoundIndex};
use scale_info::TypeInfo;
use sp_runtime::{DispatchError, DispatchResult, RuntimeDebug};
use sp_std::prelude::*;

/// What the bid engine needs to know about an auction before accepting a
/// bid. Read in the same transaction as the bid write, so the round index
/// recorded on the bid is the round the auction engine will settle it in.
#[derive(Encode, Decode, Eq, PartialEq, Copy, Clone, RuntimeDebug, TypeInfo, MaxEncodedLen)]
pub struct BiddingContext {
	pub status: AuctionStatus,
	pub current_round: RoundIndex,
	pub min_bid: Balance,
}

/// Read side of the auction engine, consumed by the bid engine.
pub trait AuctionResolver {
	fn bidding_context(auction_id: AuctionId) -> Option<BiddingContext>;
}

/// A bid as ranked at round close: `(amount DESC, created_at ASC, id ASC)`.
#[derive(Encode, Decode, Eq, PartialEq, Clone, RuntimeDebug, TypeInfo, MaxEncodedLen)]
pub struct RankedBid<AccountId, BlockNumber> {
	pub id: BidId,
	pub who: AccountId,
	pub amount: Balance,
	/// Round the current amount was last set in.
	pub round_index: RoundIndex,
	pub created_at: BlockNumber,
}

/// Read/settle side of the bid engine, consumed by the auction engine.
///
/// `settle_won` and `settle_refunded` are the only transitions out of
/// `Active`; the auction engine is their only caller and invokes them
/// inside its round-close / finalize transaction.
pub trait BidRepository<AccountId, BlockNumber> {
	/// All active bids of the auction in winner order.
	fn active_bids_ranked(auction_id: AuctionId) -> Vec<RankedBid<AccountId, BlockNumber>>;

	fn active_bid_count(auction_id: AuctionId) -> u32;

	/// `Active` -> `Won`. Returns the settled bid.
	fn settle_won(id: BidId) -> Result<RankedBid<AccountId, BlockNumber>, DispatchError>;

	/// `Active` -> `Refunded`. Returns the settled bid.
	fn settle_refunded(id: BidId) -> Result<RankedBid<AccountId, BlockNumber>, DispatchError>;
}

/// An accepted bid, as reported to the broadcast throttler.
#[derive(Encode, Decode, Eq, PartialEq, Clone, RuntimeDebug, TypeInfo, MaxEncodedLen)]
pub struct BidActivity<AccountId, BlockNumber> {
	pub auction_id: AuctionId,
	pub bid_id: BidId,
	pub who: AccountId,
	pub amount: Balance,
	pub round_index: RoundIndex,
	pub created_at: BlockNumber,
}

/// Force an immediate broadcast flush for one auction, bypassing the
/// significance filter. Called by the auction engine right before and
/// right after a round closes.
pub trait BroadcastFlush {
	fn force_flush(auction_id: AuctionId);
}

impl BroadcastFlush for () {
	fn force_flush(_: AuctionId) {}
}

/// Driver-facing surface of the auction engine: everything the round
/// scheduler needs to find and settle overdue rounds. All of it is backed
/// by storage, so any number of driver instances can run concurrently and
/// a restarted driver resumes by re-reading the index.
pub trait RoundLifecycle<BlockNumber> {
	/// Overdue `(ends_at, auction_id, round_index)` triples, oldest first,
	/// at most `limit` of them.
	fn due_rounds(now: BlockNumber, limit: u32) -> Vec<(BlockNumber, AuctionId, RoundIndex)>;

	/// Whether the auction's current round is overdue at `now`.
	fn is_round_due(auction_id: AuctionId, now: BlockNumber) -> bool;

	/// Close the auction's current round, then advance to the next round
	/// or finalize, per the remaining-rounds/remaining-gifts rule. No-op
	/// `Ok` when the observed state is already settled.
	fn settle_due_round(auction_id: AuctionId) -> DispatchResult;

	fn running_auction_count() -> u32;

	/// The earliest `ends_at` among unclosed rounds.
	fn next_due_at() -> Option<BlockNumber>;
}
