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

//! Mocks for the broadcast module. The ranking source is a scripted
//! repository so tests steer the top-K directly.

#![cfg(test)]

use super::*;
use crate as module_broadcast;
use frame_support::{
	construct_runtime,
	traits::{ConstU32, ConstU64, Everything},
};
use sp_core::H256;
use sp_runtime::{traits::IdentityLookup, BuildStorage, DispatchError};
use std::{cell::RefCell, collections::HashMap};
use support::{BidRepository, RankedBid};

pub type AccountId = u128;
pub type BlockNumber = u64;

pub const ALICE: AccountId = 1;
pub const BOB: AccountId = 2;

pub const AUCTION: AuctionId = 7;

impl frame_system::Config for Runtime {
	type BaseCallFilter = Everything;
	type BlockWeights = ();
	type BlockLength = ();
	type RuntimeOrigin = RuntimeOrigin;
	type RuntimeCall = RuntimeCall;
	type Nonce = u64;
	type Hash = H256;
	type Hashing = ::sp_runtime::traits::BlakeTwo256;
	type AccountId = AccountId;
	type Lookup = IdentityLookup<Self::AccountId>;
	type Block = Block;
	type RuntimeEvent = RuntimeEvent;
	type BlockHashCount = ConstU64<250>;
	type DbWeight = ();
	type Version = ();
	type PalletInfo = PalletInfo;
	type AccountData = ();
	type OnNewAccount = ();
	type OnKilledAccount = ();
	type SystemWeightInfo = ();
	type SS58Prefix = ();
	type OnSetCode = ();
	type MaxConsumers = ConstU32<16>;
}

thread_local! {
	static RANKED: RefCell<HashMap<AuctionId, Vec<RankedBid<AccountId, BlockNumber>>>> =
		RefCell::new(HashMap::new());
}

pub struct ScriptedBids;

impl ScriptedBids {
	pub fn set(auction_id: AuctionId, bids: Vec<RankedBid<AccountId, BlockNumber>>) {
		RANKED.with(|v| {
			v.borrow_mut().insert(auction_id, bids);
		});
	}

	pub fn reset() {
		RANKED.with(|v| v.borrow_mut().clear());
	}
}

impl BidRepository<AccountId, BlockNumber> for ScriptedBids {
	fn active_bids_ranked(auction_id: AuctionId) -> Vec<RankedBid<AccountId, BlockNumber>> {
		RANKED.with(|v| v.borrow().get(&auction_id).cloned().unwrap_or_default())
	}

	fn active_bid_count(auction_id: AuctionId) -> u32 {
		Self::active_bids_ranked(auction_id).len() as u32
	}

	fn settle_won(_: BidId) -> Result<RankedBid<AccountId, BlockNumber>, DispatchError> {
		Err(DispatchError::Other("not part of the broadcast surface"))
	}

	fn settle_refunded(_: BidId) -> Result<RankedBid<AccountId, BlockNumber>, DispatchError> {
		Err(DispatchError::Other("not part of the broadcast surface"))
	}
}

impl Config for Runtime {
	type RuntimeEvent = RuntimeEvent;
	type Bids = ScriptedBids;
	type TopPositions = ConstU32<3>;
	type FlushInterval = ConstU64<2>;
	type MaxPendingUpdates = ConstU32<4>;
}

type Block = frame_system::mocking::MockBlock<Runtime>;

construct_runtime!(
	pub enum Runtime {
		System: frame_system,
		Broadcast: module_broadcast,
	}
);

pub struct ExtBuilder;

impl Default for ExtBuilder {
	fn default() -> Self {
		Self
	}
}

impl ExtBuilder {
	pub fn build(self) -> sp_io::TestExternalities {
		ScriptedBids::reset();

		let t = frame_system::GenesisConfig::<Runtime>::default()
			.build_storage()
			.unwrap();

		let mut ext = sp_io::TestExternalities::new(t);
		ext.execute_with(|| System::set_block_number(1));
		ext
	}
}

/// A ranked bid owned by `who`, one per bid id.
pub fn ranked(id: BidId, who: AccountId, amount: Balance) -> RankedBid<AccountId, BlockNumber> {
	RankedBid {
		id,
		who,
		amount,
		round_index: 0,
		created_at: 1,
	}
}

/// A queued update for `who`'s bid.
pub fn activity(id: BidId, who: AccountId, amount: Balance) -> BidActivity<AccountId, BlockNumber> {
	BidActivity {
		auction_id: AUCTION,
		bid_id: id,
		who,
		amount,
		round_index: 0,
		created_at: 1,
	}
}

/// Batches emitted since the last call.
pub fn emitted_batches() -> Vec<(AuctionId, u32, Vec<Balance>)> {
	let batches = System::events()
		.into_iter()
		.filter_map(|record| match record.event {
			RuntimeEvent::Broadcast(Event::BidActivityBatch {
				auction_id,
				updates_count,
				top_positions,
			}) => Some((
				auction_id,
				updates_count,
				top_positions.into_iter().map(|p| p.amount).collect(),
			)),
			_ => None,
		})
		.collect();
	System::reset_events();
	batches
}
