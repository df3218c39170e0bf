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

//! Mocks for the auctions module. Wires the real funds, bids and
//! broadcast modules so round settlement is covered end to end.

#![cfg(test)]

use super::*;
use crate as module_auctions;
use frame_support::{
	construct_runtime, ord_parameter_types,
	traits::{ConstU32, ConstU64, Everything},
};
use frame_system::EnsureSignedBy;
use sp_core::H256;
use sp_runtime::{traits::IdentityLookup, BuildStorage};

pub type AccountId = u128;

pub const ALICE: AccountId = 1;
pub const BOB: AccountId = 2;
pub const CAROL: AccountId = 3;
pub const OPERATOR: AccountId = 100;

pub const GIFT: GiftId = 0;
pub const AUCTION: AuctionId = 0;

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

ord_parameter_types! {
	pub const Operator: AccountId = OPERATOR;
}

impl module_funds::Config for Runtime {
	type RuntimeEvent = RuntimeEvent;
	type DepositOrigin = EnsureSignedBy<Operator, AccountId>;
	type WeightInfo = ();
}

impl module_bids::Config for Runtime {
	type RuntimeEvent = RuntimeEvent;
	type Auctions = AuctionsModule;
	type Funds = Funds;
	type OnBidAccepted = Broadcast;
	type WeightInfo = ();
}

impl module_broadcast::Config for Runtime {
	type RuntimeEvent = RuntimeEvent;
	type Bids = Bids;
	type TopPositions = ConstU32<10>;
	type FlushInterval = ConstU64<1>;
	type MaxPendingUpdates = ConstU32<32>;
}

impl Config for Runtime {
	type RuntimeEvent = RuntimeEvent;
	type Funds = Funds;
	type Bids = Bids;
	type Broadcast = Broadcast;
	type RegisterOrigin = EnsureSignedBy<Operator, AccountId>;
	type MaxGiftSupply = ConstU32<10_000>;
	type TopPositions = ConstU32<10>;
	type WeightInfo = ();
}

type Block = frame_system::mocking::MockBlock<Runtime>;

construct_runtime!(
	pub enum Runtime {
		System: frame_system,
		Funds: module_funds,
		Bids: module_bids,
		AuctionsModule: module_auctions,
		Broadcast: module_broadcast,
	}
);

pub struct ExtBuilder {
	endowments: Vec<(AccountId, Balance)>,
}

impl Default for ExtBuilder {
	fn default() -> Self {
		Self {
			endowments: vec![(ALICE, 5_000), (BOB, 5_000), (CAROL, 5_000)],
		}
	}
}

impl ExtBuilder {
	pub fn endowments(mut self, endowments: Vec<(AccountId, Balance)>) -> Self {
		self.endowments = endowments;
		self
	}

	pub fn build(self) -> sp_io::TestExternalities {
		let mut t = frame_system::GenesisConfig::<Runtime>::default()
			.build_storage()
			.unwrap();

		module_funds::GenesisConfig::<Runtime> {
			endowments: self.endowments,
		}
		.assimilate_storage(&mut t)
		.unwrap();

		let mut ext = sp_io::TestExternalities::new(t);
		ext.execute_with(|| System::set_block_number(1));
		ext
	}
}

/// Gift with 100 units of supply plus a started two-round auction over 4
/// of them: 10-block rounds, min bid 100, created by `OPERATOR`.
pub fn start_default_auction() {
	use frame_support::assert_ok;

	assert_ok!(AuctionsModule::register_gift(
		RuntimeOrigin::signed(OPERATOR),
		b"music box".to_vec(),
		100,
		100,
	));
	assert_ok!(AuctionsModule::create_auction(
		RuntimeOrigin::signed(OPERATOR),
		GIFT,
		4,
		2,
		10,
		100,
	));
	assert_ok!(AuctionsModule::start_auction(RuntimeOrigin::signed(OPERATOR), AUCTION));
}

pub fn place(who: AccountId, amount: Balance) {
	frame_support::assert_ok!(Bids::place_bid(RuntimeOrigin::signed(who), AUCTION, amount));
}
