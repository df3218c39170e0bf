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

//! Mocks for the round scheduler module.

#![cfg(test)]

use super::*;
use crate as module_round_scheduler;
use frame_support::{
	construct_runtime, ord_parameter_types, parameter_types,
	traits::{ConstU32, ConstU64, Everything},
};
use frame_system::EnsureSignedBy;
use primitives::Balance;
use sp_core::H256;
use sp_runtime::{testing::TestXt, traits::IdentityLookup, BuildStorage};

pub type AccountId = u128;
pub type BlockNumber = u64;

pub const ALICE: AccountId = 1;
pub const BOB: AccountId = 2;
pub const OPERATOR: AccountId = 100;

pub const GIFT: primitives::GiftId = 0;
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
	type Auctions = Auctions;
	type Funds = Funds;
	type OnBidAccepted = ();
	type WeightInfo = ();
}

impl module_auctions::Config for Runtime {
	type RuntimeEvent = RuntimeEvent;
	type Funds = Funds;
	type Bids = Bids;
	type Broadcast = ();
	type RegisterOrigin = EnsureSignedBy<Operator, AccountId>;
	type MaxGiftSupply = ConstU32<10_000>;
	type TopPositions = ConstU32<10>;
	type WeightInfo = ();
}

parameter_types! {
	pub const UnsignedPriority: TransactionPriority = 1 << 20;
}

impl Config for Runtime {
	type RuntimeEvent = RuntimeEvent;
	type Rounds = Auctions;
	type ScanInterval = ConstU64<5>;
	type MaxRoundsPerScan = ConstU32<4>;
	type UnsignedPriority = UnsignedPriority;
	type WeightInfo = ();
}

type Block = frame_system::mocking::MockBlock<Runtime>;

construct_runtime!(
	pub enum Runtime {
		System: frame_system,
		Funds: module_funds,
		Bids: module_bids,
		Auctions: module_auctions,
		Scheduler: module_round_scheduler,
	}
);

pub type Extrinsic = TestXt<RuntimeCall, ()>;

impl<LocalCall> frame_system::offchain::SendTransactionTypes<LocalCall> for Runtime
where
	RuntimeCall: From<LocalCall>,
{
	type OverarchingCall = RuntimeCall;
	type Extrinsic = Extrinsic;
}

pub struct ExtBuilder {
	endowments: Vec<(AccountId, Balance)>,
}

impl Default for ExtBuilder {
	fn default() -> Self {
		Self {
			endowments: vec![(ALICE, 10_000), (BOB, 10_000)],
		}
	}
}

impl ExtBuilder {
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

/// Walk block numbers, firing the scheduler's `on_initialize` at each.
pub fn run_to_block(n: BlockNumber) {
	while System::block_number() < n {
		let next = System::block_number() + 1;
		System::set_block_number(next);
		Scheduler::on_initialize(next);
	}
}

/// Gift plus a started two-round auction: 4 gifts, 10-block rounds, min
/// bid 100.
pub fn start_default_auction() {
	use frame_support::assert_ok;

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
	assert_ok!(Auctions::start_auction(RuntimeOrigin::signed(OPERATOR), AUCTION));
}
