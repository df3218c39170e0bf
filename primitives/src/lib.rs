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

//! Low-level types shared by the gift auction runtime modules.

#![cfg_attr(not(feature = "std"), no_std)]

use codec::{Decode, Encode, MaxEncodedLen};
use scale_info::TypeInfo;
use sp_runtime::{
	generic,
	traits::{BlakeTwo256, IdentifyAccount, Verify},
	MultiSignature, RuntimeDebug,
};

#[cfg(feature = "std")]
use serde::{Deserialize, Serialize};

/// An index to a block.
pub type BlockNumber = u32;

/// Alias to 512-bit hash when used in the context of a transaction signature
/// on the chain.
pub type Signature = MultiSignature;

/// Alias to the public key used for this chain, actually a `MultiSigner`.
pub type AccountPublic = <Signature as Verify>::Signer;

/// Alias to the opaque account ID type for this chain, actually a
/// `AccountId32`. This is always 32 bytes.
pub type AccountId = <AccountPublic as IdentifyAccount>::AccountId;

/// Index of a transaction in the chain. 32-bit should be plenty.
pub type Nonce = u32;

/// A hash of some data used by the chain.
pub type Hash = sp_core::H256;

/// Balance of an account.
pub type Balance = u128;

/// Signed version of Balance.
pub type Amount = i128;

/// Auction ID.
pub type AuctionId = u32;

/// Gift ID.
pub type GiftId = u32;

/// Bid ID. Assigned from a global monotonic counter, so it doubles as the
/// final tie-breaker when ranking bids.
pub type BidId = u64;

/// 0-based index of a round within an auction.
pub type RoundIndex = u32;

/// Ledger entry ID.
pub type LedgerEntryId = u64;

/// Header type.
pub type Header = generic::Header<BlockNumber, BlakeTwo256>;

/// Block type.
pub type Block = generic::Block<Header, UncheckedExtrinsic>;

/// Block ID.
pub type BlockId = generic::BlockId<Block>;

/// Opaque, encoded, unchecked extrinsic.
pub use sp_runtime::OpaqueExtrinsic as UncheckedExtrinsic;

/// Lifecycle of an auction. Only the auction engine writes this.
#[derive(Encode, Decode, Eq, PartialEq, Copy, Clone, RuntimeDebug, PartialOrd, Ord, TypeInfo, MaxEncodedLen)]
#[cfg_attr(feature = "std", derive(Serialize, Deserialize))]
pub enum AuctionStatus {
	/// Registered but not yet accepting bids.
	Created,
	/// Accepting bids; exactly one unclosed round exists.
	Running,
	/// Rounds are done, remaining active bids are being refunded.
	Finalizing,
	/// Terminal state.
	Completed,
}

/// Lifecycle of a bid.
///
/// `Active` bids have funds locked against them and carry over between
/// rounds until they win or get refunded at finalization. No transition
/// produces `Lost`; it exists for API completeness.
#[derive(Encode, Decode, Eq, PartialEq, Copy, Clone, RuntimeDebug, PartialOrd, Ord, TypeInfo, MaxEncodedLen)]
#[cfg_attr(feature = "std", derive(Serialize, Deserialize))]
pub enum BidStatus {
	Active,
	Won,
	Lost,
	Refunded,
}

/// The five kinds of balance movement the ledger records.
#[derive(Encode, Decode, Eq, PartialEq, Copy, Clone, RuntimeDebug, PartialOrd, Ord, TypeInfo, MaxEncodedLen)]
#[cfg_attr(feature = "std", derive(Serialize, Deserialize))]
pub enum LedgerEntryType {
	/// Free balance in.
	Deposit,
	/// Free -> locked.
	Lock,
	/// Locked -> free.
	Unlock,
	/// Locked out (settlement of a won bid).
	Payout,
	/// Locked -> free at auction finalization.
	Refund,
}

/// What a ledger entry refers to.
///
/// `(account, entry type, reference, amount)` is the ledger's unique
/// idempotency key, so replaying a settlement never books it twice.
/// Payouts reference the winning bid, not the auction.
#[derive(Encode, Decode, Eq, PartialEq, Copy, Clone, RuntimeDebug, PartialOrd, Ord, TypeInfo, MaxEncodedLen)]
#[cfg_attr(feature = "std", derive(Serialize, Deserialize))]
pub enum LedgerReference {
	/// Synthetic reference for deposits; carries the entry's own id.
	Deposit(LedgerEntryId),
	Bid(BidId),
	Auction(AuctionId),
}
