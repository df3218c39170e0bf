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

//! # Bids Module
//!
//! ## Overview
//!
//! Bid placement for running auctions. Each account holds at most one
//! active bid per auction; a repeated `place_bid` strictly raises that bid
//! and locks only the difference. The active bid carries over between
//! rounds until the auction engine settles it. Won bids are paid out of
//! the locked balance, everything still active at finalization is
//! refunded.
//!
//! The module never reads auction storage directly: the auction engine is
//! behind [`AuctionResolver`], and the auction engine in turn reaches the
//! bids behind [`BidRepository`]. `settle_won` / `settle_refunded` are the
//! only ways out of `Active`.

#![cfg_attr(not(feature = "std"), no_std)]
#![allow(clippy::unused_unit)]

use frame_support::{pallet_prelude::*, transactional};
use frame_system::pallet_prelude::*;
use orml_traits::Happened;
use primitives::{AuctionId, AuctionStatus, Balance, BidId, BidStatus, RoundIndex};
use sp_runtime::{
	traits::{One, Zero},
	DispatchError, DispatchResult,
};
use sp_std::prelude::*;
use support::{AuctionResolver, BidActivity, BidRepository, FundsLedger, RankedBid};

mod mock;
mod tests;
pub mod weights;

pub use module::*;
pub use weights::WeightInfo;

/// A sealed-price bid. `amount` only ever grows while the bid is active;
/// `round_index` tracks the round the amount was last set in.
#[derive(Encode, Decode, Eq, PartialEq, Clone, RuntimeDebug, TypeInfo, MaxEncodedLen)]
pub struct Bid<AccountId, BlockNumber> {
	pub who: AccountId,
	pub auction_id: AuctionId,
	pub amount: Balance,
	pub round_index: RoundIndex,
	pub status: BidStatus,
	pub created_at: BlockNumber,
	pub updated_at: BlockNumber,
}

#[frame_support::pallet]
pub mod module {
	use super::*;

	pub(crate) type BidOf<T> = Bid<<T as frame_system::Config>::AccountId, BlockNumberFor<T>>;
	pub(crate) type BidActivityOf<T> =
		BidActivity<<T as frame_system::Config>::AccountId, BlockNumberFor<T>>;

	#[pallet::config]
	pub trait Config: frame_system::Config {
		type RuntimeEvent: From<Event<Self>> + IsType<<Self as frame_system::Config>::RuntimeEvent>;

		/// Read side of the auction engine.
		type Auctions: AuctionResolver;

		/// The balance engine locking funds against bids.
		type Funds: FundsLedger<Self::AccountId>;

		/// Notified about every accepted bid; wired to the broadcast
		/// throttler by the runtime.
		type OnBidAccepted: Happened<BidActivityOf<Self>>;

		/// Weight information for the extrinsics in this module.
		type WeightInfo: WeightInfo;
	}

	#[pallet::error]
	pub enum Error<T> {
		/// The auction does not exist or is not accepting bids.
		AuctionNotBiddable,
		/// Amount is below the auction's minimum bid.
		BelowMinimumBid,
		/// A raise must strictly exceed the current bid amount.
		BidNotIncreased,
		/// The raise duplicates an earlier increase of the same size on
		/// this bid, which the ledger's idempotency key cannot tell apart
		/// from a replay. Pick a different amount.
		DuplicateIncreaseAmount,
		/// No such bid.
		BidNotFound,
		/// The bid has already been settled.
		BidNotActive,
	}

	#[pallet::event]
	#[pallet::generate_deposit(pub(crate) fn deposit_event)]
	pub enum Event<T: Config> {
		BidPlaced {
			auction_id: AuctionId,
			bid_id: BidId,
			who: T::AccountId,
			amount: Balance,
			round_index: RoundIndex,
		},
		BidIncreased {
			auction_id: AuctionId,
			bid_id: BidId,
			who: T::AccountId,
			amount: Balance,
			delta: Balance,
			round_index: RoundIndex,
		},
		BidWon {
			auction_id: AuctionId,
			bid_id: BidId,
			who: T::AccountId,
			amount: Balance,
		},
		BidRefunded {
			auction_id: AuctionId,
			bid_id: BidId,
			who: T::AccountId,
			amount: Balance,
		},
	}

	/// All bids ever placed.
	///
	/// Bids: map BidId => Bid
	#[pallet::storage]
	#[pallet::getter(fn bids)]
	pub type Bids<T: Config> = StorageMap<_, Twox64Concat, BidId, BidOf<T>, OptionQuery>;

	/// The active bid of an account in an auction. Key uniqueness is the
	/// single-active-bid rule.
	///
	/// ActiveBids: double map AuctionId, AccountId => BidId
	#[pallet::storage]
	#[pallet::getter(fn active_bids)]
	pub type ActiveBids<T: Config> =
		StorageDoubleMap<_, Twox64Concat, AuctionId, Blake2_128Concat, T::AccountId, BidId, OptionQuery>;

	/// Per-account bid history index.
	///
	/// UserBids: double map AccountId, BidId => ()
	#[pallet::storage]
	#[pallet::getter(fn user_bids)]
	pub type UserBids<T: Config> =
		StorageDoubleMap<_, Blake2_128Concat, T::AccountId, Twox64Concat, BidId, (), OptionQuery>;

	/// Next unused bid id.
	#[pallet::storage]
	#[pallet::getter(fn next_bid_id)]
	pub type NextBidId<T: Config> = StorageValue<_, BidId, ValueQuery>;

	#[pallet::pallet]
	pub struct Pallet<T>(_);

	#[pallet::hooks]
	impl<T: Config> Hooks<BlockNumberFor<T>> for Pallet<T> {}

	#[pallet::call]
	impl<T: Config> Pallet<T> {
		/// Place a new bid or raise the caller's active bid on `auction_id`
		/// to `amount`. Raising locks only the difference; the bid's round
		/// index moves to the auction's current round, carrying it forward.
		#[pallet::call_index(0)]
		#[pallet::weight(T::WeightInfo::place_bid())]
		#[transactional]
		pub fn place_bid(
			origin: OriginFor<T>,
			auction_id: AuctionId,
			#[pallet::compact] amount: Balance,
		) -> DispatchResult {
			let who = ensure_signed(origin)?;
			Self::do_place_bid(&who, auction_id, amount)
		}
	}
}

impl<T: Config> Pallet<T> {
	pub fn do_place_bid(who: &T::AccountId, auction_id: AuctionId, amount: Balance) -> DispatchResult {
		let context = T::Auctions::bidding_context(auction_id).ok_or(Error::<T>::AuctionNotBiddable)?;
		ensure!(
			context.status == AuctionStatus::Running,
			Error::<T>::AuctionNotBiddable
		);
		ensure!(amount >= context.min_bid, Error::<T>::BelowMinimumBid);

		let now = frame_system::Pallet::<T>::block_number();
		let activity = match Self::active_bids(auction_id, who) {
			Some(bid_id) => Self::raise_bid(who, auction_id, bid_id, amount, context.current_round, now)?,
			None => Self::open_bid(who, auction_id, amount, context.current_round, now)?,
		};

		T::OnBidAccepted::happened(&activity);
		Ok(())
	}

	fn open_bid(
		who: &T::AccountId,
		auction_id: AuctionId,
		amount: Balance,
		round_index: RoundIndex,
		now: BlockNumberFor<T>,
	) -> Result<BidActivityOf<T>, DispatchError> {
		let bid_id = NextBidId::<T>::mutate(|current| {
			let id = *current;
			*current = current.saturating_add(One::one());
			id
		});

		T::Funds::lock(who, amount, primitives::LedgerReference::Bid(bid_id), b"bid")?;

		let bid = Bid {
			who: who.clone(),
			auction_id,
			amount,
			round_index,
			status: BidStatus::Active,
			created_at: now,
			updated_at: now,
		};
		Bids::<T>::insert(bid_id, bid);
		ActiveBids::<T>::insert(auction_id, who, bid_id);
		UserBids::<T>::insert(who, bid_id, ());

		Self::deposit_event(Event::BidPlaced {
			auction_id,
			bid_id,
			who: who.clone(),
			amount,
			round_index,
		});

		Ok(BidActivity {
			auction_id,
			bid_id,
			who: who.clone(),
			amount,
			round_index,
			created_at: now,
		})
	}

	fn raise_bid(
		who: &T::AccountId,
		auction_id: AuctionId,
		bid_id: BidId,
		amount: Balance,
		round_index: RoundIndex,
		now: BlockNumberFor<T>,
	) -> Result<BidActivityOf<T>, DispatchError> {
		Bids::<T>::try_mutate(bid_id, |maybe_bid| -> Result<BidActivityOf<T>, DispatchError> {
			let bid = maybe_bid.as_mut().ok_or(Error::<T>::BidNotFound)?;
			ensure!(bid.status == BidStatus::Active, Error::<T>::BidNotActive);

			let delta = amount.checked_sub(bid.amount).filter(|d| !d.is_zero()).ok_or(Error::<T>::BidNotIncreased)?;

			// The ledger books the delta under (who, Lock, bid, delta). If
			// an earlier raise already booked the identical delta, the
			// ledger treats this one as a replay and moves nothing; the
			// balance probe below catches that and rejects the raise so
			// the locked total always equals the bid amount.
			let locked_before = T::Funds::locked_balance(who);
			T::Funds::lock(who, delta, primitives::LedgerReference::Bid(bid_id), b"bid increase")?;
			ensure!(
				T::Funds::locked_balance(who)
					== locked_before
						.checked_add(delta)
						.ok_or(Error::<T>::DuplicateIncreaseAmount)?,
				Error::<T>::DuplicateIncreaseAmount
			);

			bid.amount = amount;
			bid.round_index = round_index;
			bid.updated_at = now;

			Self::deposit_event(Event::BidIncreased {
				auction_id,
				bid_id,
				who: who.clone(),
				amount,
				delta,
				round_index,
			});

			Ok(BidActivity {
				auction_id,
				bid_id,
				who: who.clone(),
				amount,
				round_index,
				created_at: bid.created_at,
			})
		})
	}

	fn ranked(bid_id: BidId, bid: &BidOf<T>) -> RankedBid<T::AccountId, BlockNumberFor<T>> {
		RankedBid {
			id: bid_id,
			who: bid.who.clone(),
			amount: bid.amount,
			round_index: bid.round_index,
			created_at: bid.created_at,
		}
	}

	fn settle(bid_id: BidId, into: BidStatus) -> Result<RankedBid<T::AccountId, BlockNumberFor<T>>, DispatchError> {
		Bids::<T>::try_mutate(bid_id, |maybe_bid| {
			let bid = maybe_bid.as_mut().ok_or(Error::<T>::BidNotFound)?;
			ensure!(bid.status == BidStatus::Active, Error::<T>::BidNotActive);

			bid.status = into;
			bid.updated_at = frame_system::Pallet::<T>::block_number();
			ActiveBids::<T>::remove(bid.auction_id, &bid.who);

			let settled = Self::ranked(bid_id, bid);
			let event = match into {
				BidStatus::Won => Event::BidWon {
					auction_id: bid.auction_id,
					bid_id,
					who: bid.who.clone(),
					amount: bid.amount,
				},
				_ => Event::BidRefunded {
					auction_id: bid.auction_id,
					bid_id,
					who: bid.who.clone(),
					amount: bid.amount,
				},
			};
			Self::deposit_event(event);
			Ok(settled)
		})
	}
}

impl<T: Config> BidRepository<T::AccountId, BlockNumberFor<T>> for Pallet<T> {
	fn active_bids_ranked(auction_id: AuctionId) -> Vec<RankedBid<T::AccountId, BlockNumberFor<T>>> {
		let mut bids: Vec<_> = ActiveBids::<T>::iter_prefix(auction_id)
			.filter_map(|(_, bid_id)| Self::bids(bid_id).map(|bid| Self::ranked(bid_id, &bid)))
			.collect();
		bids.sort_by(|a, b| {
			b.amount
				.cmp(&a.amount)
				.then(a.created_at.cmp(&b.created_at))
				.then(a.id.cmp(&b.id))
		});
		bids
	}

	fn active_bid_count(auction_id: AuctionId) -> u32 {
		ActiveBids::<T>::iter_prefix(auction_id).count() as u32
	}

	fn settle_won(id: BidId) -> Result<RankedBid<T::AccountId, BlockNumberFor<T>>, DispatchError> {
		Self::settle(id, BidStatus::Won)
	}

	fn settle_refunded(id: BidId) -> Result<RankedBid<T::AccountId, BlockNumberFor<T>>, DispatchError> {
		Self::settle(id, BidStatus::Refunded)
	}
}
