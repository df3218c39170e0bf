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

//! # Auctions Module
//!
//! ## Overview
//!
//! The auction engine: a minimal gift registry, auction creation and
//! start, and the round state machine. A running auction always has
//! exactly one unclosed round. Closing a round selects up to
//! `gifts_per_round` winners from the active bids ranked by
//! `(amount DESC, created_at ASC, id ASC)`, settles their locked funds as
//! payouts and either opens the next round or finalizes the auction,
//! refunding every bid still active. Losing bids are not touched at close:
//! they carry over, funds still locked, into the next round.
//!
//! This module is the only writer of auction status, round state and the
//! settled-bid transitions (via [`BidRepository`]). Close, advance and
//! finalize are idempotent: re-invocation observes the target state and
//! returns without effect, which is what makes the round scheduler safe to
//! run from several processes at once.

#![cfg_attr(not(feature = "std"), no_std)]
#![allow(clippy::unused_unit)]

use frame_support::{pallet_prelude::*, transactional};
use frame_system::pallet_prelude::*;
use primitives::{
	AuctionId, AuctionStatus, Balance, BidId, GiftId, LedgerReference, RoundIndex,
};
use sp_runtime::{
	traits::{One, Saturating, Zero},
	ArithmeticError, DispatchError, DispatchResult,
};
use sp_std::{cmp, prelude::*};
use support::{
	AuctionResolver, BiddingContext, BidRepository, BroadcastFlush, FundsLedger, RankedBid, RoundLifecycle,
};

mod mock;
pub mod weights;

pub use module::*;
pub use weights::WeightInfo;

/// Gift title bytes.
pub type GiftTitle = BoundedVec<u8, ConstU32<128>>;

/// An item that can be auctioned off. Immutable after registration except
/// for `allocated`, which reserves supply for created auctions.
#[derive(Encode, Decode, Eq, PartialEq, Clone, RuntimeDebug, TypeInfo, MaxEncodedLen)]
pub struct Gift {
	pub title: GiftTitle,
	pub base_price: Balance,
	pub total_supply: u32,
	/// Supply already reserved by auctions.
	pub allocated: u32,
}

/// Auction state. `awarded` counts gifts won in closed rounds and is
/// updated in the same transaction as the winning-bid settlements.
#[derive(Encode, Decode, Eq, PartialEq, Clone, RuntimeDebug, TypeInfo, MaxEncodedLen)]
pub struct Auction<AccountId, BlockNumber> {
	pub gift_id: GiftId,
	pub total_gifts: u32,
	pub total_rounds: RoundIndex,
	pub round_duration: BlockNumber,
	pub min_bid: Balance,
	pub status: AuctionStatus,
	pub current_round: RoundIndex,
	pub awarded: u32,
	pub created_by: AccountId,
	pub created_at: BlockNumber,
}

impl<AccountId, BlockNumber> Auction<AccountId, BlockNumber> {
	/// `ceil(total_gifts / total_rounds)`, the winner cap per round.
	pub fn gifts_per_round(&self) -> u32 {
		self.total_gifts
			.saturating_add(self.total_rounds.saturating_sub(1))
			.checked_div(self.total_rounds)
			.unwrap_or(0)
	}

	pub fn remaining_gifts(&self) -> u32 {
		self.total_gifts.saturating_sub(self.awarded)
	}
}

/// One round of an auction.
#[derive(Encode, Decode, Eq, PartialEq, Clone, RuntimeDebug, TypeInfo, MaxEncodedLen)]
pub struct Round<BlockNumber> {
	pub started_at: BlockNumber,
	pub ends_at: BlockNumber,
	pub closed: bool,
	pub winners_count: u32,
}

/// Record of a winning bid in a closed round.
#[derive(Encode, Decode, Eq, PartialEq, Clone, RuntimeDebug, TypeInfo, MaxEncodedLen)]
pub struct RoundWinner<AccountId, BlockNumber> {
	pub who: AccountId,
	pub amount: Balance,
	/// The round the winning amount was placed (or last raised) in.
	pub placed_in_round: RoundIndex,
	pub won_at: BlockNumber,
}

/// Read-model of an auction for display surfaces.
#[derive(Encode, Decode, Eq, PartialEq, Clone, RuntimeDebug, TypeInfo)]
pub struct Dashboard<AccountId, BlockNumber> {
	pub auction_id: AuctionId,
	pub gift_id: GiftId,
	pub status: AuctionStatus,
	pub current_round: RoundIndex,
	pub round_ends_at: Option<BlockNumber>,
	/// Recomputed at read time, never persisted.
	pub blocks_remaining: Option<BlockNumber>,
	pub total_gifts: u32,
	pub awarded: u32,
	pub remaining_gifts: u32,
	pub min_bid: Balance,
	pub top_bids: Vec<RankedBid<AccountId, BlockNumber>>,
	/// 1-based rank of the viewer's active bid, over the full ranking.
	pub viewer_position: Option<u32>,
	pub viewer_amount: Option<Balance>,
}

#[frame_support::pallet]
pub mod module {
	use super::*;

	pub(crate) type AuctionOf<T> =
		Auction<<T as frame_system::Config>::AccountId, BlockNumberFor<T>>;
	pub(crate) type RoundOf<T> = Round<BlockNumberFor<T>>;
	pub(crate) type RoundWinnerOf<T> =
		RoundWinner<<T as frame_system::Config>::AccountId, BlockNumberFor<T>>;

	#[pallet::config]
	pub trait Config: frame_system::Config {
		type RuntimeEvent: From<Event<Self>> + IsType<<Self as frame_system::Config>::RuntimeEvent>;

		/// The balance engine settling payouts and refunds.
		type Funds: FundsLedger<Self::AccountId>;

		/// Read/settle side of the bid engine.
		type Bids: BidRepository<Self::AccountId, BlockNumberFor<Self>>;

		/// Forced flushes around round closure.
		type Broadcast: BroadcastFlush;

		/// Origin allowed to register gifts.
		type RegisterOrigin: EnsureOrigin<Self::RuntimeOrigin>;

		#[pallet::constant]
		/// Hard cap on a gift's total supply.
		type MaxGiftSupply: Get<u32>;

		#[pallet::constant]
		/// Number of leading bids included in the dashboard.
		type TopPositions: Get<u32>;

		/// Weight information for the extrinsics in this module.
		type WeightInfo: WeightInfo;
	}

	#[pallet::error]
	pub enum Error<T> {
		GiftNotFound,
		/// The gift's remaining supply cannot cover the auction.
		GiftExhausted,
		AuctionNotFound,
		/// Only the creator may start the auction.
		NotCreator,
		/// The operation does not apply to the auction's current status.
		InvalidAuctionState,
		RoundNotFound,
		/// A parameter is out of its documented domain.
		InvalidParams,
	}

	#[pallet::event]
	#[pallet::generate_deposit(pub(crate) fn deposit_event)]
	pub enum Event<T: Config> {
		GiftRegistered {
			gift_id: GiftId,
			base_price: Balance,
			total_supply: u32,
		},
		AuctionCreated {
			auction_id: AuctionId,
			gift_id: GiftId,
			total_gifts: u32,
			total_rounds: RoundIndex,
			created_by: T::AccountId,
		},
		AuctionStarted {
			auction_id: AuctionId,
			ends_at: BlockNumberFor<T>,
		},
		RoundStarted {
			auction_id: AuctionId,
			round_index: RoundIndex,
			ends_at: BlockNumberFor<T>,
		},
		RoundClosed {
			auction_id: AuctionId,
			round_index: RoundIndex,
			winners_count: u32,
		},
		AuctionFinalized {
			auction_id: AuctionId,
			refunded_bids: u32,
		},
	}

	/// Gift registry.
	///
	/// Gifts: map GiftId => Gift
	#[pallet::storage]
	#[pallet::getter(fn gifts)]
	pub type Gifts<T: Config> = StorageMap<_, Twox64Concat, GiftId, Gift, OptionQuery>;

	/// Next unused gift id.
	#[pallet::storage]
	#[pallet::getter(fn next_gift_id)]
	pub type NextGiftId<T: Config> = StorageValue<_, GiftId, ValueQuery>;

	/// All auctions.
	///
	/// Auctions: map AuctionId => Auction
	#[pallet::storage]
	#[pallet::getter(fn auctions)]
	pub type Auctions<T: Config> = StorageMap<_, Twox64Concat, AuctionId, AuctionOf<T>, OptionQuery>;

	/// Next unused auction id.
	#[pallet::storage]
	#[pallet::getter(fn next_auction_id)]
	pub type NextAuctionId<T: Config> = StorageValue<_, AuctionId, ValueQuery>;

	/// Rounds by auction. A running auction has exactly one unclosed round,
	/// its `current_round`.
	///
	/// Rounds: double map AuctionId, RoundIndex => Round
	#[pallet::storage]
	#[pallet::getter(fn rounds)]
	pub type Rounds<T: Config> =
		StorageDoubleMap<_, Twox64Concat, AuctionId, Twox64Concat, RoundIndex, RoundOf<T>, OptionQuery>;

	/// Index of unclosed rounds by deadline, for the due-round scan.
	/// Entries are removed when the round closes.
	///
	/// RoundEndAt: double map BlockNumber, AuctionId => RoundIndex
	#[pallet::storage]
	#[pallet::getter(fn round_end_at)]
	pub type RoundEndAt<T: Config> =
		StorageDoubleMap<_, Twox64Concat, BlockNumberFor<T>, Twox64Concat, AuctionId, RoundIndex, OptionQuery>;

	/// Winners of closed rounds.
	///
	/// RoundWinners: n-map (AuctionId, RoundIndex, BidId) => RoundWinner
	#[pallet::storage]
	#[pallet::getter(fn round_winners)]
	pub type RoundWinners<T: Config> = StorageNMap<
		_,
		(
			NMapKey<Twox64Concat, AuctionId>,
			NMapKey<Twox64Concat, RoundIndex>,
			NMapKey<Twox64Concat, BidId>,
		),
		RoundWinnerOf<T>,
		OptionQuery,
	>;

	#[pallet::pallet]
	pub struct Pallet<T>(_);

	#[pallet::hooks]
	impl<T: Config> Hooks<BlockNumberFor<T>> for Pallet<T> {}

	#[pallet::call]
	impl<T: Config> Pallet<T> {
		/// Register a gift. Supply is immutable afterwards; auctions draw
		/// it down via `create_auction`.
		#[pallet::call_index(0)]
		#[pallet::weight(T::WeightInfo::register_gift())]
		#[transactional]
		pub fn register_gift(
			origin: OriginFor<T>,
			title: Vec<u8>,
			#[pallet::compact] base_price: Balance,
			total_supply: u32,
		) -> DispatchResult {
			T::RegisterOrigin::ensure_origin(origin)?;
			ensure!(
				total_supply >= 1 && total_supply <= T::MaxGiftSupply::get(),
				Error::<T>::InvalidParams
			);
			let title: GiftTitle = title.try_into().map_err(|_| Error::<T>::InvalidParams)?;

			let gift_id = NextGiftId::<T>::mutate(|current| {
				let id = *current;
				*current = current.saturating_add(One::one());
				id
			});
			Gifts::<T>::insert(
				gift_id,
				Gift {
					title,
					base_price,
					total_supply,
					allocated: 0,
				},
			);

			Self::deposit_event(Event::GiftRegistered {
				gift_id,
				base_price,
				total_supply,
			});
			Ok(())
		}

		/// Create an auction over `total_gifts` units of `gift_id`, split
		/// into `total_rounds` rounds of `round_duration` blocks each.
		#[pallet::call_index(1)]
		#[pallet::weight(T::WeightInfo::create_auction())]
		#[transactional]
		pub fn create_auction(
			origin: OriginFor<T>,
			gift_id: GiftId,
			total_gifts: u32,
			total_rounds: RoundIndex,
			round_duration: BlockNumberFor<T>,
			#[pallet::compact] min_bid: Balance,
		) -> DispatchResult {
			let who = ensure_signed(origin)?;
			ensure!(
				total_gifts >= 1 && total_rounds >= 1 && round_duration >= One::one(),
				Error::<T>::InvalidParams
			);

			Gifts::<T>::try_mutate(gift_id, |maybe_gift| -> DispatchResult {
				let gift = maybe_gift.as_mut().ok_or(Error::<T>::GiftNotFound)?;
				let allocated = gift
					.allocated
					.checked_add(total_gifts)
					.ok_or(DispatchError::Arithmetic(ArithmeticError::Overflow))?;
				ensure!(allocated <= gift.total_supply, Error::<T>::GiftExhausted);
				gift.allocated = allocated;
				Ok(())
			})?;

			let auction_id = NextAuctionId::<T>::mutate(|current| {
				let id = *current;
				*current = current.saturating_add(One::one());
				id
			});
			Auctions::<T>::insert(
				auction_id,
				Auction {
					gift_id,
					total_gifts,
					total_rounds,
					round_duration,
					min_bid,
					status: AuctionStatus::Created,
					current_round: 0,
					awarded: 0,
					created_by: who.clone(),
					created_at: frame_system::Pallet::<T>::block_number(),
				},
			);

			Self::deposit_event(Event::AuctionCreated {
				auction_id,
				gift_id,
				total_gifts,
				total_rounds,
				created_by: who,
			});
			Ok(())
		}

		/// Start the auction: `Created -> Running`, opening round 0 with a
		/// fresh deadline. Creator only.
		#[pallet::call_index(2)]
		#[pallet::weight(T::WeightInfo::start_auction())]
		#[transactional]
		pub fn start_auction(origin: OriginFor<T>, auction_id: AuctionId) -> DispatchResult {
			let who = ensure_signed(origin)?;

			Auctions::<T>::try_mutate(auction_id, |maybe_auction| -> DispatchResult {
				let auction = maybe_auction.as_mut().ok_or(Error::<T>::AuctionNotFound)?;
				ensure!(auction.created_by == who, Error::<T>::NotCreator);
				ensure!(
					auction.status == AuctionStatus::Created,
					Error::<T>::InvalidAuctionState
				);

				auction.status = AuctionStatus::Running;
				let ends_at = Self::open_round(auction_id, 0, auction.round_duration);

				Self::deposit_event(Event::AuctionStarted { auction_id, ends_at });
				Ok(())
			})
		}
	}
}

impl<T: Config> Pallet<T> {
	fn open_round(auction_id: AuctionId, round_index: RoundIndex, duration: BlockNumberFor<T>) -> BlockNumberFor<T> {
		let now = frame_system::Pallet::<T>::block_number();
		let ends_at = now.saturating_add(duration);
		Rounds::<T>::insert(
			auction_id,
			round_index,
			Round {
				started_at: now,
				ends_at,
				closed: false,
				winners_count: 0,
			},
		);
		RoundEndAt::<T>::insert(ends_at, auction_id, round_index);
		ends_at
	}

	/// Close the auction's current round: settle winners, keep losers
	/// active. Returns whether this call performed the closure; an already
	/// closed round (or a non-running auction) is a no-op, which makes the
	/// operation safe under concurrent scheduler instances and replays.
	#[transactional]
	pub fn do_close_current_round(auction_id: AuctionId) -> Result<bool, DispatchError> {
		let mut auction = Self::auctions(auction_id).ok_or(Error::<T>::AuctionNotFound)?;
		if auction.status != AuctionStatus::Running {
			return Ok(false);
		}
		let round_index = auction.current_round;
		let mut round = Self::rounds(auction_id, round_index).ok_or(Error::<T>::RoundNotFound)?;
		if round.closed {
			return Ok(false);
		}

		// Guarantee observers one last look at the pre-close ranking.
		T::Broadcast::force_flush(auction_id);

		let ranked = T::Bids::active_bids_ranked(auction_id);
		let winners_count = cmp::min(
			auction.gifts_per_round() as usize,
			cmp::min(auction.remaining_gifts() as usize, ranked.len()),
		);
		let now = frame_system::Pallet::<T>::block_number();

		for winner in ranked.into_iter().take(winners_count) {
			let settled = T::Bids::settle_won(winner.id)?;
			T::Funds::payout(&settled.who, settled.amount, LedgerReference::Bid(settled.id), b"round win")?;
			RoundWinners::<T>::insert(
				(auction_id, round_index, settled.id),
				RoundWinner {
					who: settled.who,
					amount: settled.amount,
					placed_in_round: settled.round_index,
					won_at: now,
				},
			);
		}

		auction.awarded = auction
			.awarded
			.checked_add(winners_count as u32)
			.ok_or(DispatchError::Arithmetic(ArithmeticError::Overflow))?;
		Auctions::<T>::insert(auction_id, auction);

		RoundEndAt::<T>::remove(round.ends_at, auction_id);
		round.closed = true;
		round.winners_count = winners_count as u32;
		Rounds::<T>::insert(auction_id, round_index, round);

		log::debug!(
			target: "auctions",
			"closed round {:?} of auction {:?} with {:?} winners",
			round_index, auction_id, winners_count,
		);
		Self::deposit_event(Event::RoundClosed {
			auction_id,
			round_index,
			winners_count: winners_count as u32,
		});

		T::Broadcast::force_flush(auction_id);
		Ok(true)
	}

	/// Open the round after the current one and make it current. No-op
	/// unless the auction is running and its current round is closed.
	#[transactional]
	pub fn do_advance_round(auction_id: AuctionId) -> DispatchResult {
		Auctions::<T>::try_mutate(auction_id, |maybe_auction| -> DispatchResult {
			let auction = maybe_auction.as_mut().ok_or(Error::<T>::AuctionNotFound)?;
			if auction.status != AuctionStatus::Running {
				return Ok(());
			}
			let round = Self::rounds(auction_id, auction.current_round).ok_or(Error::<T>::RoundNotFound)?;
			if !round.closed {
				// Someone already advanced; the fresh round is current.
				return Ok(());
			}
			ensure!(
				auction.current_round.saturating_add(1) < auction.total_rounds,
				Error::<T>::InvalidAuctionState
			);

			let next_index = auction.current_round.saturating_add(1);
			auction.current_round = next_index;
			let ends_at = Self::open_round(auction_id, next_index, auction.round_duration);

			Self::deposit_event(Event::RoundStarted {
				auction_id,
				round_index: next_index,
				ends_at,
			});
			Ok(())
		})
	}

	/// Refund every still-active bid and complete the auction. Idempotent:
	/// a completed auction returns `Ok` without effect.
	#[transactional]
	pub fn do_finalize_auction(auction_id: AuctionId) -> DispatchResult {
		let mut auction = Self::auctions(auction_id).ok_or(Error::<T>::AuctionNotFound)?;
		match auction.status {
			AuctionStatus::Completed => return Ok(()),
			AuctionStatus::Running | AuctionStatus::Finalizing => {}
			AuctionStatus::Created => return Err(Error::<T>::InvalidAuctionState.into()),
		}
		if auction.status == AuctionStatus::Running {
			// Finalization only follows a closed final round.
			let round = Self::rounds(auction_id, auction.current_round).ok_or(Error::<T>::RoundNotFound)?;
			ensure!(round.closed, Error::<T>::InvalidAuctionState);
		}

		auction.status = AuctionStatus::Finalizing;
		Auctions::<T>::insert(auction_id, auction.clone());

		let mut refunded: u32 = 0;
		for bid in T::Bids::active_bids_ranked(auction_id) {
			let settled = T::Bids::settle_refunded(bid.id)?;
			T::Funds::refund(&settled.who, settled.amount, LedgerReference::Bid(settled.id), b"finalization")?;
			refunded = refunded.saturating_add(1);
		}

		auction.status = AuctionStatus::Completed;
		Auctions::<T>::insert(auction_id, auction);

		log::debug!(
			target: "auctions",
			"finalized auction {:?}, refunded {:?} bids",
			auction_id, refunded,
		);
		Self::deposit_event(Event::AuctionFinalized {
			auction_id,
			refunded_bids: refunded,
		});
		Ok(())
	}

	/// Assemble the read-model for one auction.
	pub fn dashboard(auction_id: AuctionId, viewer: Option<T::AccountId>) -> Option<Dashboard<T::AccountId, BlockNumberFor<T>>> {
		let auction = Self::auctions(auction_id)?;
		let now = frame_system::Pallet::<T>::block_number();
		let round = Self::rounds(auction_id, auction.current_round);

		let ranked = T::Bids::active_bids_ranked(auction_id);
		let viewer_rank = viewer.and_then(|viewer| {
			ranked
				.iter()
				.position(|bid| bid.who == viewer)
				.map(|index| (index as u32 + 1, ranked[index].amount))
		});

		let mut top_bids = ranked;
		top_bids.truncate(T::TopPositions::get() as usize);

		Some(Dashboard {
			auction_id,
			gift_id: auction.gift_id,
			status: auction.status,
			current_round: auction.current_round,
			round_ends_at: round.as_ref().map(|r| r.ends_at),
			blocks_remaining: round
				.as_ref()
				.filter(|r| !r.closed)
				.map(|r| r.ends_at.saturating_sub(now)),
			total_gifts: auction.total_gifts,
			awarded: auction.awarded,
			remaining_gifts: auction.remaining_gifts(),
			min_bid: auction.min_bid,
			top_bids,
			viewer_position: viewer_rank.map(|(position, _)| position),
			viewer_amount: viewer_rank.map(|(_, amount)| amount),
		})
	}
}

impl<T: Config> AuctionResolver for Pallet<T> {
	fn bidding_context(auction_id: AuctionId) -> Option<BiddingContext> {
		Self::auctions(auction_id).map(|auction| BiddingContext {
			status: auction.status,
			current_round: auction.current_round,
			min_bid: auction.min_bid,
		})
	}
}

impl<T: Config> RoundLifecycle<BlockNumberFor<T>> for Pallet<T> {
	fn due_rounds(now: BlockNumberFor<T>, limit: u32) -> Vec<(BlockNumberFor<T>, AuctionId, RoundIndex)> {
		let mut due: Vec<_> = RoundEndAt::<T>::iter()
			.filter(|(ends_at, _, _)| *ends_at <= now)
			.collect();
		due.sort_by(|a, b| a.0.cmp(&b.0).then(a.1.cmp(&b.1)));
		due.truncate(limit as usize);
		due
	}

	fn is_round_due(auction_id: AuctionId, now: BlockNumberFor<T>) -> bool {
		Self::auctions(auction_id)
			.filter(|auction| auction.status == AuctionStatus::Running)
			.and_then(|auction| Self::rounds(auction_id, auction.current_round))
			.map_or(false, |round| !round.closed && round.ends_at <= now)
	}

	fn settle_due_round(auction_id: AuctionId) -> DispatchResult {
		let now = frame_system::Pallet::<T>::block_number();
		if !Self::is_round_due(auction_id, now) {
			// Already handled elsewhere, or not ripe: nothing to settle.
			return Ok(());
		}

		Self::do_close_current_round(auction_id)?;

		let auction = Self::auctions(auction_id).ok_or(Error::<T>::AuctionNotFound)?;
		if auction.status != AuctionStatus::Running {
			return Ok(());
		}
		if auction.current_round.saturating_add(1) < auction.total_rounds && !auction.remaining_gifts().is_zero() {
			Self::do_advance_round(auction_id)
		} else {
			Self::do_finalize_auction(auction_id)
		}
	}

	fn running_auction_count() -> u32 {
		Auctions::<T>::iter_values()
			.filter(|auction| auction.status == AuctionStatus::Running)
			.count() as u32
	}

	fn next_due_at() -> Option<BlockNumberFor<T>> {
		RoundEndAt::<T>::iter().map(|(ends_at, _, _)| ends_at).min()
	}
}
