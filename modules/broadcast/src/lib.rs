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

//! # Broadcast Module
//!
//! ## Overview
//!
//! Throttles bid-change notifications. Accepted bids queue up per auction
//! (deduplicated by bid, the latest amount wins) and are drained every
//! `FlushInterval` blocks in `on_finalize`. A drain emits one aggregated
//! [`Event::BidActivityBatch`] per auction, but only when the batch is
//! significant: the top-`K` ranking changed shape, or some queued update
//! reached the neighborhood of the top-`K` cutoff. The auction engine
//! force-flushes around round closure so subscribers always observe the
//! final pre-close ranking and the post-close transition, significance
//! notwithstanding.
//!
//! The pending queue and the last-emitted snapshot are bookkeeping, not
//! ledger state; either can be dropped and the next flush rebuilds them.

#![cfg_attr(not(feature = "std"), no_std)]
#![allow(clippy::unused_unit)]

use frame_support::pallet_prelude::*;
use frame_system::pallet_prelude::*;
use orml_traits::Happened;
use primitives::{AuctionId, Balance, BidId, RoundIndex};
use sp_runtime::traits::Zero;
use sp_std::{cmp, prelude::*};
use support::{BidActivity, BidRepository, BroadcastFlush};

mod mock;
mod tests;

pub use module::*;

/// One slot of the emitted top ranking.
#[derive(Encode, Decode, Eq, PartialEq, Clone, RuntimeDebug, TypeInfo)]
pub struct TopPosition<AccountId, BlockNumber> {
	/// 1-based rank.
	pub position: u32,
	pub who: AccountId,
	pub bid_id: BidId,
	pub amount: Balance,
	pub round_index: RoundIndex,
	pub created_at: BlockNumber,
}

/// The last emitted top-`K` amounts of an auction.
#[derive(Encode, Decode, Eq, PartialEq, Clone, RuntimeDebug, TypeInfo)]
pub struct TopSnapshot<BlockNumber> {
	/// Descending amounts, at most `K` of them.
	pub amounts: Vec<Balance>,
	pub at: BlockNumber,
}

#[frame_support::pallet]
pub mod module {
	use super::*;

	pub(crate) type BidActivityOf<T> =
		BidActivity<<T as frame_system::Config>::AccountId, BlockNumberFor<T>>;
	pub(crate) type TopPositionOf<T> =
		TopPosition<<T as frame_system::Config>::AccountId, BlockNumberFor<T>>;

	#[pallet::config]
	pub trait Config: frame_system::Config {
		type RuntimeEvent: From<Event<Self>> + IsType<<Self as frame_system::Config>::RuntimeEvent>;

		/// Source of the current ranking.
		type Bids: BidRepository<Self::AccountId, BlockNumberFor<Self>>;

		#[pallet::constant]
		/// `K`: how many leading bids a batch reports.
		type TopPositions: Get<u32>;

		#[pallet::constant]
		/// Blocks between queue drains.
		type FlushInterval: Get<BlockNumberFor<Self>>;

		#[pallet::constant]
		/// Queued updates per auction before an early drain kicks in.
		type MaxPendingUpdates: Get<u32>;
	}

	#[pallet::event]
	#[pallet::generate_deposit(pub(crate) fn deposit_event)]
	pub enum Event<T: Config> {
		/// Coalesced bid activity of one auction since the last emission.
		BidActivityBatch {
			auction_id: AuctionId,
			updates_count: u32,
			top_positions: Vec<TopPositionOf<T>>,
		},
	}

	/// Updates waiting for the next flush, deduplicated by bid.
	///
	/// Pending: map AuctionId => BoundedVec<BidActivity>
	#[pallet::storage]
	#[pallet::getter(fn pending)]
	pub type Pending<T: Config> =
		StorageMap<_, Twox64Concat, AuctionId, BoundedVec<BidActivityOf<T>, T::MaxPendingUpdates>, ValueQuery>;

	/// The last emitted ranking per auction, compared against to decide
	/// significance.
	///
	/// LastTop: map AuctionId => TopSnapshot
	#[pallet::storage]
	#[pallet::getter(fn last_top)]
	pub type LastTop<T: Config> = StorageMap<_, Twox64Concat, AuctionId, TopSnapshot<BlockNumberFor<T>>, OptionQuery>;

	#[pallet::pallet]
	#[pallet::without_storage_info]
	pub struct Pallet<T>(_);

	#[pallet::hooks]
	impl<T: Config> Hooks<BlockNumberFor<T>> for Pallet<T> {
		fn on_finalize(now: BlockNumberFor<T>) {
			if (now % T::FlushInterval::get()).is_zero() {
				let auctions: Vec<AuctionId> = Pending::<T>::iter_keys().collect();
				for auction_id in auctions {
					Self::do_flush(auction_id, false);
				}
			}
		}
	}

	#[pallet::call]
	impl<T: Config> Pallet<T> {}
}

impl<T: Config> Pallet<T> {
	fn note_activity(activity: &BidActivityOf<T>) {
		let auction_id = activity.auction_id;
		let overflowed = Pending::<T>::mutate(auction_id, |queue| {
			if let Some(existing) = queue.iter_mut().find(|update| update.bid_id == activity.bid_id) {
				*existing = activity.clone();
				false
			} else {
				queue.try_push(activity.clone()).is_err()
			}
		});

		// Queue full: drain it early rather than dropping updates.
		if overflowed {
			Self::do_flush(auction_id, false);
			Pending::<T>::mutate(auction_id, |queue| {
				let _ = queue.try_push(activity.clone());
			});
		}
	}

	fn current_top(auction_id: AuctionId) -> Vec<TopPositionOf<T>> {
		T::Bids::active_bids_ranked(auction_id)
			.into_iter()
			.take(T::TopPositions::get() as usize)
			.enumerate()
			.map(|(index, bid)| TopPosition {
				position: index as u32 + 1,
				who: bid.who,
				bid_id: bid.id,
				amount: bid.amount,
				round_index: bid.round_index,
				created_at: bid.created_at,
			})
			.collect()
	}

	/// A batch matters when the ranking looks different from the last
	/// emission, or some queued amount competes at the top-`K` cutoff.
	fn is_significant(
		previous: &Option<TopSnapshot<BlockNumberFor<T>>>,
		amounts: &[Balance],
		pending: &[BidActivityOf<T>],
	) -> bool {
		let snapshot = match previous {
			None => return true,
			Some(snapshot) => snapshot,
		};
		if snapshot.amounts.len() != amounts.len() {
			return true;
		}
		if snapshot.amounts.iter().zip(amounts.iter()).any(|(a, b)| a != b) {
			return true;
		}
		match (amounts.last(), snapshot.amounts.last()) {
			(Some(current_min), Some(previous_min)) => {
				let cutoff = cmp::min(*current_min, *previous_min);
				pending.iter().any(|update| update.amount >= cutoff)
			}
			// Empty rankings with equal shape carry nothing new.
			_ => false,
		}
	}

	pub fn do_flush(auction_id: AuctionId, force: bool) {
		let pending = Pending::<T>::take(auction_id);
		if pending.is_empty() && !force {
			return;
		}

		let top_positions = Self::current_top(auction_id);
		let amounts: Vec<Balance> = top_positions.iter().map(|position| position.amount).collect();
		let previous = Self::last_top(auction_id);

		if force || Self::is_significant(&previous, &amounts, &pending) {
			LastTop::<T>::insert(
				auction_id,
				TopSnapshot {
					amounts,
					at: frame_system::Pallet::<T>::block_number(),
				},
			);
			Self::deposit_event(Event::BidActivityBatch {
				auction_id,
				updates_count: pending.len() as u32,
				top_positions,
			});
		}
	}
}

impl<T: Config> Happened<BidActivityOf<T>> for Pallet<T> {
	fn happened(activity: &BidActivityOf<T>) {
		Self::note_activity(activity);
	}
}

impl<T: Config> BroadcastFlush for Pallet<T> {
	fn force_flush(auction_id: AuctionId) {
		Self::do_flush(auction_id, true);
	}
}
