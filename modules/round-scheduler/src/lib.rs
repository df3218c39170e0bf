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

//! # Round Scheduler Module
//!
//! ## Overview
//!
//! Drives overdue auction rounds to settlement. Every `ScanInterval`
//! blocks the `on_initialize` hook asks the auction engine for overdue
//! rounds (oldest first, capped per scan) and settles each one; a failed
//! settlement is logged and picked up again by the next scan. Nothing is
//! kept in memory between scans: the due-round index and the `closed`
//! flags live in auction storage, so a restarted node resumes exactly
//! where the state says, and any number of nodes can run the scan
//! concurrently.
//!
//! A validator's offchain worker additionally submits unsigned
//! `close_due_round` transactions for overdue rounds, guarded by a
//! short-TTL offchain storage lock so colocated workers don't pile up.
//! `validate_unsigned` re-checks due-ness, and the auction engine's own
//! `closed` check keeps settlement at-most-once regardless of how many
//! drivers race.

#![cfg_attr(not(feature = "std"), no_std)]
#![allow(clippy::unused_unit)]

use frame_support::pallet_prelude::*;
use frame_system::{
	offchain::{SendTransactionTypes, SubmitTransaction},
	pallet_prelude::*,
};
use orml_utilities::OffchainErr;
use primitives::AuctionId;
use sp_runtime::{
	offchain::{
		storage_lock::{StorageLock, Time},
		Duration,
	},
	traits::Zero,
	transaction_validity::{
		InvalidTransaction, TransactionPriority, TransactionSource, TransactionValidity, ValidTransaction,
	},
};
use sp_std::prelude::*;
use support::RoundLifecycle;

mod mock;
mod tests;
pub mod weights;

pub use module::*;
pub use weights::WeightInfo;

pub const OFFCHAIN_WORKER_LOCK: &[u8] = b"gift-auction/round-scheduler/lock/";
/// TTL of the offchain lock; a crashed holder stalls peers at most this long.
pub const LOCK_DURATION: u64 = 5000;

/// Snapshot of the scheduler's view of the world.
#[derive(Encode, Decode, Eq, PartialEq, Clone, RuntimeDebug, TypeInfo)]
pub struct SchedulerStatus<BlockNumber> {
	pub overdue_rounds: u32,
	pub running_auctions: u32,
	pub next_due_at: Option<BlockNumber>,
}

#[frame_support::pallet]
pub mod module {
	use super::*;

	#[pallet::config]
	pub trait Config: frame_system::Config + SendTransactionTypes<Call<Self>> {
		type RuntimeEvent: From<Event<Self>> + IsType<<Self as frame_system::Config>::RuntimeEvent>;

		/// The auction engine's driver surface.
		type Rounds: RoundLifecycle<BlockNumberFor<Self>>;

		#[pallet::constant]
		/// Blocks between due-round scans.
		type ScanInterval: Get<BlockNumberFor<Self>>;

		#[pallet::constant]
		/// Most rounds settled by one scan; the rest wait for the next.
		type MaxRoundsPerScan: Get<u32>;

		#[pallet::constant]
		/// A configuration for base priority of unsigned transactions.
		type UnsignedPriority: Get<TransactionPriority>;

		/// Weight information for the extrinsics in this module.
		type WeightInfo: WeightInfo;
	}

	#[pallet::event]
	#[pallet::generate_deposit(pub(crate) fn deposit_event)]
	pub enum Event<T: Config> {
		/// A manual trigger settled this many overdue rounds.
		RoundClosingTriggered { settled: u32 },
	}

	#[pallet::pallet]
	pub struct Pallet<T>(_);

	#[pallet::hooks]
	impl<T: Config> Hooks<BlockNumberFor<T>> for Pallet<T> {
		fn on_initialize(now: BlockNumberFor<T>) -> Weight {
			if (now % T::ScanInterval::get()).is_zero() {
				let settled = Self::settle_overdue(now);
				T::WeightInfo::on_initialize_per_round().saturating_mul(settled.max(1) as u64)
			} else {
				T::DbWeight::get().reads(1)
			}
		}

		/// Redundant driver for multi-node deployments: have validators
		/// submit the closes as unsigned transactions too.
		fn offchain_worker(now: BlockNumberFor<T>) {
			if let Err(e) = Self::_offchain_worker(now) {
				log::debug!(
					target: "round-scheduler",
					"offchain worker skipped at {:?}: {:?}",
					now, e,
				);
			}
		}
	}

	#[pallet::call]
	impl<T: Config> Pallet<T> {
		/// Settle every overdue round right now, without waiting for the
		/// scan. Callable by anyone; settling is idempotent.
		#[pallet::call_index(0)]
		#[pallet::weight(T::WeightInfo::trigger_round_closing())]
		pub fn trigger_round_closing(origin: OriginFor<T>) -> DispatchResult {
			let _ = ensure_signed(origin)?;
			let now = frame_system::Pallet::<T>::block_number();
			let settled = Self::settle_overdue(now);
			Self::deposit_event(Event::RoundClosingTriggered { settled });
			Ok(())
		}

		/// Settle one overdue round. Submitted unsigned by the offchain
		/// worker.
		#[pallet::call_index(1)]
		#[pallet::weight(T::WeightInfo::close_due_round())]
		pub fn close_due_round(origin: OriginFor<T>, auction_id: AuctionId) -> DispatchResult {
			ensure_none(origin)?;
			T::Rounds::settle_due_round(auction_id)
		}
	}

	#[pallet::validate_unsigned]
	impl<T: Config> ValidateUnsigned for Pallet<T> {
		type Call = Call<T>;

		fn validate_unsigned(_source: TransactionSource, call: &Self::Call) -> TransactionValidity {
			if let Call::close_due_round { auction_id } = call {
				let now = frame_system::Pallet::<T>::block_number();
				if !T::Rounds::is_round_due(*auction_id, now) {
					return InvalidTransaction::Stale.into();
				}

				ValidTransaction::with_tag_prefix("RoundSchedulerWorker")
					.priority(T::UnsignedPriority::get())
					.and_provides(auction_id)
					.longevity(64_u64)
					.propagate(true)
					.build()
			} else {
				InvalidTransaction::Call.into()
			}
		}
	}
}

impl<T: Config> Pallet<T> {
	/// Settle overdue rounds, oldest deadline first. Settlement failures
	/// stay in the index and are retried by the next scan.
	pub fn settle_overdue(now: BlockNumberFor<T>) -> u32 {
		let mut settled: u32 = 0;
		for (ends_at, auction_id, round_index) in T::Rounds::due_rounds(now, T::MaxRoundsPerScan::get()) {
			match T::Rounds::settle_due_round(auction_id) {
				Ok(()) => {
					settled = settled.saturating_add(1);
					log::debug!(
						target: "round-scheduler",
						"settled round {:?} of auction {:?} (due at {:?})",
						round_index, auction_id, ends_at,
					);
				}
				Err(e) => {
					log::warn!(
						target: "round-scheduler",
						"failed to settle round {:?} of auction {:?}: {:?}",
						round_index, auction_id, e,
					);
				}
			}
		}
		settled
	}

	pub fn scheduler_status() -> SchedulerStatus<BlockNumberFor<T>> {
		let now = frame_system::Pallet::<T>::block_number();
		SchedulerStatus {
			overdue_rounds: T::Rounds::due_rounds(now, u32::MAX).len() as u32,
			running_auctions: T::Rounds::running_auction_count(),
			next_due_at: T::Rounds::next_due_at(),
		}
	}

	fn submit_close_tx(auction_id: AuctionId) {
		let call = Call::<T>::close_due_round { auction_id };
		if SubmitTransaction::<T, Call<T>>::submit_unsigned_transaction(call.into()).is_err() {
			log::info!(
				target: "round-scheduler",
				"failed to submit unsigned close tx for auction {:?}",
				auction_id,
			);
		}
	}

	fn _offchain_worker(now: BlockNumberFor<T>) -> Result<(), OffchainErr> {
		if !sp_io::offchain::is_validator() {
			return Err(OffchainErr::NotValidator);
		}

		let lock_expiration = Duration::from_millis(LOCK_DURATION);
		let mut lock = StorageLock::<'_, Time>::with_deadline(&OFFCHAIN_WORKER_LOCK, lock_expiration);
		let _guard = lock.try_lock().map_err(|_| OffchainErr::OffchainLock)?;

		for (_, auction_id, _) in T::Rounds::due_rounds(now, T::MaxRoundsPerScan::get()) {
			Self::submit_close_tx(auction_id);
		}

		Ok(())
	}
}
