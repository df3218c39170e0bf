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

//! # Funds Module
//!
//! ## Overview
//!
//! The balance engine and its append-only ledger. Every account holds a
//! free and a locked balance; bidding locks funds, winning settles them
//! out of the locked bucket, finalization refunds them. Each movement
//! books exactly one ledger entry, keyed by
//! `(account, entry type, reference, amount)`, and that key makes every
//! operation replay-safe: a second execution of the same logical movement
//! finds the key and leaves all state untouched.
//!
//! Arithmetic is checked, never saturated. A balance that would go
//! negative is a precondition failure (`InsufficientFunds` /
//! `InsufficientLocked`); an overflow can only mean corrupted state and
//! surfaces as `InvariantViolation`, aborting the enclosing transaction.

#![cfg_attr(not(feature = "std"), no_std)]
#![allow(clippy::unused_unit)]

use frame_support::{pallet_prelude::*, traits::BuildGenesisConfig, transactional};
use frame_system::pallet_prelude::*;
use primitives::{Balance, LedgerEntryId, LedgerEntryType, LedgerReference};
use sp_runtime::{
	traits::{One, Zero},
	DispatchError, DispatchResult,
};
use sp_std::prelude::*;
use support::FundsLedger;

mod mock;
pub mod weights;

pub use module::*;
pub use weights::WeightInfo;

/// Free-text annotation kept with a ledger entry. Truncated, never
/// load-bearing.
pub type Note = BoundedVec<u8, ConstU32<64>>;

/// The financial state of one account.
#[derive(Encode, Decode, Eq, PartialEq, Copy, Clone, Default, RuntimeDebug, TypeInfo, MaxEncodedLen)]
pub struct FundAccount {
	/// Spendable balance.
	pub free: Balance,
	/// Balance locked against active bids.
	pub locked: Balance,
}

/// One movement in the append-only ledger.
#[derive(Encode, Decode, Eq, PartialEq, Clone, RuntimeDebug, TypeInfo, MaxEncodedLen)]
pub struct LedgerEntry<AccountId, BlockNumber> {
	pub who: AccountId,
	pub entry_type: LedgerEntryType,
	pub amount: Balance,
	pub reference: LedgerReference,
	pub note: Note,
	pub at: BlockNumber,
}

#[frame_support::pallet]
pub mod module {
	use super::*;

	pub(crate) type LedgerEntryOf<T> =
		LedgerEntry<<T as frame_system::Config>::AccountId, BlockNumberFor<T>>;

	#[pallet::config]
	pub trait Config: frame_system::Config {
		type RuntimeEvent: From<Event<Self>> + IsType<<Self as frame_system::Config>::RuntimeEvent>;

		/// Origin allowed to credit accounts via the `deposit` call.
		type DepositOrigin: EnsureOrigin<Self::RuntimeOrigin>;

		/// Weight information for the extrinsics in this module.
		type WeightInfo: WeightInfo;
	}

	#[pallet::error]
	pub enum Error<T> {
		/// The account has no funds record.
		AccountNotFound,
		/// Amount is zero.
		InvalidAmount,
		/// Free balance is lower than the requested lock.
		InsufficientFunds,
		/// Locked balance is lower than the requested release.
		InsufficientLocked,
		/// The account state and the ledger disagree, or arithmetic
		/// overflowed. Fatal; the enclosing transaction is rolled back.
		InvariantViolation,
	}

	#[pallet::event]
	#[pallet::generate_deposit(pub(crate) fn deposit_event)]
	pub enum Event<T: Config> {
		Deposited {
			who: T::AccountId,
			amount: Balance,
			entry: LedgerEntryId,
		},
		Locked {
			who: T::AccountId,
			amount: Balance,
			reference: LedgerReference,
		},
		Unlocked {
			who: T::AccountId,
			amount: Balance,
			reference: LedgerReference,
		},
		PaidOut {
			who: T::AccountId,
			amount: Balance,
			reference: LedgerReference,
		},
		Refunded {
			who: T::AccountId,
			amount: Balance,
			reference: LedgerReference,
		},
	}

	/// The financial state of all accounts.
	///
	/// Accounts: map AccountId => FundAccount
	#[pallet::storage]
	#[pallet::getter(fn accounts)]
	pub type Accounts<T: Config> = StorageMap<_, Blake2_128Concat, T::AccountId, FundAccount, OptionQuery>;

	/// The append-only ledger. Entries are never updated or removed.
	///
	/// LedgerEntries: map LedgerEntryId => LedgerEntry
	#[pallet::storage]
	#[pallet::getter(fn ledger_entries)]
	pub type LedgerEntries<T: Config> = StorageMap<_, Twox64Concat, LedgerEntryId, LedgerEntryOf<T>, OptionQuery>;

	/// Idempotency index over the ledger. Presence of a key means the
	/// movement already happened and must not be booked again.
	///
	/// LedgerKeys: map (AccountId, LedgerEntryType, LedgerReference, Balance) => LedgerEntryId
	#[pallet::storage]
	#[pallet::getter(fn ledger_keys)]
	pub type LedgerKeys<T: Config> = StorageMap<
		_,
		Blake2_128Concat,
		(T::AccountId, LedgerEntryType, LedgerReference, Balance),
		LedgerEntryId,
		OptionQuery,
	>;

	/// Per-account ledger history index.
	///
	/// UserLedger: double map AccountId, LedgerEntryId => ()
	#[pallet::storage]
	#[pallet::getter(fn user_ledger)]
	pub type UserLedger<T: Config> =
		StorageDoubleMap<_, Blake2_128Concat, T::AccountId, Twox64Concat, LedgerEntryId, (), OptionQuery>;

	/// Next unused ledger entry id.
	#[pallet::storage]
	#[pallet::getter(fn next_ledger_entry_id)]
	pub type NextLedgerEntryId<T: Config> = StorageValue<_, LedgerEntryId, ValueQuery>;

	#[pallet::genesis_config]
	pub struct GenesisConfig<T: Config> {
		pub endowments: Vec<(T::AccountId, Balance)>,
	}

	impl<T: Config> Default for GenesisConfig<T> {
		fn default() -> Self {
			Self {
				endowments: Default::default(),
			}
		}
	}

	#[pallet::genesis_build]
	impl<T: Config> BuildGenesisConfig for GenesisConfig<T> {
		fn build(&self) {
			for (who, amount) in &self.endowments {
				Pallet::<T>::do_deposit(who, *amount, b"genesis endowment")
					.expect("genesis endowment must not fail; qed");
			}
		}
	}

	#[pallet::pallet]
	pub struct Pallet<T>(_);

	#[pallet::hooks]
	impl<T: Config> Hooks<BlockNumberFor<T>> for Pallet<T> {}

	#[pallet::call]
	impl<T: Config> Pallet<T> {
		/// Credit `who`'s free balance. Operator-gated top-up; the common
		/// path for endowments is genesis config.
		#[pallet::call_index(0)]
		#[pallet::weight(T::WeightInfo::deposit())]
		#[transactional]
		pub fn deposit(
			origin: OriginFor<T>,
			who: T::AccountId,
			#[pallet::compact] amount: Balance,
		) -> DispatchResult {
			T::DepositOrigin::ensure_origin(origin)?;
			Self::do_deposit(&who, amount, b"operator deposit")?;
			Ok(())
		}
	}
}

impl<T: Config> Pallet<T> {
	pub fn free_balance(who: &T::AccountId) -> Balance {
		Self::accounts(who).map(|a| a.free).unwrap_or_default()
	}

	pub fn locked_balance(who: &T::AccountId) -> Balance {
		Self::accounts(who).map(|a| a.locked).unwrap_or_default()
	}

	/// Append one entry and index it. The caller has already probed the
	/// idempotency key.
	fn append_entry(
		who: &T::AccountId,
		entry_type: LedgerEntryType,
		amount: Balance,
		reference: LedgerReference,
		note: &[u8],
	) -> LedgerEntryId {
		let id = NextLedgerEntryId::<T>::mutate(|current| {
			let id = *current;
			*current = current.saturating_add(One::one());
			id
		});

		let entry = LedgerEntry {
			who: who.clone(),
			entry_type,
			amount,
			reference,
			note: Note::truncate_from(note.to_vec()),
			at: frame_system::Pallet::<T>::block_number(),
		};
		LedgerEntries::<T>::insert(id, entry);
		LedgerKeys::<T>::insert((who.clone(), entry_type, reference, amount), id);
		UserLedger::<T>::insert(who, id, ());
		id
	}

	fn already_booked(
		who: &T::AccountId,
		entry_type: LedgerEntryType,
		reference: LedgerReference,
		amount: Balance,
	) -> bool {
		LedgerKeys::<T>::contains_key((who.clone(), entry_type, reference, amount))
	}

	#[transactional]
	pub fn do_deposit(who: &T::AccountId, amount: Balance, note: &[u8]) -> Result<LedgerEntryId, DispatchError> {
		ensure!(!amount.is_zero(), Error::<T>::InvalidAmount);

		// The synthetic reference carries the entry's own id, so every
		// deposit books separately even for identical amounts.
		let id = Self::next_ledger_entry_id();
		let reference = LedgerReference::Deposit(id);

		Accounts::<T>::try_mutate(who, |maybe_account| -> DispatchResult {
			let account = maybe_account.get_or_insert(FundAccount::default());
			account.free = account
				.free
				.checked_add(amount)
				.ok_or(Error::<T>::InvariantViolation)?;
			Ok(())
		})?;

		let booked = Self::append_entry(who, LedgerEntryType::Deposit, amount, reference, note);
		debug_assert_eq!(booked, id);

		Self::deposit_event(Event::Deposited {
			who: who.clone(),
			amount,
			entry: id,
		});
		Ok(id)
	}

	#[transactional]
	pub fn do_lock(
		who: &T::AccountId,
		amount: Balance,
		reference: LedgerReference,
		note: &[u8],
	) -> DispatchResult {
		ensure!(!amount.is_zero(), Error::<T>::InvalidAmount);
		if Self::already_booked(who, LedgerEntryType::Lock, reference, amount) {
			return Ok(());
		}

		Accounts::<T>::try_mutate(who, |maybe_account| -> DispatchResult {
			let account = maybe_account.as_mut().ok_or(Error::<T>::AccountNotFound)?;
			account.free = account.free.checked_sub(amount).ok_or(Error::<T>::InsufficientFunds)?;
			account.locked = account
				.locked
				.checked_add(amount)
				.ok_or(Error::<T>::InvariantViolation)?;
			Ok(())
		})?;

		Self::append_entry(who, LedgerEntryType::Lock, amount, reference, note);
		Self::deposit_event(Event::Locked {
			who: who.clone(),
			amount,
			reference,
		});
		Ok(())
	}

	#[transactional]
	pub fn do_unlock(
		who: &T::AccountId,
		amount: Balance,
		reference: LedgerReference,
		note: &[u8],
	) -> DispatchResult {
		ensure!(!amount.is_zero(), Error::<T>::InvalidAmount);
		if Self::already_booked(who, LedgerEntryType::Unlock, reference, amount) {
			return Ok(());
		}

		Accounts::<T>::try_mutate(who, |maybe_account| -> DispatchResult {
			let account = maybe_account.as_mut().ok_or(Error::<T>::AccountNotFound)?;
			account.locked = account
				.locked
				.checked_sub(amount)
				.ok_or(Error::<T>::InsufficientLocked)?;
			account.free = account
				.free
				.checked_add(amount)
				.ok_or(Error::<T>::InvariantViolation)?;
			Ok(())
		})?;

		Self::append_entry(who, LedgerEntryType::Unlock, amount, reference, note);
		Self::deposit_event(Event::Unlocked {
			who: who.clone(),
			amount,
			reference,
		});
		Ok(())
	}

	#[transactional]
	pub fn do_payout(
		who: &T::AccountId,
		amount: Balance,
		reference: LedgerReference,
		note: &[u8],
	) -> DispatchResult {
		ensure!(!amount.is_zero(), Error::<T>::InvalidAmount);
		if Self::already_booked(who, LedgerEntryType::Payout, reference, amount) {
			return Ok(());
		}

		Accounts::<T>::try_mutate(who, |maybe_account| -> DispatchResult {
			let account = maybe_account.as_mut().ok_or(Error::<T>::AccountNotFound)?;
			// Settlement: the funds leave the account entirely.
			account.locked = account
				.locked
				.checked_sub(amount)
				.ok_or(Error::<T>::InsufficientLocked)?;
			Ok(())
		})?;

		Self::append_entry(who, LedgerEntryType::Payout, amount, reference, note);
		Self::deposit_event(Event::PaidOut {
			who: who.clone(),
			amount,
			reference,
		});
		Ok(())
	}

	#[transactional]
	pub fn do_refund(
		who: &T::AccountId,
		amount: Balance,
		reference: LedgerReference,
		note: &[u8],
	) -> DispatchResult {
		ensure!(!amount.is_zero(), Error::<T>::InvalidAmount);
		if Self::already_booked(who, LedgerEntryType::Refund, reference, amount) {
			return Ok(());
		}

		Accounts::<T>::try_mutate(who, |maybe_account| -> DispatchResult {
			let account = maybe_account.as_mut().ok_or(Error::<T>::AccountNotFound)?;
			account.locked = account
				.locked
				.checked_sub(amount)
				.ok_or(Error::<T>::InsufficientLocked)?;
			account.free = account
				.free
				.checked_add(amount)
				.ok_or(Error::<T>::InvariantViolation)?;
			Ok(())
		})?;

		Self::append_entry(who, LedgerEntryType::Refund, amount, reference, note);
		Self::deposit_event(Event::Refunded {
			who: who.clone(),
			amount,
			reference,
		});
		Ok(())
	}

	/// Recompute `who`'s balances from the ledger and compare with the
	/// stored account. Entries are iterated in index order, which is not
	/// booking order, so totals are accumulated per entry type before
	/// combining.
	pub fn do_ensure_consistent(who: &T::AccountId) -> DispatchResult {
		let mut totals: [Balance; 5] = [Zero::zero(); 5];

		for (entry_id, _) in UserLedger::<T>::iter_prefix(who) {
			let entry = LedgerEntries::<T>::get(entry_id).ok_or(Error::<T>::InvariantViolation)?;
			let bucket = match entry.entry_type {
				LedgerEntryType::Deposit => 0,
				LedgerEntryType::Lock => 1,
				LedgerEntryType::Unlock => 2,
				LedgerEntryType::Payout => 3,
				LedgerEntryType::Refund => 4,
			};
			totals[bucket] = totals[bucket]
				.checked_add(entry.amount)
				.ok_or(Error::<T>::InvariantViolation)?;
		}
		let [deposits, locks, unlocks, payouts, refunds] = totals;

		// free = deposits - locks + unlocks + refunds
		let free = deposits
			.checked_add(unlocks)
			.and_then(|v| v.checked_add(refunds))
			.and_then(|v| v.checked_sub(locks))
			.ok_or(Error::<T>::InvariantViolation)?;
		// locked = locks - unlocks - payouts - refunds
		let locked = locks
			.checked_sub(unlocks)
			.and_then(|v| v.checked_sub(payouts))
			.and_then(|v| v.checked_sub(refunds))
			.ok_or(Error::<T>::InvariantViolation)?;

		let account = Self::accounts(who).unwrap_or_default();
		if account.free != free || account.locked != locked {
			log::error!(
				target: "funds",
				"ledger mismatch for account: stored ({:?}, {:?}), recomputed ({:?}, {:?})",
				account.free, account.locked, free, locked,
			);
			return Err(Error::<T>::InvariantViolation.into());
		}
		Ok(())
	}
}

impl<T: Config> FundsLedger<T::AccountId> for Pallet<T> {
	fn deposit(who: &T::AccountId, amount: Balance, note: &[u8]) -> Result<LedgerEntryId, DispatchError> {
		Self::do_deposit(who, amount, note)
	}

	fn lock(who: &T::AccountId, amount: Balance, reference: LedgerReference, note: &[u8]) -> DispatchResult {
		Self::do_lock(who, amount, reference, note)
	}

	fn unlock(who: &T::AccountId, amount: Balance, reference: LedgerReference, note: &[u8]) -> DispatchResult {
		Self::do_unlock(who, amount, reference, note)
	}

	fn payout(who: &T::AccountId, amount: Balance, reference: LedgerReference, note: &[u8]) -> DispatchResult {
		Self::do_payout(who, amount, reference, note)
	}

	fn refund(who: &T::AccountId, amount: Balance, reference: LedgerReference, note: &[u8]) -> DispatchResult {
		Self::do_refund(who, amount, reference, note)
	}

	fn free_balance(who: &T::AccountId) -> Balance {
		Self::free_balance(who)
	}

	fn locked_balance(who: &T::AccountId) -> Balance {
		Self::locked_balance(who)
	}

	fn ensure_consistent(who: &T::AccountId) -> DispatchResult {
		Self::do_ensure_consistent(who)
	}
}
