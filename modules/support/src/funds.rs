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

use primitives::{Balance, LedgerEntryId, LedgerReference};
use sp_runtime::{DispatchError, DispatchResult};

/// The balance engine.
///
/// All five operations are atomic and idempotent on
/// `(who, entry type, reference, amount)`: replaying a call whose ledger
/// key already exists is a no-op returning `Ok`. Implementations must keep
/// `free` and `locked` non-negative and reconstructible from the ledger
/// after every call.
pub trait FundsLedger<AccountId> {
	/// Credit `who`'s free balance. The entry gets a synthetic reference,
	/// so every deposit books separately. Returns the ledger entry id.
	fn deposit(who: &AccountId, amount: Balance, note: &[u8]) -> Result<LedgerEntryId, DispatchError>;

	/// Move `amount` from free to locked against `reference`.
	fn lock(who: &AccountId, amount: Balance, reference: LedgerReference, note: &[u8]) -> DispatchResult;

	/// Inverse of `lock`.
	fn unlock(who: &AccountId, amount: Balance, reference: LedgerReference, note: &[u8]) -> DispatchResult;

	/// Settle `amount` out of locked. The funds leave the account.
	fn payout(who: &AccountId, amount: Balance, reference: LedgerReference, note: &[u8]) -> DispatchResult;

	/// Return `amount` from locked to free, resolving `reference`.
	fn refund(who: &AccountId, amount: Balance, reference: LedgerReference, note: &[u8]) -> DispatchResult;

	fn free_balance(who: &AccountId) -> Balance;

	fn locked_balance(who: &AccountId) -> Balance;

	/// Recompute both balances from the ledger and compare with the stored
	/// account. Errors mean the ledger and the account have diverged.
	fn ensure_consistent(who: &AccountId) -> DispatchResult;
}
