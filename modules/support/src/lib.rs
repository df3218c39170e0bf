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

//! # Support
//!
//! The narrow interfaces between the gift auction engines. The bid engine
//! and the auction engine must not reference each other directly: the
//! auction engine exposes its read side as [`AuctionResolver`], the bid
//! engine exposes its read/settle side as [`BidRepository`], and the
//! runtime wires both once at composition time.

#![cfg_attr(not(feature = "std"), no_std)]

pub mod auction;
pub mod funds;
pub mod mocks;

pub use auction::*;
pub use funds::*;
