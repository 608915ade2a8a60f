// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! The shipped gate policies.

pub mod fast_requests;
pub mod landmine;
pub mod min_distance;

pub use fast_requests::FastRequestsProtection;
pub use landmine::Landmine;
pub use min_distance::MinimumRequestTimeDistance;
