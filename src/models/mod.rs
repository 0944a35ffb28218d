// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Data models for the application.

pub mod account;
pub mod coupon;
pub mod event;
pub mod member;
pub mod payment;
pub mod plan;
pub mod trainer;

pub use account::{Account, AccountSummary, Role};
pub use coupon::Coupon;
pub use event::Event;
pub use member::{Member, MemberPatch, MemberProfile, Membership, MembershipStatus};
pub use payment::{Order, OrderStatus, Redemption};
pub use plan::{Plan, PlanDay};
pub use trainer::{Review, Trainer, TrainerPatch, TrainerProfile, TrainerSummary};
