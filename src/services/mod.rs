// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod credentials;
pub mod gateway;
pub mod uploads;

pub use gateway::{GatewayOrder, PaymentGateway};
pub use uploads::PhotoStore;
