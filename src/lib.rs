// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Gym Portal: membership, training plans, and payments for a gym.
//!
//! This crate provides the backend API: member/trainer accounts, trainer
//! assignment, workout and diet plans, calendar events, and coupon-discounted
//! membership payments.

pub mod config;
pub mod db;
pub mod error;
pub mod extract;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod time_utils;

use config::Config;
use db::FirestoreDb;
use services::{PaymentGateway, PhotoStore};

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub db: FirestoreDb,
    pub gateway: PaymentGateway,
    pub photos: PhotoStore,
}

impl AppState {
    /// Build the state from configuration and a database handle.
    pub fn new(config: Config, db: FirestoreDb) -> Self {
        let gateway = PaymentGateway::new(
            config.razorpay_api_url.clone(),
            config.razorpay_key_id.clone(),
            config.razorpay_key_secret.clone(),
        );
        let photos = PhotoStore::new(config.upload_dir.clone());
        Self {
            config,
            db,
            gateway,
            photos,
        }
    }
}
