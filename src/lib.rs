#![doc = "The `taskhub` library crate."]
#![doc = ""]
#![doc = "This crate contains the core business logic, domain models, authorization"]
#![doc = "policy, change notification, routing configuration, and error handling for"]
#![doc = "the TaskHub application. It is used by the main binary (`main.rs`) to"]
#![doc = "construct and run the application."]

pub mod activity;
pub mod auth;
pub mod authz;
pub mod config;
pub mod error;
pub mod models;
pub mod notifier;
pub mod repo;
pub mod routes;
