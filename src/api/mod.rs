//! Ageing API Server module
//!
//! HTTP front end for uploading a workbook and downloading the processed one.
//! Run with `ageing-server`.

pub mod handlers;
pub mod server;

pub use server::{build_router, run_api_server};
