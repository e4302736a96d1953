//! Handler modules for larder-api.

pub mod items;
pub mod lists;
pub mod pricing;
pub mod share;
