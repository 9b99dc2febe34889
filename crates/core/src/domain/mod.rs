pub mod analysis;
pub mod contract;
pub mod discovery;
pub mod notification;
pub mod recent;
pub mod watchlist;
