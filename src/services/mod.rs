// Core ordering flow
pub mod cart;
pub mod orders;
pub mod tables;

// Admin surface
pub mod inventory;
pub mod menu;

// Analytics and reporting
pub mod analytics;
