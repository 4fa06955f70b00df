pub mod ami;
