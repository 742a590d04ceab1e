pub mod skull;
