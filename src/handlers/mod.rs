pub mod echo;
pub mod fallback;
pub mod health;
pub mod pages;
