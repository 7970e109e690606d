pub mod entities;
pub mod intent;
pub mod payload;
