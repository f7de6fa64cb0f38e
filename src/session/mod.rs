pub mod clock;
pub mod input;
pub mod result;
pub mod round;
pub mod tier;
