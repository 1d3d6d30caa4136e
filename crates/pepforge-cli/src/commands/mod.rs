pub mod rescore;
pub mod run;
pub mod score;
pub mod validate;
