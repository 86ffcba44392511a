/*
[INPUT]:  None (leaf module)
[OUTPUT]: Normalized top-of-book types handed to consumers
[POS]:    Types layer - shared data model
[UPDATE]: When the normalized update shape changes
*/

pub mod models;

pub use models::*;
