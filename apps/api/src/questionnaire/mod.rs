// Questionnaire: the fixed question catalog, the user's answer set, and persistence
// of finalized submissions.

pub mod answers;
pub mod questions;
pub mod store;
