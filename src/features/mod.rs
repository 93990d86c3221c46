//! Feature engineering: derived columns, bucketing, flags, and encoding.

mod derive;
mod encode;

pub use derive::{
    Generation, MANAGEMENT_LABEL, add_generation, add_role_label, generation_for_age, role_label,
};
pub use encode::{add_contains_flag, one_hot};
