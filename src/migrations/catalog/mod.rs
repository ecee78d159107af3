//! Catalog upgrade to schema v2.0.0.
//!
//! Steps run in the order registered here. None of them is transactional:
//! a failure leaves earlier steps applied and later ones pending.

mod m001_sample_individual;
mod m002_file_tags;
mod m003_drop_dataset;
mod m004_admin_user;
mod m005_remove_obsolete_fields;
mod m006_variable_type;

pub use m001_sample_individual::M001SampleIndividual;
pub use m002_file_tags::M002FileTags;
pub use m003_drop_dataset::M003DropDataset;
pub use m004_admin_user::M004AdminUser;
pub use m005_remove_obsolete_fields::M005RemoveObsoleteFields;
pub use m006_variable_type::M006VariableType;

use crate::migrations::traits::Register;

/// Schema version reached once every step has run.
pub const TARGET_VERSION: &str = "2.0.0";

/// Create the catalog v2.0.0 register.
pub fn create_register() -> Register {
    Register::new(TARGET_VERSION)
        .register(M001SampleIndividual)
        .register(M002FileTags)
        .register(M003DropDataset)
        .register(M004AdminUser)
        .register(M005RemoveObsoleteFields)
        .register(M006VariableType)
}
