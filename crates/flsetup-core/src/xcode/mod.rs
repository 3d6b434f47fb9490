pub mod pbxproj;

pub use pbxproj::{Pbxproj, PbxprojError};
