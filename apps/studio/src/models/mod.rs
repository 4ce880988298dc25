pub mod presets;
pub mod resume;

pub use resume::{ModelError, ModuleType, Profile, ResumeData, ResumeSettings};
