pub mod course;
pub mod instructions;
pub mod project;
pub mod template;
