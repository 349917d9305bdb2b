pub mod inheritance;
pub mod modules;
pub mod references;

pub use inheritance::InheritanceResolver;
pub use modules::ModuleResolver;
pub use references::ReferenceResolver;
