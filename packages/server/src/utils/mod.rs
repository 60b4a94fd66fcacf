pub mod credentials;
pub mod deadline;
pub mod hash;
pub mod jwt;
