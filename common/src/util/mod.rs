pub mod consts;
pub mod mime;
pub mod random;
pub mod state;
pub mod validation;
