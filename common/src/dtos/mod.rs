mod errors;
pub use errors::*;

mod root;
pub use root::*;

mod health;
pub use health::*;
