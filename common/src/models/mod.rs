mod jobs;
pub use jobs::*;

mod generate;
pub use generate::*;

mod pdf;
pub use pdf::*;

mod errors;
pub use errors::*;
