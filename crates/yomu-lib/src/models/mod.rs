pub mod source;
pub use source::*;

pub mod manga;
pub use manga::*;

pub mod chapter;
pub use chapter::*;

pub mod category;
pub use category::*;

pub mod download;
pub use download::*;

pub mod track;
pub use track::*;

pub mod version;
pub use version::*;
