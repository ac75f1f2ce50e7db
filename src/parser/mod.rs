pub mod html;
pub mod page;
pub mod text;

pub use page::{parse_exercise, ParseMode};
