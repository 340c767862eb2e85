pub mod achievement;
pub mod cat;
pub mod user;

pub use achievement::{Achievement, AchievementInput};
pub use cat::{Cat, CatInput, CatPatch, CatRow};
pub use user::User;
