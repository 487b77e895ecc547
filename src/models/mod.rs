pub mod item;
pub mod location;
pub mod lookup;
pub mod reference;
pub mod user;

pub use item::*;
pub use location::*;
pub use lookup::*;
pub use reference::*;
pub use user::*;
