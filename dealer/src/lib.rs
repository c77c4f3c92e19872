mod arbiter;
mod error;
mod game;
mod input;
mod player;
mod recording;
mod shutdown;
mod table;
mod ui;
pub use arbiter::*;
pub use error::*;
pub use game::*;
pub use input::*;
pub use player::*;
pub use recording::*;
pub use shutdown::*;
pub use table::*;
pub use ui::*;
