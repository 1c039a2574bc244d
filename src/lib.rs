pub mod broker;
pub mod config;
pub mod database;
pub mod display;
pub mod dockapp;
pub mod error;
pub mod font;
pub mod headless;
pub mod icon;
pub mod icon_image;
pub mod interaction;
pub mod owner;
pub mod resolve;
pub mod screen;
pub mod store;
pub mod theme;
pub mod tile;
pub mod util;
pub mod watch;
pub mod yard;

pub use config::Config;
pub use display::DisplayServer;
pub use error::IconError;
pub use icon::{Icon, IconId};
pub use owner::{ManagedWindow, OwnerMessage, OwnerRef};
pub use screen::Screen;
pub use theme::TileKind;
pub use yard::IconYard;
