//! Page objects for the screens the suite drives.

mod login;
mod trade;

pub use login::LoginPage;
pub use trade::TradePage;
