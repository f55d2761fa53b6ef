mod session;

pub use session::CurrentUser;
