pub mod csv;
pub mod notification;
pub mod session;
pub mod text;
