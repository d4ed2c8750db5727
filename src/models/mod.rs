pub mod user;
pub mod event;
pub mod ticket_type;
pub mod ticket;
pub mod order;

pub use user::User;
pub use event::Event;
pub use ticket_type::TicketType;
pub use ticket::Ticket;
pub use order::{Order, OrderState};
