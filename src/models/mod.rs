pub mod customer;
pub mod event;
pub mod issued_ticket;
pub mod order;
pub mod ticket;

pub use customer::{normalize_cpf, Customer, CustomerDetails};
pub use event::{Event, NewEvent};
pub use issued_ticket::{IssuedTicket, TicketState};
pub use order::{
    CheckoutItem, CheckoutRequest, NewOrder, Order, OrderLineItem, OrderWithItems, PaymentMethod,
    MAX_UNITS_PER_ORDER,
};
pub use ticket::{max_amount, NewTicketType, TicketType};
