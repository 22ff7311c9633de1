//! Domain models shared between the server and its clients.

pub mod category;
pub mod merchant;
pub mod notification;
pub mod order;
pub mod product;
pub mod request;
pub mod user;

pub use category::{Category, CategoryCreateDoc, CategoryUpdateDoc};
pub use merchant::{Merchant, MerchantCreateDoc, MerchantUpdateDoc};
pub use notification::{MessageKind, Notification, StoredMessage};
pub use order::{
    ActiveOrder, OrderHistory, OrderLine, OrderState, OrderTicket, ShippingAddress, StateFilter,
    TicketLine,
};
pub use product::{ImageUpdate, Product, ProductCreateDoc, ProductUpdateDoc};
pub use request::{ModerationKind, ModerationRequest, RequestSummary};
pub use user::{Role, UserAccount, UserSummary};
