pub mod orders;
pub mod restaurants;
pub mod users;

pub use orders::OrderService;
pub use restaurants::RestaurantService;
pub use users::UserService;
