mod handlers;
mod normalize;
mod routes;
mod tickets;

pub use routes::create_router;
