pub mod cache;
pub mod config;
pub mod exception;
pub mod helper;
pub mod param;
pub mod request;
pub mod response;
pub mod routing;
pub mod server;
pub mod util;
pub mod view;

pub use cache::PatternCache;
pub use config::Config;
pub use exception::Exception;
pub use helper::{body_class, Caption, LinkOptions, ViewContext};
pub use param::{ContentEncoding, Method};
pub use request::Request;
pub use response::Response;
pub use routing::{LinkTarget, Route, RouteTable, UrlFor};
pub use util::HtmlBuilder;
pub use view::{NavItem, Site};
