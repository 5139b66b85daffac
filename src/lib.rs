pub mod config;
pub mod context;
pub mod dispatch;
pub mod error;
pub mod events;
pub mod factory;
pub mod geolocation;
pub mod models;
pub mod notification;
pub mod persistence;
pub mod publisher;
pub mod service;

// Re-export commonly used types
pub use config::Config;
pub use context::{AuthenticationContext, AuthenticationContextBuilder, UserInformationCollector};
pub use dispatch::{ensure_processed, LoginListener, LoginQueue, LoginWorker};
pub use error::{AuthLogError, Result};
pub use events::{EventDispatcher, EventObserver, NewDeviceEvent, StoreObserver};
pub use factory::{
    AuthenticationLogFactory, FactoryRegistry, PersistableAuthenticationLogFactory,
    StandardLogFactory,
};
pub use geolocation::{GeoIpResolver, IpApiResolver, LocateValues, LocationResolver};
pub use models::{AuthenticationLog, LoginParameters, UserInformation, UserReference};
pub use notification::{CompositeNotifier, Notifier};
pub use persistence::{AuthLogStore, SqliteAuthLogStore};
pub use publisher::AuthenticationEventPublisher;
pub use service::LoginService;
