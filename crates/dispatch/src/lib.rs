pub mod config;
pub mod remote;
pub mod router;

pub use config::{load_settings, Settings};
pub use remote::{
    ContentHandler, HtmlContentHandler, HttpViewDataSource, RemoteViewLoader, StaticViewDataSource,
    ViewDataSource,
};
pub use router::{
    Dispatcher, DispatcherHandle, ExternalNavigator, MissingExternalNavigator, RouteKind,
};

#[cfg(test)]
mod tests;
