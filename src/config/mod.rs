//! Configuration module

mod site;

pub use site::FallbackMode;
pub use site::ListingConfig;
pub use site::PostConfig;
pub use site::PrismicConfig;
pub use site::SiteConfig;
