//! WordPress REST content source for the Rivers Marine website
//!
//! Implements [`rivers_marine::ContentSource`] for pages, posts and vessels
//! over the WordPress REST API with Polylang, plus the taxonomy, author and
//! media lookups the site renders alongside them.
//!
//! # Example
//!
//! ```ignore
//! use rivers_marine::{Locale, Resolver, Vessel, build_metadata};
//! use rivers_marine_wp::WordPressClient;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = WordPressClient::from_env()?;
//!
//!     let vessels = client.all::<Vessel>(Locale::En).await?;
//!     let metadata = build_metadata(&vessels);
//!     println!("{} fuel types", metadata.fuel_types.len());
//!
//!     let resolution = Resolver::new(&client)
//!         .resolve_routable::<Vessel>("tugboat-1", Locale::Es)
//!         .await?;
//!     println!("{:?}", resolution.and_then(|r| r.redirect_path));
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod error;
pub mod model;


pub use client::{WordPressClient, WpResource};
pub use error::{WpError, WpResult};
pub use model::{Author, Category, FeaturedMedia, ListingQuery, MediaDetails, Tag};
