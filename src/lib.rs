//! # meal-lens
//!
//! Meal photo nutrition viewer. Send a photo of a meal to an external analysis
//! webhook and get back calories, macronutrients, and an itemized food list.
//!
//! The webhook does all of the recognition. This crate uploads the image,
//! turns whatever JSON comes back into a fixed [`NutritionData`](nutrition::NutritionData)
//! record, and derives the numbers the result views display.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use meal_lens::analysis::{analyze_path, build_analyzer};
//! use meal_lens::config::Config;
//! use meal_lens::report;
//! use std::path::Path;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     // Webhook URL from config.json, overridden by MEAL_LENS_WEBHOOK_URL
//!     let config = Config::load(None)?.with_env_overrides();
//!     let analyzer = build_analyzer(&config)?;
//!
//!     let data = analyze_path(Path::new("lunch.jpg"), &analyzer).await?;
//!     println!("{}: {} kcal", data.meal_name, report::format_number(data.calories));
//!
//!     for share in report::macro_shares(&data) {
//!         println!(
//!             "{:<8} {:>7} {:>4}",
//!             share.kind.label(),
//!             report::format_grams(share.grams),
//!             share.percent_label()
//!         );
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Accepted response shapes
//!
//! ```text
//! <array-of-one | object>
//!   .output?                 // optional wrapper
//!     .food: [ { name, quantity?, calories?, protein?, carbs?, fat? } ]
//!     .total?: { calories?, protein?, carbs?, fat? }
//! ```
//!
//! Missing totals are summed from the items; anything unreadable becomes `0`.
//! See [`nutrition::normalize`].
//!
//! ## Modules
//!
//! - [`analysis`]: upload → normalize flow, image collection, view session state
//! - [`config`]: configuration loading/saving and the webhook URL
//! - [`error`]: transport error taxonomy
//! - [`nutrition`]: nutrition model and response normalization
//! - [`report`]: macro shares, item totals, number formatting
//! - [`transport`]: multipart upload to the webhook

pub mod analysis;
pub mod config;
pub mod error;
pub mod nutrition;
pub mod report;
pub mod transport;
